// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Homographies between quadrangle correspondences: exact 4-point estimation,
// rectification without a known target size, and quadrangle projection in
// both directions.

use docxpand_core::{DocxpandError, Result};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use tracing::debug;

use crate::aspect::{DEFAULT_PARALLEL_EPSILON, guess_aspect_ratio};
use crate::point::Point;
use crate::quadrangle::Quadrangle;

/// Default width of the rectified canvas.
pub const DEFAULT_TARGET_WIDTH: u32 = 720;

/// A projective map between two planes, as a 3x3 matrix acting on
/// homogeneous column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self(matrix)
    }

    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// The inverse map. Fails on a singular matrix rather than falling back
    /// to anything.
    pub fn inverse(&self) -> Result<Self> {
        self.0
            .try_inverse()
            .map(Self)
            .ok_or_else(|| DocxpandError::degenerate("homography is singular"))
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Homography) -> Self {
        Self(next.0 * self.0)
    }

    /// Map a single point. Fails when the point is sent to infinity.
    pub fn transform_point(&self, point: &Point) -> Result<Point> {
        let v = self.0 * Vector3::new(point.x, point.y, 1.0);
        if !v.z.is_finite() || v.z.abs() <= f64::EPSILON {
            return Err(DocxpandError::degenerate(format!(
                "point ({}, {}) maps to infinity",
                point.x, point.y
            )));
        }
        let mapped = Point::new(v.x / v.z, v.y / v.z);
        if !mapped.x.is_finite() || !mapped.y.is_finite() {
            return Err(DocxpandError::degenerate("projection is not finite"));
        }
        Ok(mapped)
    }

    /// Map all four corners of `quad` through this homography.
    pub fn project_forward(&self, quad: &Quadrangle) -> Result<Quadrangle> {
        Ok(Quadrangle::new(
            self.transform_point(&quad.p1)?,
            self.transform_point(&quad.p2)?,
            self.transform_point(&quad.p3)?,
            self.transform_point(&quad.p4)?,
        ))
    }

    /// Map all four corners of `quad` through the inverse homography.
    pub fn project_backward(&self, quad: &Quadrangle) -> Result<Quadrangle> {
        self.inverse()?.project_forward(quad)
    }
}

/// Exact homography mapping the corners of `source` onto those of `target`.
///
/// Solves the 8x8 direct linear transform with `h33 = 1`.
pub fn estimate_homography(source: &Quadrangle, target: &Quadrangle) -> Result<Homography> {
    for (name, quad) in [("source", source), ("target", target)] {
        if has_collinear_corners(quad) {
            return Err(DocxpandError::degenerate(format!(
                "{name} quadrangle has three collinear corners"
            )));
        }
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (src, dst)) in source.points().iter().zip(target.points().iter()).enumerate() {
        let row = i * 2;
        a.set_row(
            row,
            &nalgebra::RowSVector::<f64, 8>::from_row_slice(&[
                src.x,
                src.y,
                1.0,
                0.0,
                0.0,
                0.0,
                -src.x * dst.x,
                -src.y * dst.x,
            ]),
        );
        b[row] = dst.x;

        a.set_row(
            row + 1,
            &nalgebra::RowSVector::<f64, 8>::from_row_slice(&[
                0.0,
                0.0,
                0.0,
                src.x,
                src.y,
                1.0,
                -src.x * dst.y,
                -src.y * dst.y,
            ]),
        );
        b[row + 1] = dst.y;
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or_else(|| DocxpandError::degenerate("correspondences do not define a homography"))?;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(DocxpandError::degenerate("homography coefficients are not finite"));
    }

    Ok(Homography(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    )))
}

/// Whether any three of the four corners lie on a line, relative to the
/// quadrangle's own scale.
fn has_collinear_corners(quad: &Quadrangle) -> bool {
    let pts = quad.points();
    let scale = pts
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(1.0_f64, f64::max);
    let tolerance = 1e-12 * scale * scale;

    [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)].iter().any(|&(i, j, k)| {
        let (a, b, c) = (pts[i], pts[j], pts[k]);
        let area = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        !area.is_finite() || area.abs() <= tolerance
    })
}

/// Homography rectifying `quad` onto an axis-aligned canvas `target_width`
/// wide, with the height derived from the estimated aspect ratio.
///
/// Returns the homography and the canvas height.
pub fn estimate_homography_without_target(
    quad: &Quadrangle,
    image_width: f64,
    image_height: f64,
    target_width: u32,
) -> Result<(Homography, u32)> {
    rectifying_homography(
        quad,
        image_width,
        image_height,
        target_width,
        DEFAULT_PARALLEL_EPSILON,
    )
}

/// [`estimate_homography_without_target`] with an explicit parallelism
/// tolerance for the aspect-ratio estimate.
pub fn rectifying_homography(
    quad: &Quadrangle,
    image_width: f64,
    image_height: f64,
    target_width: u32,
    epsilon: f64,
) -> Result<(Homography, u32)> {
    let ratio = guess_aspect_ratio(quad, image_width, image_height, epsilon)?;
    let height = (target_width as f64 / ratio).round();
    if !(1.0..=u32::MAX as f64).contains(&height) {
        return Err(DocxpandError::degenerate(format!(
            "rectified height {height} out of range for ratio {ratio}"
        )));
    }
    let target_height = height as u32;
    debug!(ratio, target_width, target_height, "rectification canvas");

    let target = Quadrangle::from_size(target_width as f64, target_height as f64);
    let homography = estimate_homography(quad, &target)?;
    Ok((homography, target_height))
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(points: [(f64, f64); 4]) -> Quadrangle {
        Quadrangle::from_points(points.map(Point::from))
    }

    fn assert_quad_near(a: &Quadrangle, b: &Quadrangle, tol: f64) {
        for (pa, pb) in a.points().iter().zip(b.points().iter()) {
            assert!(pa.distance(pb) <= tol, "{:?} != {:?}", a, b);
        }
    }

    fn scene_quad() -> Quadrangle {
        quad([(210.0, 150.0), (760.0, 190.0), (730.0, 610.0), (180.0, 560.0)])
    }

    #[test]
    fn estimated_homography_maps_corners_exactly() {
        let source = Quadrangle::from_size(856.0, 540.0);
        let target = scene_quad();
        let h = estimate_homography(&source, &target).unwrap();
        assert_quad_near(&h.project_forward(&source).unwrap(), &target, 1e-8);
    }

    #[test]
    fn projection_round_trips_through_inverse() {
        let h = estimate_homography(&Quadrangle::from_size(400.0, 300.0), &scene_quad()).unwrap();
        for q in [
            scene_quad(),
            Quadrangle::from_size(100.0, 50.0),
            quad([(-20.0, 5.0), (13.5, -7.25), (40.0, 90.0), (3.0, 60.0)]),
        ] {
            let back = h.project_backward(&h.project_forward(&q).unwrap()).unwrap();
            assert_quad_near(&back, &q, 1e-7);
        }
    }

    #[test]
    fn composition_matches_sequential_projection() {
        let a = estimate_homography(&Quadrangle::from_size(10.0, 10.0), &scene_quad()).unwrap();
        let b = estimate_homography(&scene_quad(), &Quadrangle::from_size(720.0, 480.0)).unwrap();
        let q = quad([(1.0, 2.0), (8.0, 1.0), (9.0, 9.0), (2.0, 7.0)]);
        let sequential = b.project_forward(&a.project_forward(&q).unwrap()).unwrap();
        let composed = a.then(&b).project_forward(&q).unwrap();
        assert_quad_near(&composed, &sequential, 1e-7);
    }

    #[test]
    fn singular_homography_cannot_be_inverted() {
        let flat = Homography::from_matrix(Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0));
        assert!(matches!(
            flat.inverse(),
            Err(DocxpandError::DegenerateGeometry(_))
        ));
        assert!(flat.project_backward(&scene_quad()).is_err());
    }

    #[test]
    fn repeated_corners_are_degenerate() {
        let p = (5.0, 5.0);
        let source = quad([p, p, (10.0, 10.0), (0.0, 10.0)]);
        let err = estimate_homography(&source, &Quadrangle::from_size(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, DocxpandError::DegenerateGeometry(_)));
    }

    #[test]
    fn point_on_vanishing_line_maps_to_infinity() {
        // Third row (1, 0, -5): every point with x = 5 is sent to infinity.
        let h = Homography::from_matrix(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -5.0));
        assert!(h.transform_point(&Point::new(5.0, 3.0)).is_err());
        assert!(h.transform_point(&Point::new(6.0, 3.0)).is_ok());
    }

    #[test]
    fn without_target_derives_height_from_aspect_ratio() {
        let q = Quadrangle::from_size(720.0, 960.0);
        let (h, height) = estimate_homography_without_target(&q, 720.0, 960.0, 720).unwrap();
        assert_eq!(height, 960);
        assert_quad_near(&h.project_forward(&q).unwrap(), &q, 1e-8);
    }

    #[test]
    fn without_target_rectifies_onto_canvas() {
        let q = scene_quad();
        let (h, height) = estimate_homography_without_target(&q, 1000.0, 800.0, 500).unwrap();
        let rectified = h.project_forward(&q).unwrap();
        assert_quad_near(&rectified, &Quadrangle::from_size(500.0, height as f64), 1e-7);
    }

    #[test]
    fn without_target_propagates_ratio_failure() {
        let q = quad([(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (300.0, 0.0)]);
        assert!(matches!(
            estimate_homography_without_target(&q, 640.0, 480.0, 720),
            Err(DocxpandError::DegenerateGeometry(_))
        ));
    }
}
