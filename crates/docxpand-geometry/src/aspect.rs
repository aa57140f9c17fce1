// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-view aspect-ratio recovery for a rectangle seen under perspective,
// after Zhang & He, "Whiteboard Scanning and Image Enhancement". Equation
// numbers in comments refer to that paper.

use docxpand_core::{DocxpandError, Result};
use nalgebra::Vector3;
use tracing::debug;

use crate::quadrangle::Quadrangle;

/// Default tolerance on the homogeneous component of a vanishing vector.
pub const DEFAULT_PARALLEL_EPSILON: f64 = 0.01;

/// Estimate the width/height ratio of the planar rectangle depicted by `quad`
/// in an image of `image_width` x `image_height` pixels.
///
/// The principal point is assumed at the image centre with square pixels.
/// Three regimes:
///
/// - exact parallelogram: the ratio of the two vanishing vectors' norms;
/// - one pair of sides nearly parallel (homogeneous component below
///   `epsilon`): a side-length estimate, since the focal length cannot be
///   recovered reliably;
/// - general perspective: the focal length is solved first, then the ratio.
///
/// Collinear corners yield [`DocxpandError::DegenerateGeometry`]. The result
/// is not monotonic around `epsilon`.
pub fn guess_aspect_ratio(
    quad: &Quadrangle,
    image_width: f64,
    image_height: f64,
    epsilon: f64,
) -> Result<f64> {
    let half_w = image_width / 2.0;
    let half_h = image_height / 2.0;

    // The paper numbers corners in Z order, so its m3 is our p4 and vice versa.
    let lift = |p: &crate::point::Point| Vector3::new(p.x - half_w, p.y - half_h, 1.0);
    let m1 = lift(&quad.p1);
    let m2 = lift(&quad.p2);
    let m3 = lift(&quad.p4);
    let m4 = lift(&quad.p3);

    // (11) - (12)
    let k2 = m1.cross(&m4).dot(&m3) / m2.cross(&m4).dot(&m3);
    let k3 = m1.cross(&m4).dot(&m2) / m3.cross(&m4).dot(&m2);
    if !k2.is_finite() || !k3.is_finite() {
        return Err(DocxpandError::degenerate(format!(
            "non-finite projective coefficients (k2={k2}, k3={k3})"
        )));
    }

    // (14) - (16)
    let n2 = k2 * m2 - m1;
    let n3 = k3 * m3 - m1;

    let ratio = if n2.z == 0.0 && n3.z == 0.0 {
        debug!("parallelogram, using vanishing vector norms");
        (n2.dot(&n2) / n3.dot(&n3)).sqrt()
    } else if n2.z.abs() < epsilon || n3.z.abs() < epsilon {
        debug!(n2_z = n2.z, n3_z = n3.z, "near-parallel sides, using side lengths");
        near_parallel_ratio(quad, n2.z.abs() < epsilon)
    } else {
        // (21)
        let f_squared =
            ((-1.0 / (n2.z * n3.z)) * (n2.x * n3.x + n2.y * n3.y)).abs();
        // (20)
        let norm2 = n2.x * n2.x + n2.y * n2.y + n2.z * n2.z * f_squared;
        let norm3 = n3.x * n3.x + n3.y * n3.y + n3.z * n3.z * f_squared;
        debug!(f_squared, "general perspective");
        (norm2 / norm3).sqrt()
    };

    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(DocxpandError::degenerate(format!(
            "aspect ratio {ratio} is not a positive finite number"
        )));
    }
    Ok(ratio)
}

/// Side-length estimate used when one pair of sides is nearly parallel.
///
/// The parallel pair is blended towards its shorter side, the other pair is
/// averaged. `horizontal` selects which pair (`p1p2`/`p3p4`) is parallel.
fn near_parallel_ratio(quad: &Quadrangle, horizontal: bool) -> f64 {
    let width_1 = quad.p1.distance(&quad.p2);
    let width_2 = quad.p3.distance(&quad.p4);
    let height_1 = quad.p1.distance(&quad.p4);
    let height_2 = quad.p2.distance(&quad.p3);

    if horizontal {
        let average_h = (height_1 + height_2) / 2.0;
        parallel_sides_length(width_1, width_2) / average_h
    } else {
        let average_w = (width_1 + width_2) / 2.0;
        average_w / parallel_sides_length(height_1, height_2)
    }
}

/// Empirical estimate of the true length shared by two parallel sides, one of
/// which may be clipped: `min + (min / max)^4 * (max - min)`.
fn parallel_sides_length(side_1: f64, side_2: f64) -> f64 {
    let min_s = side_1.min(side_2);
    let max_s = side_1.max(side_2);
    min_s + (min_s / max_s).powi(4) * (max_s - min_s)
}

// -- Tests --------------------------------------------------------------------
