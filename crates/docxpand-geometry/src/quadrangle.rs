// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrangles (general quadrilaterals) locating a document in an image.

use docxpand_core::{Margins, Result, Viewport};
use serde::{Deserialize, Serialize};

use crate::aspect::{DEFAULT_PARALLEL_EPSILON, guess_aspect_ratio};
use crate::homography::rectifying_homography;
use crate::point::{Point, Segment};

/// An ordered quadrangle.
///
/// Corners are listed top-left, top-right, bottom-right, bottom-left:
///
/// ```text
/// p1 ------ p2
/// |          |
/// p4 ------ p3
/// ```
///
/// The shape may be convex, concave, or crossed. The corner order is a caller
/// contract; it is not checked, and a wrong order makes aspect-ratio and
/// homography results meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrangle {
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
    pub p4: Point,
}

impl Quadrangle {
    pub const fn new(p1: Point, p2: Point, p3: Point, p4: Point) -> Self {
        Self { p1, p2, p3, p4 }
    }

    /// Build from `[p1, p2, p3, p4]`.
    pub const fn from_points(points: [Point; 4]) -> Self {
        let [p1, p2, p3, p4] = points;
        Self { p1, p2, p3, p4 }
    }

    /// Axis-aligned rectangle `(0, 0)` to `(width, height)`.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        )
    }

    pub const fn points(&self) -> [Point; 4] {
        [self.p1, self.p2, self.p3, self.p4]
    }

    /// Apply `f` to every corner.
    pub fn map(&self, f: impl Fn(&Point) -> Point) -> Self {
        Self::new(f(&self.p1), f(&self.p2), f(&self.p3), f(&self.p4))
    }

    // -- Clipping and scaling -------------------------------------------------

    /// Clamp x into `[0, max_x]` and y into `[0, max_y]`.
    pub fn clip(&self, max_x: f64, max_y: f64) -> Self {
        self.clip_range(0.0, 0.0, max_x, max_y)
    }

    /// Clamp x into `[min_x, max_x]` and y into `[min_y, max_y]`.
    pub fn clip_range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        self.map(|p| Point::new(p.x.max(min_x).min(max_x), p.y.max(min_y).min(max_y)))
    }

    /// Map corners normalised to `[0, 1]` into pixel space, truncating to
    /// integers and clipping to the image.
    pub fn rescale(&self, image_width: f64, image_height: f64) -> Self {
        self.map(|p| Point::new(p.x * image_width, p.y * image_height).trunc())
            .clip(image_width, image_height)
    }

    /// Map pixel corners into `[0, 1]` relative to the image size.
    pub fn normalize(&self, image_width: f64, image_height: f64) -> Self {
        self.map(|p| Point::new(p.x / image_width, p.y / image_height))
    }

    /// Corners rounded to the nearest integer.
    pub fn round(&self) -> Self {
        self.map(Point::round)
    }

    // -- Margins --------------------------------------------------------------

    /// Add margins around the quadrangle, following its perspective.
    ///
    /// The quadrangle is rectified onto a canvas `target_width` wide (height
    /// from the estimated aspect ratio), the canvas rectangle is inflated by
    /// the margins, and the result is projected back into the image, rounded,
    /// and clipped to `viewport`. Fractional margins (strictly between 0 and 1)
    /// are relative to the rectified canvas, not to the quadrangle in the
    /// image.
    pub fn enlarge(
        &self,
        margins: impl Into<Margins>,
        viewport: impl Into<Viewport>,
        target_width: u32,
    ) -> Result<Self> {
        self.enlarge_with_epsilon(margins, viewport, target_width, DEFAULT_PARALLEL_EPSILON)
    }

    /// [`Quadrangle::enlarge`] with an explicit parallelism tolerance for the
    /// aspect-ratio estimate of the rectified canvas.
    pub fn enlarge_with_epsilon(
        &self,
        margins: impl Into<Margins>,
        viewport: impl Into<Viewport>,
        target_width: u32,
        epsilon: f64,
    ) -> Result<Self> {
        let viewport = viewport.into();
        let (homography, target_height) =
            rectifying_homography(self, viewport.max_x, viewport.max_y, target_width, epsilon)?;

        let width = target_width as f64;
        let height = target_height as f64;
        let [left, top, right, bottom] = margins.into().resolve(width, height);

        let inflated = Self::new(
            Point::new(-left, -top),
            Point::new(width + right, -top),
            Point::new(width + right, height + bottom),
            Point::new(-left, height + bottom),
        );
        let projected = homography.project_backward(&inflated)?;
        Ok(projected.round().clip(viewport.max_x, viewport.max_y))
    }

    // -- Sides ----------------------------------------------------------------

    /// The four sides `p1p2`, `p2p3`, `p3p4`, `p4p1`.
    pub fn sides(&self) -> [Segment; 4] {
        [
            Segment::new(self.p1, self.p2),
            Segment::new(self.p2, self.p3),
            Segment::new(self.p3, self.p4),
            Segment::new(self.p4, self.p1),
        ]
    }

    /// The pair of opposite sides with the larger summed length.
    pub fn length_sides(&self) -> (Segment, Segment) {
        self.paired_sides(true)
    }

    /// The pair of opposite sides with the smaller summed length.
    pub fn width_sides(&self) -> (Segment, Segment) {
        self.paired_sides(false)
    }

    /// Mean length of the length sides.
    pub fn estimate_length(&self) -> f64 {
        let (a, b) = self.length_sides();
        (a.length() + b.length()) / 2.0
    }

    /// Mean length of the width sides.
    pub fn estimate_width(&self) -> f64 {
        let (a, b) = self.width_sides();
        (a.length() + b.length()) / 2.0
    }

    fn paired_sides(&self, length: bool) -> (Segment, Segment) {
        let [s0, s1, s2, s3] = self.sides();
        let horizontal_longer = s0.length() + s2.length() > s1.length() + s3.length();
        if horizontal_longer == length {
            (s0, s2)
        } else {
            (s1, s3)
        }
    }

    // -- Aspect ratio ---------------------------------------------------------

    /// True width/height ratio of the rectangle this quadrangle depicts, in an
    /// image of the given size. See [`guess_aspect_ratio`].
    pub fn guess_aspect_ratio(&self, image_width: f64, image_height: f64) -> Result<f64> {
        guess_aspect_ratio(self, image_width, image_height, DEFAULT_PARALLEL_EPSILON)
    }
}

impl From<[Point; 4]> for Quadrangle {
    fn from(points: [Point; 4]) -> Self {
        Self::from_points(points)
    }
}

// -- Tests --------------------------------------------------------------------
