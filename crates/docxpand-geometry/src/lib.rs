// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docxpand-geometry: planar geometry for locating documents in photographs.
//
// Provides immutable value types (points, segments, quadrangles, bounding
// boxes), single-view aspect-ratio recovery for a rectangle seen under
// perspective, and 4-point homographies between document and scene frames.

pub mod aspect;
pub mod bbox;
pub mod homography;
pub mod point;
pub mod quadrangle;

pub use aspect::{DEFAULT_PARALLEL_EPSILON, guess_aspect_ratio};
pub use bbox::BoundingBox;
pub use homography::{
    DEFAULT_TARGET_WIDTH, Homography, estimate_homography, estimate_homography_without_target,
    rectifying_homography,
};
pub use point::{Point, Segment};
pub use quadrangle::Quadrangle;
