// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Axis-aligned bounding boxes.

use docxpand_core::{Margins, Viewport};
use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::quadrangle::Quadrangle;

/// An axis-aligned box given by its top-left and bottom-right corners.
///
/// A box whose left is not strictly before its right (or top before bottom)
/// is empty; empty boxes are still valid values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl BoundingBox {
    pub const fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn from_ltrb(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(Point::new(left, top), Point::new(right, bottom))
    }

    pub fn left(&self) -> f64 {
        self.top_left.x
    }

    pub fn top(&self) -> f64 {
        self.top_left.y
    }

    pub fn right(&self) -> f64 {
        self.bottom_right.x
    }

    pub fn bottom(&self) -> f64 {
        self.bottom_right.y
    }

    pub fn width(&self) -> f64 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    pub fn is_empty(&self) -> bool {
        self.left() >= self.right() || self.top() >= self.bottom()
    }

    /// Clamp the box into `[0, max_x] x [0, max_y]`.
    pub fn clip(&self, max_x: f64, max_y: f64) -> Self {
        self.clip_range(0.0, 0.0, max_x, max_y)
    }

    /// Clamp the box into `[min_x, max_x] x [min_y, max_y]`. Only the outer
    /// bounds move, so a box lying outside the range becomes empty.
    pub fn clip_range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::from_ltrb(
            self.left().max(min_x),
            self.top().max(min_y),
            self.right().min(max_x),
            self.bottom().min(max_y),
        )
    }

    /// Smallest box containing both boxes, or `None` when that box is empty.
    pub fn union(&self, other: &BoundingBox) -> Option<Self> {
        let merged = Self::from_ltrb(
            self.left().min(other.left()),
            self.top().min(other.top()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        );
        (!merged.is_empty()).then_some(merged)
    }

    /// Grow (or shrink, with negative values) each side, then clip to
    /// `viewport`. Fractional margins are relative to this box's own size.
    pub fn enlarge(&self, margins: impl Into<Margins>, viewport: impl Into<Viewport>) -> Self {
        let viewport = viewport.into();
        let [left, top, right, bottom] = margins.into().resolve(self.width(), self.height());
        Self::from_ltrb(
            self.left() - left,
            self.top() - top,
            self.right() + right,
            self.bottom() + bottom,
        )
        .clip(viewport.max_x, viewport.max_y)
    }

    /// Tightest box around the four corners of `quad`.
    pub fn from_quad(quad: &Quadrangle) -> Self {
        let points = quad.points();
        let xs = points.iter().map(|p| p.x);
        let ys = points.iter().map(|p| p.y);
        Self::from_ltrb(
            xs.clone().fold(f64::INFINITY, f64::min),
            ys.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
            ys.fold(f64::NEG_INFINITY, f64::max),
        )
    }

    /// Corners in clockwise order from the top-left.
    pub fn to_quad(&self) -> Quadrangle {
        Quadrangle::new(
            Point::new(self.left(), self.top()),
            Point::new(self.right(), self.top()),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left(), self.bottom()),
        )
    }
}

impl From<&Quadrangle> for BoundingBox {
    fn from(quad: &Quadrangle) -> Self {
        Self::from_quad(quad)
    }
}

// -- Tests --------------------------------------------------------------------
