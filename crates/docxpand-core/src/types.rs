// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types shared by the geometry and compositing crates.

use serde::{Deserialize, Serialize};

use crate::error::{DocxpandError, Result};

/// Colour space tag carried alongside every image buffer.
///
/// The tag fixes both the channel count and the meaning of each channel, so
/// conversions never have to guess from the buffer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    /// Single luminance channel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// CIE L*a*b* in 8-bit encoding: `L * 255 / 100`, `a + 128`, `b + 128`.
    Lab,
}

impl ColorSpace {
    /// Number of interleaved channels per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Lab => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the last channel is an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Whether the space carries chroma information.
    pub fn has_color(&self) -> bool {
        !matches!(self, Self::Gray)
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gray => "GRAY",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Lab => "LAB",
        };
        f.write_str(name)
    }
}

/// Margins added around a shape when enlarging it.
///
/// A value strictly between 0 and 1 is a fraction of the matching reference
/// dimension (width for left/right, height for top/bottom). Any other value is
/// an absolute pixel count; negative values shrink the shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Margins {
    /// Same margin on all four sides.
    Uniform(f64),
    /// Per-side margins.
    Sides {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
}

impl Margins {
    /// Build margins from a slice of either one or four values
    /// (`left, top, right, bottom`).
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [all] => Ok(Self::Uniform(all)),
            [left, top, right, bottom] => Ok(Self::Sides {
                left,
                top,
                right,
                bottom,
            }),
            _ => Err(DocxpandError::invalid(format!(
                "margins must hold 1 or 4 values, got {}",
                values.len()
            ))),
        }
    }

    /// Raw `(left, top, right, bottom)` values, before fraction resolution.
    pub fn sides(&self) -> [f64; 4] {
        match *self {
            Self::Uniform(all) => [all; 4],
            Self::Sides {
                left,
                top,
                right,
                bottom,
            } => [left, top, right, bottom],
        }
    }

    /// Resolve fractional margins against a reference frame and return
    /// absolute `(left, top, right, bottom)` pixel margins.
    pub fn resolve(&self, reference_width: f64, reference_height: f64) -> [f64; 4] {
        let [left, top, right, bottom] = self.sides();
        [
            resolve_one(left, reference_width),
            resolve_one(top, reference_height),
            resolve_one(right, reference_width),
            resolve_one(bottom, reference_height),
        ]
    }
}

impl From<f64> for Margins {
    fn from(value: f64) -> Self {
        Self::Uniform(value)
    }
}

impl From<(f64, f64, f64, f64)> for Margins {
    fn from((left, top, right, bottom): (f64, f64, f64, f64)) -> Self {
        Self::Sides {
            left,
            top,
            right,
            bottom,
        }
    }
}

fn resolve_one(margin: f64, reference: f64) -> f64 {
    if margin > 0.0 && margin < 1.0 {
        margin * reference
    } else {
        margin
    }
}

/// Upper clipping bounds `(max_x, max_y)` for a shape, usually the image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub max_x: f64,
    pub max_y: f64,
}

impl Viewport {
    pub fn new(max_x: f64, max_y: f64) -> Self {
        Self { max_x, max_y }
    }

    /// Build a viewport from exactly two values.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [max_x, max_y] => Ok(Self { max_x, max_y }),
            _ => Err(DocxpandError::invalid(format!(
                "viewport must hold exactly 2 values, got {}",
                values.len()
            ))),
        }
    }
}

impl From<(u32, u32)> for Viewport {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

impl From<(f64, f64)> for Viewport {
    fn from((max_x, max_y): (f64, f64)) -> Self {
        Self::new(max_x, max_y)
    }
}

// -- Tests --------------------------------------------------------------------
