// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositor configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::Margins;

/// Tunables of the scene compositing pipeline.
///
/// Every field has a default, so a partial JSON file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Width of the rectified canvas used for statistics and margin sizing.
    pub target_width: u32,
    /// Tolerance on the homogeneous component of the vanishing vectors below
    /// which a pair of sides is treated as parallel.
    pub parallel_epsilon: f64,
    /// Illumination-match parameters.
    pub illumination: IlluminationConfig,
    /// Edge-blend parameters.
    pub edges: EdgeBlurConfig,
    /// Margins added around each detected face, as fractions of the face box.
    pub face_margins: Margins,
    /// JPEG quality (1-100) for composited outputs.
    pub jpeg_quality: u8,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            target_width: 720,
            parallel_epsilon: 0.01,
            illumination: IlluminationConfig::default(),
            edges: EdgeBlurConfig::default(),
            face_margins: Margins::Sides {
                left: 0.2,
                top: 0.5,
                right: 0.2,
                bottom: 0.2,
            },
            jpeg_quality: 95,
        }
    }
}

impl CompositorConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Parameters of the low-frequency illumination transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IlluminationConfig {
    /// Gaussian kernel size (odd), applied in both directions.
    pub kernel_size: u32,
    /// Gaussian standard deviation.
    pub sigma: f64,
    /// Strength of the correction, between 0 and 1.
    pub effect_power: f64,
    /// Lower bound of the scene/specimen lightness ratio.
    pub correction_min: f64,
    /// Upper bound of the scene/specimen lightness ratio.
    pub correction_max: f64,
    /// Upper bound of the ratio inside detected faces.
    pub face_correction_max: f64,
    /// Multiplier applied to `sigma` when smoothing the correction in faces.
    pub face_sigma_factor: f64,
}

impl Default for IlluminationConfig {
    fn default() -> Self {
        Self {
            kernel_size: 127,
            sigma: 30.0,
            effect_power: 0.3,
            correction_min: 0.9,
            correction_max: 3.0,
            face_correction_max: 1.5,
            face_sigma_factor: 4.0,
        }
    }
}

/// Parameters of the border blur applied around the inserted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeBlurConfig {
    /// Gaussian kernel size (odd).
    pub kernel_size: u32,
    /// Gaussian standard deviation; `0` derives it from the kernel size.
    pub sigma: f64,
    /// Outline width as a fraction of the mean top/bottom side length.
    pub width_factor: f64,
    /// Maximum outline width in pixels.
    pub max_width: u32,
}

impl Default for EdgeBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 25,
            sigma: 0.0,
            width_factor: 0.005,
            max_width: 3,
        }
    }
}

// -- Tests --------------------------------------------------------------------
