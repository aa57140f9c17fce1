// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docxpand.

use thiserror::Error;

/// Top-level error type for all docxpand operations.
#[derive(Debug, Error)]
pub enum DocxpandError {
    // -- Geometry errors --
    /// Collinear corners, singular homography, or a point sent to infinity.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Malformed margins, viewport, kernel size, or buffer shape. Always a
    /// caller bug.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Image errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("face detection failed: {0}")]
    FaceDetection(String),

    #[error("specimen not found: {0}")]
    SpecimenNotFound(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocxpandError {
    /// Shorthand for a `DegenerateGeometry` error.
    pub fn degenerate(detail: impl Into<String>) -> Self {
        Self::DegenerateGeometry(detail.into())
    }

    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidArgument(detail.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocxpandError>;
