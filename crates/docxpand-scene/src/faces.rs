// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Face-detector abstraction used to protect photos during relighting.

use docxpand_core::{Margins, Result};
use docxpand_geometry::BoundingBox;
use tracing::{debug, warn};

use crate::image::Image;

/// Locates faces in a document image.
///
/// Implementations wrap whatever detector is available on the host. Errors
/// are never fatal to a composite: callers treat them as "no faces".
pub trait FaceDetector {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Raw face boxes in pixel coordinates of `image`.
    fn detect(&self, image: &Image) -> Result<Vec<BoundingBox>>;
}

/// Detector for hosts without one. Always reports no faces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn name(&self) -> &str {
        "none"
    }

    fn detect(&self, _image: &Image) -> Result<Vec<BoundingBox>> {
        Ok(Vec::new())
    }
}

/// Run `detector` on `image` and grow each face by `margins` (fractions of
/// the face box), clipped to the image. Detector failures are logged and
/// yield no faces.
pub fn face_regions(detector: &dyn FaceDetector, image: &Image, margins: Margins) -> Vec<BoundingBox> {
    let raw = match detector.detect(image) {
        Ok(faces) => faces,
        Err(err) => {
            warn!(detector = detector.name(), %err, "Face detection failed, continuing without faces");
            return Vec::new();
        }
    };
    let viewport = image.dimensions();
    let regions: Vec<BoundingBox> = raw
        .iter()
        .map(|face| face.enlarge(margins, viewport))
        .filter(|face| !face.is_empty())
        .collect();
    debug!(detector = detector.name(), detected = raw.len(), kept = regions.len(), "Face regions");
    regions
}

// -- Tests --------------------------------------------------------------------
