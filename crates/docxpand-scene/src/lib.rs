// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docxpand-scene: compositing rendered identity documents into photographs.
//
// Provides a colour-space-tagged image buffer (codecs, Lab conversion,
// Gaussian filtering, perspective warping), the scene compositing pipeline
// (rectification, colour and illumination matching, warp-insert, edge
// blending), a face-detector seam, a specimen cache, and helpers that move
// annotations into the composited frame.

pub mod annotation;
pub mod compose;
pub mod faces;
pub mod image;
pub mod specimen;

// Re-export the primary entry points so callers can use `docxpand_scene::SceneCompositor` etc.
pub use annotation::transfer_field_positions;
pub use compose::{Composite, SceneCompositor};
pub use faces::{FaceDetector, NoFaceDetector, face_regions};
pub use crate::image::Image;
pub use crate::image::warp::BorderMode;
pub use specimen::SpecimenCache;
