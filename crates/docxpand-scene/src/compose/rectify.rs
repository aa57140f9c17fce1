// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectification of a document region of a scene onto an axis-aligned canvas.

use docxpand_core::Result;
use docxpand_geometry::{Quadrangle, rectifying_homography};
use tracing::{debug, instrument};

use crate::image::Image;
use crate::image::warp::{BorderMode, warp_perspective};

/// Warp the region of `image` bounded by `quad` onto a canvas `target_width`
/// wide, whose height follows the region's estimated aspect ratio.
///
/// Out-of-bounds samples replicate the image edge. The result is a reference
/// patch for colour and illumination statistics.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn rectify_document(
    image: &Image,
    quad: &Quadrangle,
    target_width: u32,
    parallel_epsilon: f64,
) -> Result<Image> {
    let (homography, target_height) = rectifying_homography(
        quad,
        image.width() as f64,
        image.height() as f64,
        target_width,
        parallel_epsilon,
    )?;
    let rectified = warp_perspective(
        image,
        &homography,
        target_width,
        target_height,
        BorderMode::Replicate,
    )?;
    debug!(target_width, target_height, "Document region rectified");
    Ok(rectified)
}

// -- Tests --------------------------------------------------------------------
