// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Warping a document into a scene and alpha-compositing it over the
// background.

use docxpand_core::{ColorSpace, EdgeBlurConfig, Result};
use docxpand_geometry::{Homography, Quadrangle};
use rayon::prelude::*;
use tracing::{debug, instrument};

use super::edges::blur_document_edges;
use crate::image::Image;
use crate::image::filter::saturate_u8;
use crate::image::warp::{BorderMode, warp_perspective};

/// Warp `foreground` into the frame of `background` through `homography`
/// and blend: `out = alpha * fg + (1 - alpha) * bg`.
///
/// Alpha comes from the foreground's own alpha channel. Without one, each
/// channel is opaque wherever the warped value is positive. The result is
/// RGB at the background's size.
pub fn alpha_composite(background: &Image, foreground: &Image, homography: &Homography) -> Result<Image> {
    let (w, h) = background.dimensions();
    let warped = warp_perspective(foreground, homography, w, h, BorderMode::Constant(0))?;
    let alpha = warped.alpha();
    let fg = warped.convert(ColorSpace::Rgb);
    let bg = background.convert(ColorSpace::Rgb);

    let mut data = vec![0u8; fg.data().len()];
    data.par_chunks_exact_mut(3)
        .enumerate()
        .for_each(|(i, out)| {
            let f = &fg.data()[i * 3..i * 3 + 3];
            let b = &bg.data()[i * 3..i * 3 + 3];
            for c in 0..3 {
                let a = match &alpha {
                    Some(plane) => plane[i] as f32 / 255.0,
                    None if f[c] > 0 => 1.0,
                    None => 0.0,
                };
                out[c] = saturate_u8(a * f[c] as f32 + (1.0 - a) * b[c] as f32);
            }
        });
    Image::new(w, h, ColorSpace::Rgb, data)
}

/// Insert `foreground` into `background` inside `quad` and blend the border.
///
/// `homography` maps the foreground's own extent onto `quad`.
#[instrument(skip_all, fields(width = background.width(), height = background.height()))]
pub fn insert_image_in_background(
    background: &Image,
    foreground: &Image,
    homography: &Homography,
    quad: &Quadrangle,
    edges: &EdgeBlurConfig,
) -> Result<Image> {
    let composited = alpha_composite(background, foreground, homography)?;
    debug!(has_alpha = foreground.space().has_alpha(), "Foreground composited");
    blur_document_edges(&composited, quad, edges)
}

// -- Tests --------------------------------------------------------------------
