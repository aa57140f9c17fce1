// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Separable Gaussian blur with an explicit kernel size and mirrored borders.
// imageproc's gaussian_blur_f32 sizes its own kernel and has no reflect-101
// border, so the kernel is built here.

use docxpand_core::{DocxpandError, Result};
use rayon::prelude::*;

use super::Image;

/// Normalised 1-D Gaussian kernel of odd length `size`.
///
/// A non-positive `sigma` is derived from the size as
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32, sigma: f64) -> Result<Vec<f64>> {
    if size == 0 || size % 2 == 0 {
        return Err(DocxpandError::invalid(format!(
            "Gaussian kernel size must be odd and positive, got {size}"
        )));
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let centre = (size as f64 - 1.0) / 2.0;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - centre;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Mirror an out-of-range index back into `[0, len)` without repeating the
/// edge sample (`dcb|abcd|cba`).
fn reflect_101(index: i64, len: usize) -> usize {
    let n = len as i64;
    if n <= 1 {
        return 0;
    }
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Blur an interleaved floating-point buffer of `channels` channels.
pub fn blur_interleaved(
    data: &[f32],
    width: u32,
    height: u32,
    channels: usize,
    size: u32,
    sigma: f64,
) -> Result<Vec<f32>> {
    let (w, h) = (width as usize, height as usize);
    if data.len() != w * h * channels {
        return Err(DocxpandError::invalid(format!(
            "buffer of {} values is not {width}x{height}x{channels}",
            data.len()
        )));
    }
    let kernel = gaussian_kernel(size, sigma)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let radius = (kernel.len() / 2) as i64;
    let row_len = w * channels;

    // Horizontal pass.
    let mut horizontal = vec![0f32; data.len()];
    horizontal
        .par_chunks_mut(row_len)
        .zip(data.par_chunks(row_len))
        .for_each(|(dst, src)| {
            for x in 0..w {
                for c in 0..channels {
                    let mut acc = 0f64;
                    for (k, weight) in kernel.iter().enumerate() {
                        let sx = reflect_101(x as i64 + k as i64 - radius, w);
                        acc += weight * src[sx * channels + c] as f64;
                    }
                    dst[x * channels + c] = acc as f32;
                }
            }
        });

    // Vertical pass.
    let mut out = vec![0f32; data.len()];
    out.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, dst)| {
            for (i, value) in dst.iter_mut().enumerate() {
                let mut acc = 0f64;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as i64 + k as i64 - radius, h);
                    acc += weight * horizontal[sy * row_len + i] as f64;
                }
                *value = acc as f32;
            }
        });
    Ok(out)
}

/// Blur a single floating-point plane.
pub fn blur_plane(plane: &[f32], width: u32, height: u32, size: u32, sigma: f64) -> Result<Vec<f32>> {
    blur_interleaved(plane, width, height, 1, size, sigma)
}

/// Blur an 8-bit plane, rounding back to 8 bits.
pub fn blur_plane_u8(plane: &[u8], width: u32, height: u32, size: u32, sigma: f64) -> Result<Vec<u8>> {
    let floats: Vec<f32> = plane.iter().map(|&v| v as f32).collect();
    Ok(blur_plane(&floats, width, height, size, sigma)?
        .into_iter()
        .map(saturate_u8)
        .collect())
}

/// Blur every channel of `image` (alpha included) with a `size` x `size`
/// kernel.
pub fn gaussian_blur(image: &Image, size: u32, sigma: f64) -> Result<Image> {
    let floats: Vec<f32> = image.data().iter().map(|&v| v as f32).collect();
    let blurred = blur_interleaved(&floats, image.width(), image.height(), image.channels(), size, sigma)?;
    Image::new(
        image.width(),
        image.height(),
        image.space(),
        blurred.into_iter().map(saturate_u8).collect(),
    )
}

pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

// -- Tests --------------------------------------------------------------------
