// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Statistical colour transfer in Lab space (Reinhard et al., "Color Transfer
// between Images", 2001).

use docxpand_core::{ColorSpace, Result};
use tracing::{debug, instrument};

use crate::image::Image;

/// Per-channel mean and population standard deviation, each rounded to two
/// decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

impl ChannelStats {
    /// Statistics of the Lab representation of `image`.
    pub fn of_lab(image: &Image) -> Self {
        let lab = image.convert(ColorSpace::Lab);
        let n = lab.pixel_count().max(1) as f64;

        let mut sum = [0f64; 3];
        for px in lab.data().chunks_exact(3) {
            for c in 0..3 {
                sum[c] += px[c] as f64;
            }
        }
        let mean = sum.map(|s| s / n);

        let mut sq = [0f64; 3];
        for px in lab.data().chunks_exact(3) {
            for c in 0..3 {
                let d = px[c] as f64 - mean[c];
                sq[c] += d * d;
            }
        }
        let std = sq.map(|s| (s / n).sqrt());

        Self {
            mean: mean.map(round2),
            std: std.map(round2),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shift and scale the Lab channels of `document` so that, relative to the
/// `specimen` baseline, they follow the statistics of `scene`:
/// `out = (doc - specimen_mean) * (scene_std / specimen_std) + scene_mean`.
///
/// Values are rounded and clamped to 8 bits. A channel with zero specimen
/// deviation is only shifted. Alpha passes through untouched; the result is
/// RGB, or RGBA when `document` has alpha.
#[instrument(skip_all, fields(width = document.width(), height = document.height()))]
pub fn color_transfer_reinhard(scene: &Image, specimen: &Image, document: &Image) -> Result<Image> {
    let alpha = document.alpha();
    let target = ChannelStats::of_lab(scene);
    let baseline = ChannelStats::of_lab(specimen);
    debug!(?target, ?baseline, "Lab statistics");

    let scale: [f64; 3] = std::array::from_fn(|c| {
        if baseline.std[c] == 0.0 {
            1.0
        } else {
            target.std[c] / baseline.std[c]
        }
    });

    let lab = document.convert(ColorSpace::Lab);
    let shifted: Vec<u8> = lab
        .data()
        .chunks_exact(3)
        .flat_map(|px| {
            std::array::from_fn::<u8, 3, _>(|c| {
                let v = (px[c] as f64 - baseline.mean[c]) * scale[c] + target.mean[c];
                v.round().clamp(0.0, 255.0) as u8
            })
        })
        .collect();

    let recolored = Image::new(lab.width(), lab.height(), ColorSpace::Lab, shifted)?
        .convert(ColorSpace::Rgb);
    match alpha {
        Some(alpha) => recolored.with_alpha(&alpha),
        None => Ok(recolored),
    }
}

// -- Tests --------------------------------------------------------------------
