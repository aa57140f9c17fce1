// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel conversions between the tagged colour spaces. Every conversion goes
// through 8-bit sRGB; Lab uses a D65 white point.

use docxpand_core::ColorSpace;
use palette::white_point::D65;
use palette::{FromColor, Lab, Srgb};
use rayon::prelude::*;

/// Convert an interleaved buffer from one colour space to another.
pub fn convert_buffer(data: &[u8], from: ColorSpace, to: ColorSpace) -> Vec<u8> {
    let (cin, cout) = (from.channels(), to.channels());
    let mut out = vec![0u8; data.len() / cin * cout];
    out.par_chunks_exact_mut(cout)
        .zip(data.par_chunks_exact(cin))
        .for_each(|(dst, src)| {
            let (rgb, alpha) = decode_pixel(src, from);
            encode_pixel(rgb, alpha, to, dst);
        });
    out
}

fn decode_pixel(px: &[u8], space: ColorSpace) -> ([u8; 3], u8) {
    match space {
        ColorSpace::Gray => ([px[0]; 3], u8::MAX),
        ColorSpace::Rgb => ([px[0], px[1], px[2]], u8::MAX),
        ColorSpace::Rgba => ([px[0], px[1], px[2]], px[3]),
        ColorSpace::Lab => (lab_to_rgb([px[0], px[1], px[2]]), u8::MAX),
    }
}

fn encode_pixel(rgb: [u8; 3], alpha: u8, space: ColorSpace, dst: &mut [u8]) {
    match space {
        ColorSpace::Gray => dst[0] = luma(rgb),
        ColorSpace::Rgb => dst.copy_from_slice(&rgb),
        ColorSpace::Rgba => {
            dst[..3].copy_from_slice(&rgb);
            dst[3] = alpha;
        }
        ColorSpace::Lab => dst.copy_from_slice(&rgb_to_lab(rgb)),
    }
}

/// ITU-R BT.601 luma.
pub fn luma([r, g, b]: [u8; 3]) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// sRGB to 8-bit Lab: `L * 255 / 100`, `a + 128`, `b + 128`.
pub fn rgb_to_lab([r, g, b]: [u8; 3]) -> [u8; 3] {
    let lab: Lab<D65, f32> = Lab::from_color(Srgb::new(r, g, b).into_format::<f32>());
    [
        to_u8(lab.l * 255.0 / 100.0),
        to_u8(lab.a + 128.0),
        to_u8(lab.b + 128.0),
    ]
}

/// 8-bit Lab back to sRGB, clamping out-of-gamut colours.
pub fn lab_to_rgb([l, a, b]: [u8; 3]) -> [u8; 3] {
    let lab = Lab::<D65, f32>::new(l as f32 * 100.0 / 255.0, a as f32 - 128.0, b as f32 - 128.0);
    let rgb: Srgb<u8> = Srgb::from_color(lab).into_format();
    [rgb.red, rgb.green, rgb.blue]
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

// -- Tests --------------------------------------------------------------------
