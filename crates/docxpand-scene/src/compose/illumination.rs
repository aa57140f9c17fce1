// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Low-frequency illumination transfer from a scene patch onto a document.

use docxpand_core::{ColorSpace, IlluminationConfig, Result};
use docxpand_geometry::BoundingBox;
use tracing::{debug, instrument};

use crate::image::filter::{blur_plane, blur_plane_u8};
use crate::image::{Image, resize_plane};

/// Relight `document` with the illumination field of `scene` relative to
/// `specimen`.
///
/// Both lightness channels are resized to the document, blurred, and divided
/// pointwise. The ratio is clipped to `[correction_min, correction_max]` and
/// shifted by -1. Inside each of `faces` the correction is blurred again
/// with `face_sigma_factor * sigma` and capped at `face_correction_max - 1`.
/// The document lightness then becomes
/// `clip(L + correction * effect_power * 255, 0, 255)`.
///
/// Alpha passes through untouched; the result is RGB, or RGBA when
/// `document` has alpha.
#[instrument(skip_all, fields(width = document.width(), height = document.height(), faces = faces.len()))]
pub fn illumination_transfer(
    scene: &Image,
    specimen: &Image,
    document: &Image,
    faces: &[BoundingBox],
    config: &IlluminationConfig,
) -> Result<Image> {
    let alpha = document.alpha();
    let (w, h) = document.dimensions();

    let scene_light = lightness_field(scene, w, h, config)?;
    let specimen_light = lightness_field(specimen, w, h, config)?;

    let mut correction: Vec<f32> = scene_light
        .iter()
        .zip(&specimen_light)
        .map(|(&s, &sp)| {
            let ratio = s as f64 / sp as f64;
            let ratio = if ratio.is_nan() { 1.0 } else { ratio };
            (ratio.clamp(config.correction_min, config.correction_max) - 1.0) as f32
        })
        .collect();

    for face in faces {
        soften_face(&mut correction, w, h, face, config)?;
    }

    let mut lab = document.convert(ColorSpace::Lab);
    let relit: Vec<u8> = lab
        .plane(0)?
        .iter()
        .zip(&correction)
        .map(|(&l, &corr)| {
            (l as f64 + corr as f64 * config.effect_power * 255.0).clamp(0.0, 255.0) as u8
        })
        .collect();
    lab.set_plane(0, &relit)?;

    let mean_correction = correction.iter().map(|&c| c as f64).sum::<f64>() / correction.len().max(1) as f64;
    debug!(mean_correction, "Illumination correction applied");

    let rgb = lab.convert(ColorSpace::Rgb);
    match alpha {
        Some(alpha) => rgb.with_alpha(&alpha),
        None => Ok(rgb),
    }
}

/// Lightness of `image` resized to `width` x `height` and blurred.
fn lightness_field(image: &Image, width: u32, height: u32, config: &IlluminationConfig) -> Result<Vec<u8>> {
    let lightness = image.convert(ColorSpace::Lab).plane(0)?;
    let resized = resize_plane(&lightness, image.width(), image.height(), width, height)?;
    blur_plane_u8(&resized, width, height, config.kernel_size, config.sigma)
}

/// Replace the correction inside `face` by a more heavily blurred and
/// tighter-capped version of itself.
fn soften_face(
    correction: &mut [f32],
    width: u32,
    height: u32,
    face: &BoundingBox,
    config: &IlluminationConfig,
) -> Result<()> {
    let left = face.left().max(0.0) as usize;
    let top = face.top().max(0.0) as usize;
    let right = (face.right().max(0.0) as usize).min(width as usize);
    let bottom = (face.bottom().max(0.0) as usize).min(height as usize);
    if left >= right || top >= bottom {
        return Ok(());
    }
    let (pw, ph) = (right - left, bottom - top);

    let mut patch = Vec::with_capacity(pw * ph);
    for y in top..bottom {
        let row = y * width as usize;
        patch.extend_from_slice(&correction[row + left..row + right]);
    }
    let blurred = blur_plane(
        &patch,
        pw as u32,
        ph as u32,
        config.kernel_size,
        config.sigma * config.face_sigma_factor,
    )?;

    let low = (config.correction_min - 1.0) as f32;
    let high = (config.face_correction_max - 1.0) as f32;
    for (py, y) in (top..bottom).enumerate() {
        let row = y * width as usize;
        for (px, value) in correction[row + left..row + right].iter_mut().enumerate() {
            *value = blurred[py * pw + px].clamp(low, high);
        }
    }
    debug!(left, top, right, bottom, "Correction softened in face region");
    Ok(())
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn small_kernel() -> IlluminationConfig {
        IlluminationConfig {
            kernel_size: 5,
            sigma: 2.0,
            ..IlluminationConfig::default()
        }
    }

    fn gray(value: u8, w: u32, h: u32) -> Image {
        Image::from_pixel(w, h, ColorSpace::Rgb, &[value; 3]).unwrap()
    }

    fn lightness(img: &Image) -> Vec<u8> {
        img.convert(ColorSpace::Lab).plane(0).unwrap()
    }

    /// What a zero correction yields: the document through Lab and back.
    fn lab_round_trip(doc: &Image) -> Image {
        let rgb = doc.convert(ColorSpace::Lab).convert(ColorSpace::Rgb);
        match doc.alpha() {
            Some(alpha) => rgb.with_alpha(&alpha).unwrap(),
            None => rgb,
        }
    }

    #[test]
    fn equal_scene_and_specimen_leave_lightness_alone() {
        let doc = Image::from_fn(16, 12, ColorSpace::Rgba, |x, y| {
            vec![(x * 15) as u8, (y * 20) as u8, 90, 200]
        })
        .unwrap();
        let out = illumination_transfer(&gray(120, 8, 8), &gray(120, 30, 30), &doc, &[], &small_kernel())
            .unwrap();
        assert_eq!(out, lab_round_trip(&doc));
    }

    #[test]
    fn brighter_scene_brightens_the_document() {
        let doc = gray(100, 10, 10);
        let out = illumination_transfer(&gray(200, 10, 10), &gray(100, 10, 10), &doc, &[], &small_kernel())
            .unwrap();
        let before = lightness(&doc)[0];
        assert!(lightness(&out).iter().all(|&l| l > before));
    }

    #[test]
    fn darker_scene_is_limited_by_correction_floor() {
        // The ratio clips at 0.9, so lightness drops by at most
        // 0.1 * 0.3 * 255 = 7.65 levels.
        let doc = gray(150, 10, 10);
        let out = illumination_transfer(&gray(10, 10, 10), &gray(250, 10, 10), &doc, &[], &small_kernel())
            .unwrap();
        let before = lightness(&doc)[0] as i32;
        let after = lightness(&out)[0] as i32;
        assert!(before - after <= 10, "before {before}, after {after}");
        assert!(after < before);
    }

    #[test]
    fn black_specimen_and_scene_do_not_produce_nan() {
        let doc = gray(80, 6, 6);
        let out = illumination_transfer(&gray(0, 6, 6), &gray(0, 6, 6), &doc, &[], &small_kernel()).unwrap();
        assert_eq!(out, lab_round_trip(&doc));
    }

    #[test]
    fn faces_cap_the_correction() {
        let config = small_kernel();
        let (w, h) = (20u32, 20u32);
        let mut correction = vec![2.0f32; (w * h) as usize];
        let face = BoundingBox::from_ltrb(5.0, 5.0, 15.0, 15.0);
        soften_face(&mut correction, w, h, &face, &config).unwrap();

        let cap = (config.face_correction_max - 1.0) as f32;
        assert_eq!(correction[10 * 20 + 10], cap);
        assert_eq!(correction[0], 2.0);
        assert_eq!(correction[5 * 20 + 4], 2.0);
        assert_eq!(correction[5 * 20 + 5], cap);
    }

    #[test]
    fn faces_outside_the_document_are_ignored() {
        let config = small_kernel();
        let mut correction = vec![0.5f32; 16];
        soften_face(&mut correction, 4, 4, &BoundingBox::from_ltrb(10.0, 10.0, 20.0, 20.0), &config).unwrap();
        assert!(correction.iter().all(|&c| c == 0.5));
    }
}
