// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective warping by inverse mapping with bilinear interpolation.
// imageproc's warp_into only fills with a constant, and replicate borders are
// needed for rectification.

use docxpand_core::Result;
use docxpand_geometry::Homography;
use nalgebra::Vector3;
use rayon::prelude::*;
use tracing::debug;

use super::Image;
use super::filter::saturate_u8;

/// How samples falling outside the source image are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// Repeat the nearest edge pixel.
    Replicate,
    /// Use a constant value on every channel.
    Constant(u8),
}

/// Warp `image` through `homography` into a `width` x `height` canvas.
///
/// Each destination pixel is mapped back through the inverse homography and
/// sampled bilinearly. The output keeps the source colour space.
pub fn warp_perspective(
    image: &Image,
    homography: &Homography,
    width: u32,
    height: u32,
    border: BorderMode,
) -> Result<Image> {
    let inverse = *homography.inverse()?.matrix();
    let channels = image.channels();
    let row_len = width as usize * channels;
    let mut data = vec![0u8; row_len * height as usize];

    if row_len > 0 && image.width() > 0 && image.height() > 0 {
        data.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..width as usize {
                    let src = inverse * Vector3::new(x as f64, y as f64, 1.0);
                    let dst = &mut row[x * channels..(x + 1) * channels];
                    if src.z.abs() > f64::EPSILON {
                        sample_bilinear(image, src.x / src.z, src.y / src.z, border, dst);
                    } else {
                        match border {
                            BorderMode::Replicate => dst.copy_from_slice(image.pixel(0, 0)),
                            BorderMode::Constant(value) => dst.fill(value),
                        }
                    }
                }
            });
    }
    debug!(width, height, ?border, "Perspective warp applied");
    Image::new(width, height, image.space(), data)
}

/// Bilinear sample at `(x, y)` written into `out`.
fn sample_bilinear(image: &Image, x: f64, y: f64, border: BorderMode, out: &mut [u8]) {
    if !x.is_finite() || !y.is_finite() {
        match border {
            BorderMode::Replicate => out.copy_from_slice(image.pixel(0, 0)),
            BorderMode::Constant(value) => out.fill(value),
        }
        return;
    }
    // Far-away samples resolve to the same taps as those just past the edge.
    let x = x.clamp(-2.0, image.width() as f64 + 1.0);
    let y = y.clamp(-2.0, image.height() as f64 + 1.0);
    let x0 = x.floor();
    let y0 = y.floor();
    let dx = x - x0;
    let dy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (x0, y0, (1.0 - dx) * (1.0 - dy)),
        (x0 + 1, y0, dx * (1.0 - dy)),
        (x0, y0 + 1, (1.0 - dx) * dy),
        (x0 + 1, y0 + 1, dx * dy),
    ];
    for (c, value) in out.iter_mut().enumerate() {
        let mut acc = 0f64;
        for &(tx, ty, weight) in &taps {
            if weight == 0.0 {
                continue;
            }
            acc += weight * fetch(image, tx, ty, c, border) as f64;
        }
        *value = saturate_u8(acc as f32);
    }
}

fn fetch(image: &Image, x: i64, y: i64, channel: usize, border: BorderMode) -> u8 {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let inside = (0..w).contains(&x) && (0..h).contains(&y);
    match border {
        _ if inside => image.pixel(x as u32, y as u32)[channel],
        BorderMode::Constant(value) => value,
        BorderMode::Replicate => {
            let cx = x.clamp(0, w - 1) as u32;
            let cy = y.clamp(0, h - 1) as u32;
            image.pixel(cx, cy)[channel]
        }
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use docxpand_core::ColorSpace;
    use docxpand_geometry::{Point, Quadrangle, estimate_homography};
    use nalgebra::Matrix3;

    use super::*;

    fn checker() -> Image {
        Image::from_fn(8, 6, ColorSpace::Rgb, |x, y| {
            vec![(x * 30 + 1) as u8, (y * 40 + 1) as u8, ((x + y) % 2 * 200 + 10) as u8]
        })
        .unwrap()
    }

    #[test]
    fn identity_warp_reproduces_the_source() {
        let img = checker();
        for border in [BorderMode::Replicate, BorderMode::Constant(0)] {
            let out = warp_perspective(&img, &Homography::identity(), 8, 6, border).unwrap();
            assert_eq!(out, img);
        }
    }

    #[test]
    fn translation_fills_uncovered_area_by_border_mode() {
        let img = checker();
        let shift = Homography::from_matrix(Matrix3::new(1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0));

        let constant = warp_perspective(&img, &shift, 8, 6, BorderMode::Constant(0)).unwrap();
        assert_eq!(constant.pixel(0, 3), &[0, 0, 0]);
        assert_eq!(constant.pixel(2, 3), img.pixel(0, 3));

        let replicate = warp_perspective(&img, &shift, 8, 6, BorderMode::Replicate).unwrap();
        assert_eq!(replicate.pixel(0, 3), img.pixel(0, 3));
        assert_eq!(replicate.pixel(1, 3), img.pixel(0, 3));
    }

    #[test]
    fn half_pixel_shift_interpolates() {
        let img = Image::new(2, 1, ColorSpace::Gray, vec![0, 100]).unwrap();
        let shift = Homography::from_matrix(Matrix3::new(1.0, 0.0, -0.5, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0));
        let out = warp_perspective(&img, &shift, 1, 1, BorderMode::Replicate).unwrap();
        assert_eq!(out.data(), &[50]);
    }

    #[test]
    fn downscaling_homography_sets_output_size() {
        let img = Image::from_pixel(40, 30, ColorSpace::Rgba, &[5, 6, 7, 255]).unwrap();
        let h = estimate_homography(
            &Quadrangle::from_size(40.0, 30.0),
            &Quadrangle::new(
                Point::new(2.0, 1.0),
                Point::new(18.0, 3.0),
                Point::new(17.0, 14.0),
                Point::new(1.0, 12.0),
            ),
        )
        .unwrap();
        let out = warp_perspective(&img, &h, 20, 15, BorderMode::Constant(0)).unwrap();
        assert_eq!(out.dimensions(), (20, 15));
        assert_eq!(out.space(), ColorSpace::Rgba);
        assert_eq!(out.pixel(9, 7), &[5, 6, 7, 255]);
        assert_eq!(out.pixel(19, 0), &[0, 0, 0, 0]);
    }

    #[test]
    fn singular_homography_is_rejected() {
        let flat = Homography::from_matrix(Matrix3::zeros());
        assert!(warp_perspective(&checker(), &flat, 4, 4, BorderMode::Replicate).is_err());
    }
}
