// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Border blending around an inserted document.

use docxpand_core::{EdgeBlurConfig, Result};
use docxpand_geometry::{Point, Quadrangle};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use tracing::{debug, instrument};

use crate::image::Image;
use crate::image::filter::gaussian_blur;

const MASK_ON: Luma<u8> = Luma([255]);

/// Outline width in pixels for `quad`: the configured fraction of the mean
/// top/bottom side length, truncated, capped at `max_width`.
pub fn edge_width(quad: &Quadrangle, config: &EdgeBlurConfig) -> u32 {
    let mean_side = (quad.p1.distance(&quad.p2) + quad.p3.distance(&quad.p4)) / 2.0;
    let width = (mean_side * config.width_factor).trunc();
    if width.is_finite() && width > 0.0 {
        (width as u32).min(config.max_width)
    } else {
        0
    }
}

/// Replace the pixels along the outline of `quad` by a blurred copy of the
/// image, hiding resampling aliasing on the document border.
///
/// A zero outline width selects no pixels and returns the image unchanged.
#[instrument(skip(image, config), fields(width = image.width(), height = image.height()))]
pub fn blur_document_edges(image: &Image, quad: &Quadrangle, config: &EdgeBlurConfig) -> Result<Image> {
    let line_width = edge_width(quad, config);
    if line_width == 0 {
        debug!("Outline width is zero, nothing to blend");
        return Ok(image.clone());
    }

    let blurred = gaussian_blur(image, config.kernel_size, config.sigma)?;
    let mask = outline_mask(image.width(), image.height(), quad, line_width);

    let channels = image.channels();
    let mut data = image.data().to_vec();
    let mut selected = 0usize;
    for (i, m) in mask.as_raw().iter().enumerate() {
        if *m == MASK_ON.0[0] {
            let range = i * channels..(i + 1) * channels;
            data[range.clone()].copy_from_slice(&blurred.data()[range]);
            selected += 1;
        }
    }
    debug!(line_width, selected, "Document edges blended");
    Image::new(image.width(), image.height(), image.space(), data)
}

/// Closed polyline through the corners of `quad`, `line_width` pixels wide.
/// Corners are truncated to integer pixels.
pub fn outline_mask(width: u32, height: u32, quad: &Quadrangle, line_width: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let corners = quad.points().map(|p| Point::new(p.x.trunc(), p.y.trunc()));

    for i in 0..4 {
        let (a, b) = (corners[i], corners[(i + 1) % 4]);
        if line_width <= 1 {
            draw_line_segment_mut(&mut mask, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), MASK_ON);
        } else {
            draw_thick_segment(&mut mask, a, b, line_width);
        }
    }
    if line_width > 1 {
        let radius = (line_width / 2) as i32;
        for c in corners {
            draw_filled_circle_mut(&mut mask, (c.x as i32, c.y as i32), radius, MASK_ON);
        }
    }
    mask
}

fn draw_thick_segment(mask: &mut GrayImage, a: Point, b: Point, line_width: u32) {
    let length = a.distance(&b);
    if length == 0.0 {
        return;
    }
    let half = line_width as f64 / 2.0;
    let (nx, ny) = (-(b.y - a.y) / length * half, (b.x - a.x) / length * half);
    let corner = |p: Point, sign: f64| PixelPoint::new((p.x + sign * nx).round() as i32, (p.y + sign * ny).round() as i32);
    let poly = [corner(a, 1.0), corner(b, 1.0), corner(b, -1.0), corner(a, -1.0)];
    if poly[0] == poly[3] {
        draw_line_segment_mut(mask, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), MASK_ON);
    } else {
        draw_polygon_mut(mask, &poly, MASK_ON);
    }
}

// -- Tests --------------------------------------------------------------------
