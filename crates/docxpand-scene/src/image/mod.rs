// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image buffers tagged with their colour space, plus codec, colour
// conversion, filtering, and warping helpers.

pub mod codec;
pub mod color;
pub mod filter;
pub mod warp;

use docxpand_core::{ColorSpace, DocxpandError, Result};
use image::DynamicImage;
use image::imageops::FilterType;

/// An interleaved 8-bit pixel buffer whose channel layout is fixed by an
/// explicit [`ColorSpace`].
///
/// Rows are stored top to bottom with no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    space: ColorSpace,
    data: Vec<u8>,
}

impl Image {
    // -- Construction ---------------------------------------------------------

    /// Wrap raw interleaved bytes. The length must be
    /// `width * height * space.channels()`.
    pub fn new(width: u32, height: u32, space: ColorSpace, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * space.channels();
        if data.len() != expected {
            return Err(DocxpandError::invalid(format!(
                "{space} buffer of {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            space,
            data,
        })
    }

    /// An image with every pixel set to `pixel`.
    pub fn from_pixel(width: u32, height: u32, space: ColorSpace, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != space.channels() {
            return Err(DocxpandError::invalid(format!(
                "{space} pixel needs {} values, got {}",
                space.channels(),
                pixel.len()
            )));
        }
        let data = pixel.repeat(width as usize * height as usize);
        Self::new(width, height, space, data)
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        space: ColorSpace,
        f: impl Fn(u32, u32) -> Vec<u8>,
    ) -> Result<Self> {
        let channels = space.channels();
        let mut data = Vec::with_capacity(width as usize * height as usize * channels);
        for y in 0..height {
            for x in 0..width {
                let pixel = f(x, y);
                if pixel.len() != channels {
                    return Err(DocxpandError::invalid(format!(
                        "pixel ({x}, {y}) has {} values, {space} needs {channels}",
                        pixel.len()
                    )));
                }
                data.extend_from_slice(&pixel);
            }
        }
        Self::new(width, height, space, data)
    }

    /// Convert a decoded image. Images with alpha become `Rgba`, grayscale
    /// images `Gray`, everything else `Rgb`.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let color = image.color();
        let (space, data) = if color.has_alpha() {
            (ColorSpace::Rgba, image.to_rgba8().into_raw())
        } else if !color.has_color() {
            (ColorSpace::Gray, image.to_luma8().into_raw())
        } else {
            (ColorSpace::Rgb, image.to_rgb8().into_raw())
        };
        Self {
            width,
            height,
            space,
            data,
        }
    }

    /// Convert into the `image` crate's representation. Lab images are
    /// converted to RGB first.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let rebuild_failed =
            || DocxpandError::ImageError(format!("buffer does not fit {}x{}", self.width, self.height));
        let (w, h) = (self.width, self.height);
        Ok(match self.space {
            ColorSpace::Gray => DynamicImage::ImageLuma8(
                image::GrayImage::from_raw(w, h, self.data.clone()).ok_or_else(rebuild_failed)?,
            ),
            ColorSpace::Rgb => DynamicImage::ImageRgb8(
                image::RgbImage::from_raw(w, h, self.data.clone()).ok_or_else(rebuild_failed)?,
            ),
            ColorSpace::Rgba => DynamicImage::ImageRgba8(
                image::RgbaImage::from_raw(w, h, self.data.clone()).ok_or_else(rebuild_failed)?,
            ),
            ColorSpace::Lab => return self.convert(ColorSpace::Rgb).to_dynamic(),
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn space(&self) -> ColorSpace {
        self.space
    }

    pub fn channels(&self) -> usize {
        self.space.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// The channel values of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// When `(x, y)` lies outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.data[start..start + c]
    }

    /// One channel extracted as a contiguous plane.
    pub fn plane(&self, channel: usize) -> Result<Vec<u8>> {
        let c = self.channels();
        if channel >= c {
            return Err(DocxpandError::invalid(format!(
                "channel {channel} out of range for {}",
                self.space
            )));
        }
        Ok(self.data.iter().skip(channel).step_by(c).copied().collect())
    }

    /// Overwrite one channel from a contiguous plane.
    pub fn set_plane(&mut self, channel: usize, plane: &[u8]) -> Result<()> {
        let c = self.channels();
        if channel >= c || plane.len() != self.pixel_count() {
            return Err(DocxpandError::invalid(format!(
                "cannot write a {}-value plane into channel {channel} of a {}x{} {} image",
                plane.len(),
                self.width,
                self.height,
                self.space
            )));
        }
        for (dst, &src) in self.data.iter_mut().skip(channel).step_by(c).zip(plane) {
            *dst = src;
        }
        Ok(())
    }

    /// The alpha plane, when the colour space carries one.
    pub fn alpha(&self) -> Option<Vec<u8>> {
        if !self.space.has_alpha() {
            return None;
        }
        self.plane(self.channels() - 1).ok()
    }

    /// Attach `alpha` to an RGB image, producing RGBA. Other spaces are
    /// converted to RGB first.
    pub fn with_alpha(&self, alpha: &[u8]) -> Result<Self> {
        if alpha.len() != self.pixel_count() {
            return Err(DocxpandError::invalid(format!(
                "alpha plane has {} values for {} pixels",
                alpha.len(),
                self.pixel_count()
            )));
        }
        let rgb = self.convert(ColorSpace::Rgb);
        let mut data = Vec::with_capacity(self.pixel_count() * 4);
        for (px, &a) in rgb.data.chunks_exact(3).zip(alpha) {
            data.extend_from_slice(px);
            data.push(a);
        }
        Self::new(self.width, self.height, ColorSpace::Rgba, data)
    }

    pub(crate) fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    // -- Transformations ------------------------------------------------------

    /// Convert into `target`. Conversion between any two spaces is defined;
    /// alpha is dropped or set opaque as needed.
    pub fn convert(&self, target: ColorSpace) -> Self {
        if target == self.space {
            return self.clone();
        }
        Self {
            width: self.width,
            height: self.height,
            space: target,
            data: color::convert_buffer(&self.data, self.space, target),
        }
    }

    /// Resample to exactly `width` x `height` with a triangle (bilinear)
    /// filter, channel by channel.
    pub fn resize(&self, width: u32, height: u32) -> Result<Self> {
        if (width, height) == self.dimensions() {
            return Ok(self.clone());
        }
        let c = self.channels();
        let mut out = Self::new(
            width,
            height,
            self.space,
            vec![0; width as usize * height as usize * c],
        )?;
        for channel in 0..c {
            let plane = resize_plane(&self.plane(channel)?, self.width, self.height, width, height)?;
            out.set_plane(channel, &plane)?;
        }
        Ok(out)
    }
}

/// Resample a single 8-bit plane.
pub fn resize_plane(
    plane: &[u8],
    width: u32,
    height: u32,
    new_width: u32,
    new_height: u32,
) -> Result<Vec<u8>> {
    let gray = image::GrayImage::from_raw(width, height, plane.to_vec()).ok_or_else(|| {
        DocxpandError::invalid(format!("plane of {} values is not {width}x{height}", plane.len()))
    })?;
    Ok(image::imageops::resize(&gray, new_width, new_height, FilterType::Triangle).into_raw())
}

// -- Tests --------------------------------------------------------------------
