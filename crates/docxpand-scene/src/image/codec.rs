// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding and encoding of tagged images through the `image` crate.

use std::path::Path;

use docxpand_core::{DocxpandError, Result};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use tracing::{debug, info, instrument};

use super::Image;

impl Image {
    /// Load an image from a file, ignoring any EXIF orientation tag.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|err| {
            DocxpandError::ImageError(format!("failed to open {}: {}", path.display(), err))
        })?;
        let img = Self::from_dynamic(&decoded);
        info!(width = img.width(), height = img.height(), space = %img.space(), "Image loaded");
        Ok(img)
    }

    /// Load an image from a file and rotate/flip it upright according to its
    /// EXIF orientation. Used for photographs.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_oriented(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let fail = |err: &dyn std::fmt::Display| {
            DocxpandError::ImageError(format!("failed to open {}: {}", path.display(), err))
        };
        let mut decoder = ImageReader::open(path)
            .map_err(|e| fail(&e))?
            .with_guessed_format()
            .map_err(|e| fail(&e))?
            .into_decoder()
            .map_err(|e| fail(&e))?;
        let orientation = decoder.orientation().map_err(|e| fail(&e))?;
        let mut decoded = DynamicImage::from_decoder(decoder).map_err(|e| fail(&e))?;
        decoded.apply_orientation(orientation);

        let img = Self::from_dynamic(&decoded);
        info!(
            width = img.width(),
            height = img.height(),
            ?orientation,
            "Oriented image loaded"
        );
        Ok(img)
    }

    /// Decode an image from encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(data)
            .map_err(|err| DocxpandError::ImageError(format!("failed to decode image: {}", err)))?;
        let img = Self::from_dynamic(&decoded);
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(img)
    }

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.to_dynamic()?
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| DocxpandError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as JPEG bytes with the given quality (1-100). Alpha is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.to_dynamic()?.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| DocxpandError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. `.jpg`/`.jpeg` paths use `jpeg_quality`;
    /// other formats are inferred from the extension.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>, jpeg_quality: u8) -> Result<()> {
        let path = path.as_ref();
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
        if is_jpeg {
            std::fs::write(path, self.to_jpeg_bytes(jpeg_quality)?)?;
        } else {
            self.to_dynamic()?.save(path).map_err(|err| {
                DocxpandError::ImageError(format!(
                    "failed to save image to {}: {}",
                    path.display(),
                    err
                ))
            })?;
        }
        debug!(width = self.width(), height = self.height(), "Image saved");
        Ok(())
    }
}

// -- Tests --------------------------------------------------------------------
