// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output encoding for the finished artifact.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use passwerk_core::OutputFormat;
use passwerk_core::error::{PasswerkError, Result};
use tracing::{debug, instrument};

/// Encode an RGB image in the requested format.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn encode(image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Jpeg { quality } => to_jpeg_bytes(image, quality)?,
        OutputFormat::Png => to_png_bytes(image)?,
    };
    debug!(bytes = bytes.len(), mime = format.mime_type(), "Artifact encoded");
    Ok(bytes)
}

/// Encode as JPEG with the given quality (clamped to 1-100).
pub fn to_jpeg_bytes(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    image
        .write_with_encoder(encoder)
        .map_err(|err| PasswerkError::Encoding(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode as PNG.
pub fn to_png_bytes(image: &RgbImage) -> Result<Vec<u8>> {
    encode_to_format(&DynamicImage::ImageRgb8(image.clone()), ImageFormat::Png)
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| PasswerkError::Encoding(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
