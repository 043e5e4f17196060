// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation and resolution normalization. Decodes the submitted photo,
// applies the EXIF orientation so pixels match the intended viewing
// direction, and bounds the longest side so every later stage works on a
// predictable pixel count.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageReader, Limits, RgbImage};
use passwerk_core::error::{PasswerkError, Result};
use tracing::{debug, info, instrument};

/// Hard ceiling on either decoded dimension, independent of the resize cap.
const MAX_DECODE_DIMENSION: u32 = 16_384;

/// Hard ceiling on decoder allocations.
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Decode `data`, correct its orientation and cap its longest side at
/// `resolution_cap` pixels. Never upscales.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn normalize(data: &[u8], resolution_cap: u32) -> Result<RgbImage> {
    let decoded = decode(data)?;
    let orientation = read_exif_orientation(data);
    let oriented = apply_orientation(decoded, orientation);
    let capped = cap_resolution(oriented, resolution_cap);
    info!(
        width = capped.width(),
        height = capped.height(),
        orientation,
        "Photo normalized"
    );
    Ok(capped)
}

/// Decode encoded photo bytes to RGB under fixed allocation limits.
pub fn decode(data: &[u8]) -> Result<RgbImage> {
    if data.is_empty() {
        return Err(PasswerkError::InputDecode("input is empty".into()));
    }

    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|err| PasswerkError::InputDecode(format!("failed to read input: {}", err)))?;
    if reader.format().is_none() {
        return Err(PasswerkError::InputDecode("unrecognised image format".into()));
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    reader.limits(limits);

    let image = reader
        .decode()
        .map_err(|err| PasswerkError::InputDecode(format!("failed to decode image: {}", err)))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PasswerkError::InputDecode("image has no pixels".into()));
    }
    debug!(width = image.width(), height = image.height(), "Photo decoded");
    Ok(image.to_rgb8())
}

/// Read the EXIF orientation tag (0x0112). Returns 1 (normal) when the
/// container has no EXIF block or the tag is absent.
pub fn read_exif_orientation(data: &[u8]) -> u32 {
    let mut cursor = Cursor::new(data);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Undo an EXIF orientation so the image displays upright.
///
/// 1 = normal, 2 = mirrored, 3 = 180°, 4 = flipped vertically,
/// 5 = transposed, 6 = 90° CW, 7 = transversed, 8 = 270° CW.
/// Unknown values are treated as normal.
pub fn apply_orientation(image: RgbImage, orientation: u32) -> RgbImage {
    match orientation {
        2 => imageops::flip_horizontal(&image),
        3 => imageops::rotate180(&image),
        4 => imageops::flip_vertical(&image),
        5 => imageops::flip_horizontal(&imageops::rotate90(&image)),
        6 => imageops::rotate90(&image),
        7 => imageops::flip_horizontal(&imageops::rotate270(&image)),
        8 => imageops::rotate270(&image),
        _ => image,
    }
}

/// Downscale so the longest side is at most `cap`, preserving aspect ratio.
/// Images already within the cap are returned untouched.
pub fn cap_resolution(image: RgbImage, cap: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if cap == 0 || longest <= cap {
        return image;
    }

    let scale = cap as f64 / longest as f64;
    let new_w = ((width as f64 * scale).round() as u32).clamp(1, cap);
    let new_h = ((height as f64 * scale).round() as u32).clamp(1, cap);
    debug!(width, height, new_w, new_h, "Downscaling to resolution cap");
    imageops::resize(&image, new_w, new_h, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb};

    fn png_bytes(image: RgbImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    /// 40x20 JPEG, red on the left and blue on the right, carrying an APP1
    /// EXIF block with the given orientation.
    fn camera_jpeg(orientation: u16) -> Vec<u8> {
        let img = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 100)
            .encode_image(&img)
            .unwrap();

        // Little-endian TIFF header, one IFD holding a single SHORT entry.
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut app1 = vec![0xFF, 0xE1];
        app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&tiff);

        // Straight after SOI.
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        jpeg.splice(2..2, app1);
        jpeg
    }

    fn is_red(px: &Rgb<u8>) -> bool {
        px.0[0] > 200 && px.0[2] < 60
    }

    fn is_blue(px: &Rgb<u8>) -> bool {
        px.0[2] > 200 && px.0[0] < 60
    }

    #[test]
    fn downscales_longest_side_to_cap() {
        let data = png_bytes(RgbImage::from_pixel(3000, 1500, Rgb([10, 20, 30])));
        let out = normalize(&data, 1200).unwrap();
        assert_eq!(out.dimensions(), (1200, 600));
    }

    #[test]
    fn never_upscales() {
        let data = png_bytes(RgbImage::from_pixel(300, 400, Rgb([10, 20, 30])));
        let out = normalize(&data, 1200).unwrap();
        assert_eq!(out.dimensions(), (300, 400));
    }

    #[test]
    fn extreme_aspect_keeps_at_least_one_pixel() {
        let out = cap_resolution(RgbImage::new(5000, 1), 1000);
        assert_eq!(out.dimensions(), (1000, 1));
    }

    #[test]
    fn garbage_bytes_fail_with_input_decode() {
        let err = normalize(b"definitely not an image", 1200).unwrap_err();
        assert!(matches!(err, PasswerkError::InputDecode(_)));
    }

    #[test]
    fn empty_input_fails_with_input_decode() {
        assert!(matches!(normalize(&[], 1200), Err(PasswerkError::InputDecode(_))));
    }

    #[test]
    fn truncated_png_fails_with_input_decode() {
        let mut data = png_bytes(RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])));
        data.truncate(data.len() / 2);
        assert!(matches!(normalize(&data, 1200), Err(PasswerkError::InputDecode(_))));
    }

    #[test]
    fn png_without_exif_reads_as_normal() {
        let data = png_bytes(RgbImage::new(4, 4));
        assert_eq!(read_exif_orientation(&data), 1);
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        // 2x1 image: red on the left, blue on the right.
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));

        let out = apply_orientation(img, 6);
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(*out.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(0, 1), Rgb([0, 0, 255]));
    }

    #[test]
    fn camera_jpeg_rotated_ninety_is_turned_upright() {
        let data = camera_jpeg(6);
        assert_eq!(read_exif_orientation(&data), 6);

        let out = normalize(&data, 1200).unwrap();
        assert_eq!(out.dimensions(), (20, 40));
        // The left (red) half of the stored frame ends up on top.
        assert!(is_red(out.get_pixel(10, 5)), "{:?}", out.get_pixel(10, 5));
        assert!(is_blue(out.get_pixel(10, 35)), "{:?}", out.get_pixel(10, 35));
    }

    #[test]
    fn every_exif_orientation_is_honoured_on_decode() {
        for orientation in 1..=8u16 {
            let data = camera_jpeg(orientation);
            assert_eq!(read_exif_orientation(&data), orientation as u32);

            let out = normalize(&data, 1200).unwrap();
            let want = if orientation >= 5 { (20, 40) } else { (40, 20) };
            assert_eq!(out.dimensions(), want, "orientation {orientation}");
        }

        // Mirrored: red moves to the right.
        let out = normalize(&camera_jpeg(2), 1200).unwrap();
        assert!(is_blue(out.get_pixel(5, 10)) && is_red(out.get_pixel(35, 10)));
        // 270 CW: red ends up at the bottom.
        let out = normalize(&camera_jpeg(8), 1200).unwrap();
        assert!(is_blue(out.get_pixel(10, 5)) && is_red(out.get_pixel(10, 35)));
    }

    #[test]
    fn orientations_map_pixels_like_exif_describes() {
        let (w, h) = (3u32, 2u32);
        let src = RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0]));
        // Where source (x, y) lands after undoing each orientation.
        let cases: [(u32, fn(u32, u32, u32, u32) -> (u32, u32)); 7] = [
            (2, |x, y, w, _| (w - 1 - x, y)),
            (3, |x, y, w, h| (w - 1 - x, h - 1 - y)),
            (4, |x, y, _, h| (x, h - 1 - y)),
            (5, |x, y, _, _| (y, x)),
            (6, |x, y, _, h| (h - 1 - y, x)),
            (7, |x, y, w, h| (h - 1 - y, w - 1 - x)),
            (8, |x, y, w, _| (y, w - 1 - x)),
        ];
        for (orientation, place) in cases {
            let out = apply_orientation(src.clone(), orientation);
            for (x, y, px) in src.enumerate_pixels() {
                let (dx, dy) = place(x, y, w, h);
                assert_eq!(out.get_pixel(dx, dy), px, "orientation {orientation} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn orientation_five_transposes() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([9, 9, 9]));
        let out = apply_orientation(img, 5);
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(*out.get_pixel(1, 2), Rgb([9, 9, 9]));
    }

    #[test]
    fn unknown_orientation_is_identity() {
        let img = RgbImage::from_pixel(3, 2, Rgb([7, 7, 7]));
        assert_eq!(apply_orientation(img.clone(), 42), img);
    }
}
