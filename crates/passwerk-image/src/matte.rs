// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Foreground post-processing: brightness, contrast, alpha feathering and
// bounding-box crop of the segmented subject. Operates on the RGBA bitmap
// returned by the segmentation engine using the `image` and `imageproc` crates.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};
use imageproc::filter::gaussian_blur_f32;
use passwerk_core::error::{PasswerkError, Result};
use passwerk_core::{PhotoConfig, PixelRect};
use tracing::{debug, info, instrument};

/// Segmented subject with per-pixel alpha (0 = background, 255 = subject).
///
/// All operations are non-destructive: each method consumes `self` and returns
/// a new `Foreground`, enabling method chaining.
///
/// ```ignore
/// let subject = Foreground::new(rgba)
///     .adjust_brightness(1.1)
///     .adjust_contrast(1.05)
///     .feather(2.0)
///     .crop_to_subject()?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Foreground {
    image: RgbaImage,
}

impl Foreground {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    /// Run the post-processing chain configured in `config`:
    /// brightness, contrast, feathering, then bounding-box crop.
    #[instrument(skip_all, fields(width = self.width(), height = self.height()))]
    pub fn post_process(self, config: &PhotoConfig) -> Result<Self> {
        self.soften(config).crop_to_subject()
    }

    /// The tone and alpha steps of [`Foreground::post_process`], without the
    /// crop.
    pub fn soften(self, config: &PhotoConfig) -> Self {
        self.adjust_brightness(config.brightness)
            .adjust_contrast(config.contrast)
            .feather(config.feather_radius)
    }

    // -- Tone -----------------------------------------------------------------

    /// Multiply every colour channel by `factor`. Alpha is untouched.
    #[instrument(skip(self))]
    pub fn adjust_brightness(self, factor: f32) -> Self {
        if factor == 1.0 || !factor.is_finite() {
            return self;
        }
        info!(factor, "Adjusting subject brightness");
        self.map_colour(|v| v * factor)
    }

    /// Stretch colour channels around mid-grey: `128 + (v - 128) * factor`.
    /// Alpha is untouched.
    #[instrument(skip(self))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        if factor == 1.0 || !factor.is_finite() {
            return self;
        }
        info!(factor, "Adjusting subject contrast");
        self.map_colour(|v| 128.0 + (v - 128.0) * factor)
    }

    fn map_colour(mut self, f: impl Fn(f32) -> f32) -> Self {
        let adjust = |channel: u8| -> u8 { f(channel as f32).round().clamp(0.0, 255.0) as u8 };
        for pixel in self.image.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            *pixel = Rgba([adjust(r), adjust(g), adjust(b), a]);
        }
        self
    }

    // -- Alpha ----------------------------------------------------------------

    /// Soften the alpha edge with a Gaussian blur of standard deviation
    /// `radius`. A radius of zero (or less) leaves alpha bit-for-bit intact.
    /// Colour channels are untouched.
    #[instrument(skip(self))]
    pub fn feather(mut self, radius: f32) -> Self {
        if radius <= 0.0 || !radius.is_finite() || self.image.width() == 0 || self.image.height() == 0 {
            return self;
        }
        info!(radius, "Feathering alpha edge");

        let alpha = self.alpha_channel();
        let blurred = gaussian_blur_f32(&alpha, radius);
        for (pixel, soft) in self.image.pixels_mut().zip(blurred.pixels()) {
            pixel.0[3] = soft.0[0];
        }
        self
    }

    /// Extract the alpha channel as a grayscale image.
    pub fn alpha_channel(&self) -> GrayImage {
        GrayImage::from_fn(self.image.width(), self.image.height(), |x, y| {
            Luma([self.image.get_pixel(x, y).0[3]])
        })
    }

    // -- Bounding box ---------------------------------------------------------

    /// Minimal rectangle enclosing every pixel with non-zero alpha, or `None`
    /// if the bitmap is fully transparent.
    pub fn subject_bounds(&self) -> Option<PixelRect> {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut found = false;

        for (x, y, pixel) in self.image.enumerate_pixels() {
            if pixel.0[3] > 0 {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        if !found {
            return None;
        }
        Some(PixelRect::new(
            min_x as i64,
            min_y as i64,
            max_x - min_x + 1,
            max_y - min_y + 1,
        ))
    }

    /// Crop to [`Foreground::subject_bounds`]. Fails with `EmptyForeground`
    /// when no pixel has alpha above zero. Cropping an already-cropped
    /// foreground returns it unchanged.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn crop_to_subject(self) -> Result<Self> {
        let bounds = self.subject_bounds().ok_or_else(|| {
            PasswerkError::EmptyForeground(format!(
                "no pixel with alpha > 0 in {}x{} foreground",
                self.image.width(),
                self.image.height()
            ))
        })?;

        if bounds.x == 0
            && bounds.y == 0
            && bounds.width == self.image.width()
            && bounds.height == self.image.height()
        {
            debug!("Foreground already tight");
            return Ok(self);
        }

        debug!(
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "Cropping foreground to subject"
        );
        let cropped = imageops::crop_imm(
            &self.image,
            bounds.x as u32,
            bounds.y as u32,
            bounds.width,
            bounds.height,
        )
        .to_image();
        Ok(Self { image: cropped })
    }
}
