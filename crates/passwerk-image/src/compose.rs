// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositor. Scales the tightened subject so it fills 75% of the canvas
// height, anchors it to the bottom edge (plus the configured offset), centres
// it horizontally and over-composites it onto a 600x800 solid background.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};
use passwerk_core::config::{VERTICAL_OFFSET_RANGE, ZOOM_RANGE};
use passwerk_core::error::{PasswerkError, Result};
use passwerk_core::{BackgroundColor, CANVAS_HEIGHT, CANVAS_WIDTH, PhotoConfig, PixelRect};
use tracing::{debug, info, instrument, warn};

use crate::matte::Foreground;

/// Share of the canvas height the subject occupies at zoom 1.0.
const SUBJECT_HEIGHT_RATIO: f64 = 0.75;

/// Largest resampled foreground (in pixels) built in one piece. Beyond this
/// only the part that can land on the canvas is resampled.
const MAX_RESAMPLE_PIXELS: u64 = 8 * 1024 * 1024;

/// An opaque 600x800 identity photo.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPhoto(RgbImage);

impl CanonicalPhoto {
    /// Wrap an image, which must be exactly 600x800.
    pub fn from_rgb(image: RgbImage) -> Result<Self> {
        if image.dimensions() != (CANVAS_WIDTH, CANVAS_HEIGHT) {
            return Err(PasswerkError::InvalidConfig(format!(
                "canonical photo must be {}x{}, got {}x{}",
                CANVAS_WIDTH,
                CANVAS_HEIGHT,
                image.width(),
                image.height()
            )));
        }
        Ok(Self(image))
    }

    /// A canvas showing only the background colour.
    pub fn blank(background: BackgroundColor) -> Self {
        Self(RgbImage::from_pixel(
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            Rgb(background.rgb()),
        ))
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }

    pub fn into_rgb(self) -> RgbImage {
        self.0
    }
}

/// Geometry of the subject on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Combined scale applied to the foreground (base scale times zoom).
    pub scale: f64,
    /// Resized foreground rectangle in canvas coordinates. May extend past
    /// the canvas on any side.
    pub rect: PixelRect,
}

/// Result of compositing: the photo plus where the subject went.
#[derive(Debug, Clone)]
pub struct Composite {
    pub photo: CanonicalPhoto,
    pub placement: Placement,
}

/// Compute scale and paste position for a `fg_width` x `fg_height` subject.
///
/// Fails with `EmptyForeground` when the foreground or its scaled size is
/// degenerate.
pub fn plan_placement(fg_width: u32, fg_height: u32, zoom: f32, vertical_offset: i32) -> Result<Placement> {
    if fg_width == 0 || fg_height == 0 {
        return Err(PasswerkError::EmptyForeground(format!(
            "foreground is {}x{}",
            fg_width, fg_height
        )));
    }

    let zoom = if zoom.is_finite() {
        zoom.clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end())
    } else {
        1.0
    };
    let offset = vertical_offset.clamp(*VERTICAL_OFFSET_RANGE.start(), *VERTICAL_OFFSET_RANGE.end());

    let base_scale = (CANVAS_HEIGHT as f64 * SUBJECT_HEIGHT_RATIO) / fg_height as f64;
    let scale = base_scale * zoom as f64;

    // Saturating float-to-int casts keep absurd sizes finite.
    let new_w = (fg_width as f64 * scale).round() as u32;
    let new_h = (fg_height as f64 * scale).round() as u32;
    if new_w == 0 || new_h == 0 {
        return Err(PasswerkError::EmptyForeground(format!(
            "{}x{} foreground scales to {}x{}",
            fg_width, fg_height, new_w, new_h
        )));
    }

    let paste_x = (CANVAS_WIDTH as i64 - new_w as i64).div_euclid(2);
    let paste_y = CANVAS_HEIGHT as i64 - new_h as i64 + offset as i64;

    Ok(Placement {
        scale,
        rect: PixelRect::new(paste_x, paste_y, new_w, new_h),
    })
}

/// Composite `foreground` onto a canvas filled with the configured
/// background colour. The output is always exactly 600x800 and opaque.
#[instrument(skip_all, fields(
    fg_width = foreground.width(),
    fg_height = foreground.height(),
    zoom = config.zoom,
    vertical_offset = config.vertical_offset,
))]
pub fn compose(foreground: &Foreground, config: &PhotoConfig) -> Result<Composite> {
    let placement = plan_placement(
        foreground.width(),
        foreground.height(),
        config.zoom,
        config.vertical_offset,
    )?;
    let rect = placement.rect;
    info!(
        scale = placement.scale,
        x = rect.x,
        y = rect.y,
        width = rect.width,
        height = rect.height,
        "Placing subject on canvas"
    );

    let mut canvas = CanonicalPhoto::blank(config.background_color).into_rgb();
    let canvas_rect = PixelRect::new(0, 0, CANVAS_WIDTH, CANVAS_HEIGHT);
    if !rect.intersects(&canvas_rect) {
        warn!("Subject lies entirely outside the canvas");
        return Ok(Composite {
            photo: CanonicalPhoto(canvas),
            placement,
        });
    }

    let layer = build_layer(foreground.as_rgba(), &rect);
    blend_over(&mut canvas, &layer);

    Ok(Composite {
        photo: CanonicalPhoto(canvas),
        placement,
    })
}

/// Resample the foreground to `rect` and paste it onto a transparent
/// canvas-sized layer. Pixels outside the canvas are clipped.
///
/// The layer is premultiplied: colour under fully transparent pixels never
/// bleeds into the subject's edge during resampling.
fn build_layer(foreground: &RgbaImage, rect: &PixelRect) -> RgbaImage {
    let mut layer = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);

    if rect.width as u64 * rect.height as u64 <= MAX_RESAMPLE_PIXELS {
        let source = premultiply(foreground);
        let resized = imageops::resize(&source, rect.width, rect.height, FilterType::Lanczos3);
        imageops::replace(&mut layer, &resized, rect.x, rect.y);
        return layer;
    }

    // Only resample the source window that maps onto the canvas.
    let (fg_w, fg_h) = foreground.dimensions();
    let sx = rect.width as f64 / fg_w as f64;
    let sy = rect.height as f64 / fg_h as f64;

    let vis_x0 = (-rect.x).max(0) as f64;
    let vis_x1 = (CANVAS_WIDTH as i64 - rect.x).min(rect.width as i64) as f64;
    let vis_y0 = (-rect.y).max(0) as f64;
    let vis_y1 = (CANVAS_HEIGHT as i64 - rect.y).min(rect.height as i64) as f64;

    let src_x0 = ((vis_x0 / sx).floor() as u32).min(fg_w - 1);
    let src_x1 = ((vis_x1 / sx).ceil() as u32).clamp(src_x0 + 1, fg_w);
    let src_y0 = ((vis_y0 / sy).floor() as u32).min(fg_h - 1);
    let src_y1 = ((vis_y1 / sy).ceil() as u32).clamp(src_y0 + 1, fg_h);

    let window = imageops::crop_imm(foreground, src_x0, src_y0, src_x1 - src_x0, src_y1 - src_y0).to_image();
    let window = premultiply(&window);
    let win_w = (((src_x1 - src_x0) as f64 * sx).round() as u32).max(1);
    let win_h = (((src_y1 - src_y0) as f64 * sy).round() as u32).max(1);
    debug!(
        src_x0,
        src_y0,
        src_w = src_x1 - src_x0,
        src_h = src_y1 - src_y0,
        win_w,
        win_h,
        "Resampling visible window of oversized subject"
    );

    let resized = imageops::resize(&window, win_w, win_h, FilterType::Lanczos3);
    let at_x = rect.x + (src_x0 as f64 * sx).round() as i64;
    let at_y = rect.y + (src_y0 as f64 * sy).round() as i64;
    imageops::replace(&mut layer, &resized, at_x, at_y);
    layer
}

fn premultiply(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let alpha = px.0[3] as u32;
        for c in 0..3 {
            px.0[c] = ((px.0[c] as u32 * alpha + 127) / 255) as u8;
        }
    }
    out
}

/// "Over" compositing of a premultiplied RGBA layer onto an opaque canvas:
/// `dst = fg + bg * (1 - a)` per channel.
fn blend_over(canvas: &mut RgbImage, layer: &RgbaImage) {
    for (dst, src) in canvas.pixels_mut().zip(layer.pixels()) {
        let alpha = src.0[3] as u32;
        if alpha == 0 {
            continue;
        }
        for c in 0..3 {
            let fg = src.0[c] as u32;
            let bg = dst.0[c] as u32;
            // Resampling can ring a channel slightly above its alpha.
            dst.0[c] = (fg + (bg * (255 - alpha) + 127) / 255).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn opaque(width: u32, height: u32, colour: [u8; 3]) -> Foreground {
        Foreground::new(RgbaImage::from_pixel(
            width,
            height,
            Rgba([colour[0], colour[1], colour[2], 255]),
        ))
    }

    fn near(a: &Rgb<u8>, b: [u8; 3]) -> bool {
        a.0.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
    }

    #[test]
    fn thousand_pixel_subject_scales_to_six_hundred() {
        let placement = plan_placement(400, 1000, 1.0, 0).unwrap();
        assert!((placement.scale - 0.6).abs() < 1e-12);
        assert_eq!(placement.rect, PixelRect::new(180, 200, 240, 600));
    }

    #[test]
    fn scenario_subject_sits_on_bottom_edge() {
        let cfg = PhotoConfig::default();
        let out = compose(&opaque(400, 1000, [10, 20, 30]), &cfg).unwrap();
        let img = out.photo.as_rgb();
        assert_eq!(img.dimensions(), (600, 800));
        assert_eq!(*img.get_pixel(300, 199), Rgb([255, 255, 255]));
        assert!(near(img.get_pixel(300, 200), [10, 20, 30]));
        assert!(near(img.get_pixel(300, 799), [10, 20, 30]));
        assert_eq!(*img.get_pixel(179, 500), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(420, 500), Rgb([255, 255, 255]));
    }

    #[test]
    fn output_is_canonical_for_any_aspect() {
        let cfg = PhotoConfig::default();
        for (w, h) in [(1, 1), (50, 2000), (2000, 50), (600, 800), (3, 7)] {
            let out = compose(&opaque(w, h, [0, 0, 0]), &cfg).unwrap();
            assert_eq!(out.photo.as_rgb().dimensions(), (600, 800), "{w}x{h}");
        }
    }

    #[test]
    fn zoomed_wide_subject_clips_symmetrically() {
        // Left half red, right half blue.
        let mut img = RgbaImage::new(800, 1000);
        for (x, _, p) in img.enumerate_pixels_mut() {
            *p = if x < 400 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) };
        }
        let cfg = PhotoConfig {
            zoom: 2.0,
            ..PhotoConfig::default()
        };
        let out = compose(&Foreground::new(img), &cfg).unwrap();
        let rect = out.placement.rect;
        assert_eq!(rect.width, 960);
        assert_eq!(rect.x, -180);
        assert_eq!(rect.right() - 600, 180);

        let photo = out.photo.as_rgb();
        assert_eq!(photo.dimensions(), (600, 800));
        assert!(near(photo.get_pixel(0, 400), [255, 0, 0]));
        assert!(near(photo.get_pixel(599, 400), [0, 0, 255]));
    }

    #[test]
    fn extreme_aspect_uses_windowed_resample() {
        let cfg = PhotoConfig::default();
        let out = compose(&opaque(5000, 10, [40, 80, 120]), &cfg).unwrap();
        let rect = out.placement.rect;
        assert!(rect.width as u64 * rect.height as u64 > MAX_RESAMPLE_PIXELS);
        let photo = out.photo.as_rgb();
        assert_eq!(photo.dimensions(), (600, 800));
        assert!(near(photo.get_pixel(300, 500), [40, 80, 120]));
        assert!(near(photo.get_pixel(0, 799), [40, 80, 120]));
    }

    #[test]
    fn transparent_black_does_not_darken_edges() {
        // Left half transparent black, right half opaque white, on white.
        let img = RgbaImage::from_fn(100, 100, |x, _| {
            if x < 50 { Rgba([0, 0, 0, 0]) } else { Rgba([255, 255, 255, 255]) }
        });
        let out = compose(&Foreground::new(img), &PhotoConfig::default()).unwrap();
        assert_eq!(out.placement.rect, PixelRect::new(0, 200, 600, 600));

        let photo = out.photo.as_rgb();
        for y in [200, 500, 799] {
            for x in 0..600 {
                assert_eq!(*photo.get_pixel(x, y), Rgb([255, 255, 255]), "({x}, {y})");
            }
        }
    }

    #[test]
    fn subject_pushed_off_canvas_leaves_background() {
        let cfg = PhotoConfig {
            zoom: 0.5,
            vertical_offset: 300,
            background_color: BackgroundColor::Blue,
            ..PhotoConfig::default()
        };
        let out = compose(&opaque(300, 600, [0, 0, 0]), &cfg).unwrap();
        assert_eq!(out.placement.rect.y, 800);
        assert_eq!(out.photo, CanonicalPhoto::blank(BackgroundColor::Blue));
    }

    #[test]
    fn degenerate_scale_is_empty_foreground() {
        let cfg = PhotoConfig {
            zoom: 0.5,
            ..PhotoConfig::default()
        };
        let err = compose(&opaque(1, 5000, [0, 0, 0]), &cfg).unwrap_err();
        assert!(matches!(err, PasswerkError::EmptyForeground(_)));
    }

    #[test]
    fn zero_sized_foreground_is_empty_foreground() {
        let err = plan_placement(0, 100, 1.0, 0).unwrap_err();
        assert!(matches!(err, PasswerkError::EmptyForeground(_)));
    }

    #[test]
    fn half_transparent_subject_blends_with_background() {
        let fg = Foreground::new(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 128])));
        let out = compose(&fg, &PhotoConfig::default()).unwrap();
        let px = out.photo.as_rgb().get_pixel(300, 500);
        // 0 * 128/255 + 255 * 127/255 = 127.
        assert!(near(px, [127, 127, 127]), "{px:?}");
    }

    #[test]
    fn negative_offset_moves_subject_up() {
        let placement = plan_placement(400, 1000, 1.0, -150).unwrap();
        assert_eq!(placement.rect.y, 50);
    }

    #[test]
    fn out_of_domain_zoom_is_clamped() {
        let placement = plan_placement(400, 1000, 50.0, 0).unwrap();
        assert!((placement.scale - 1.2).abs() < 1e-12);
    }

    #[test]
    fn canonical_photo_rejects_wrong_size() {
        assert!(CanonicalPhoto::from_rgb(RgbImage::new(600, 799)).is_err());
        assert!(CanonicalPhoto::from_rgb(RgbImage::new(600, 800)).is_ok());
    }
}
