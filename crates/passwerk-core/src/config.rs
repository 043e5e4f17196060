// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-request photo configuration.
//
// A `PhotoConfig` is built once per request (from JSON, CLI flags, or code)
// and passed by reference through every stage. Stages never mutate it.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::types::{BackgroundColor, LayoutMode, OutputFormat};

pub const BRIGHTNESS_RANGE: RangeInclusive<f32> = 0.5..=1.5;
pub const CONTRAST_RANGE: RangeInclusive<f32> = 0.5..=1.5;
pub const FEATHER_RANGE: RangeInclusive<f32> = 0.0..=5.0;
pub const ZOOM_RANGE: RangeInclusive<f32> = 0.5..=2.0;
pub const VERTICAL_OFFSET_RANGE: RangeInclusive<i32> = -300..=300;
pub const TEMPERATURE_RANGE: RangeInclusive<i32> = -100..=100;
pub const RESOLUTION_CAP_RANGE: RangeInclusive<u32> = 256..=8192;
pub const JPEG_QUALITY_RANGE: RangeInclusive<u8> = 1..=100;

/// Tuning triple forwarded untouched to the segmentation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MattingParams {
    /// Alpha above which a pixel is treated as certain foreground.
    pub foreground_threshold: u8,
    /// Alpha below which a pixel is treated as certain background.
    pub background_threshold: u8,
    /// Erosion applied to the trimap, in pixels.
    pub erode_size: u32,
}

impl Default for MattingParams {
    fn default() -> Self {
        Self {
            foreground_threshold: 240,
            background_threshold: 10,
            erode_size: 10,
        }
    }
}

/// All tunable parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Canvas fill colour.
    pub background_color: BackgroundColor,
    /// Multiplicative brightness factor applied to the subject.
    pub brightness: f32,
    /// Contrast factor around mid-grey (128) applied to the subject.
    pub contrast: f32,
    /// Gaussian sigma for alpha edge softening. 0 disables feathering.
    pub feather_radius: f32,
    /// Extra scale on top of the 75%-of-height rule.
    pub zoom: f32,
    /// Vertical shift of the subject in pixels; negative moves it up.
    pub vertical_offset: i32,
    /// Gray-world white balance on the full photo.
    pub auto_white_balance: bool,
    /// Manual warm (+) / cool (-) bias.
    pub color_temperature: i32,
    pub layout_mode: LayoutMode,
    /// Longest side allowed after normalization.
    pub resolution_cap: u32,
    pub jpeg_quality: u8,
    /// Optional engine tuning, passed through unchanged.
    pub matting: Option<MattingParams>,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            background_color: BackgroundColor::White,
            brightness: 1.0,
            contrast: 1.0,
            feather_radius: 0.0,
            zoom: 1.0,
            vertical_offset: 0,
            auto_white_balance: false,
            color_temperature: 0,
            layout_mode: LayoutMode::Single,
            resolution_cap: 1200,
            jpeg_quality: 95,
            matting: None,
        }
    }
}

impl PhotoConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Return a copy with every field clamped into its legal domain.
    ///
    /// Non-finite floats fall back to the default value. Each adjusted field
    /// is logged once.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            background_color: self.background_color,
            brightness: clamp_f32("brightness", self.brightness, BRIGHTNESS_RANGE, defaults.brightness),
            contrast: clamp_f32("contrast", self.contrast, CONTRAST_RANGE, defaults.contrast),
            feather_radius: clamp_f32(
                "feather_radius",
                self.feather_radius,
                FEATHER_RANGE,
                defaults.feather_radius,
            ),
            zoom: clamp_f32("zoom", self.zoom, ZOOM_RANGE, defaults.zoom),
            vertical_offset: clamp_ord("vertical_offset", self.vertical_offset, VERTICAL_OFFSET_RANGE),
            auto_white_balance: self.auto_white_balance,
            color_temperature: clamp_ord("color_temperature", self.color_temperature, TEMPERATURE_RANGE),
            layout_mode: self.layout_mode,
            resolution_cap: clamp_ord("resolution_cap", self.resolution_cap, RESOLUTION_CAP_RANGE),
            jpeg_quality: clamp_ord("jpeg_quality", self.jpeg_quality, JPEG_QUALITY_RANGE),
            matting: self.matting,
        }
    }

    /// The default encoding for this configuration's artifact.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::Jpeg {
            quality: self.jpeg_quality,
        }
    }
}

fn clamp_f32(field: &str, value: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if !value.is_finite() {
        warn!(field, value = %value, fallback, "non-finite config value replaced");
        return fallback;
    }
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!(field, value, clamped, "config value clamped to domain");
    }
    clamped
}

fn clamp_ord<T>(field: &str, value: T, range: RangeInclusive<T>) -> T
where
    T: Ord + Copy + std::fmt::Debug,
{
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!(field, value = ?value, clamped = ?clamped, "config value clamped to domain");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_identity_adjustments() {
        let cfg = PhotoConfig::default();
        assert_eq!(cfg.brightness, 1.0);
        assert_eq!(cfg.contrast, 1.0);
        assert_eq!(cfg.feather_radius, 0.0);
        assert_eq!(cfg.zoom, 1.0);
        assert_eq!(cfg.sanitized(), cfg);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = PhotoConfig::from_json(r#"{"background_color":"blue","zoom":1.25}"#).unwrap();
        assert_eq!(cfg.background_color, BackgroundColor::Blue);
        assert_eq!(cfg.zoom, 1.25);
        assert_eq!(cfg.resolution_cap, 1200);
        assert!(cfg.matting.is_none());
    }

    #[test]
    fn sanitized_clamps_every_domain() {
        let cfg = PhotoConfig {
            brightness: 9.0,
            contrast: 0.0,
            feather_radius: -3.0,
            zoom: 40.0,
            vertical_offset: -10_000,
            color_temperature: 500,
            resolution_cap: 10,
            jpeg_quality: 0,
            ..PhotoConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.brightness, 1.5);
        assert_eq!(cfg.contrast, 0.5);
        assert_eq!(cfg.feather_radius, 0.0);
        assert_eq!(cfg.zoom, 2.0);
        assert_eq!(cfg.vertical_offset, -300);
        assert_eq!(cfg.color_temperature, 100);
        assert_eq!(cfg.resolution_cap, 256);
        assert_eq!(cfg.jpeg_quality, 1);
    }

    #[test]
    fn sanitized_replaces_nan() {
        let cfg = PhotoConfig {
            zoom: f32::NAN,
            brightness: f32::INFINITY,
            ..PhotoConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.zoom, 1.0);
        assert_eq!(cfg.brightness, 1.0);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = PhotoConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::error::PasswerkError::Serialization(_)));
    }
}
