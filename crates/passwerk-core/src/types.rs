// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Passwerk identity photo pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of the canonical identity photo canvas in pixels.
pub const CANVAS_WIDTH: u32 = 600;
/// Height of the canonical identity photo canvas in pixels (3:4 with width).
pub const CANVAS_HEIGHT: u32 = 800;

/// Width of the N-up print sheet in pixels (6 in at 300 DPI).
pub const SHEET_WIDTH: u32 = 1800;
/// Height of the N-up print sheet in pixels (4 in at 300 DPI).
pub const SHEET_HEIGHT: u32 = 1200;

/// Resolution the print sheet is laid out for.
pub const SHEET_DPI: u32 = 300;

/// Unique identifier for a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Solid background colours offered for the identity photo canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundColor {
    #[default]
    White,
    Blue,
    Pink,
}

impl BackgroundColor {
    /// The RGB triple used to fill the canvas.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Self::White => [255, 255, 255],
            Self::Blue => [0, 191, 255],
            Self::Pink => [255, 192, 203],
        }
    }

    /// Parse a colour keyword (case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "white" => Some(Self::White),
            "blue" => Some(Self::Blue),
            "pink" => Some(Self::Pink),
            _ => None,
        }
    }
}

/// How the finished photo is arranged for output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// The 600x800 photo on its own.
    #[default]
    Single,
    /// Four copies, 2 rows by 2 columns, on a 6x4 in sheet.
    #[serde(rename = "grid2x2")]
    Grid2x2,
    /// Eight copies, 2 rows by 4 columns, on a 6x4 in sheet.
    #[serde(rename = "grid4x2")]
    Grid4x2,
}

impl LayoutMode {
    /// Grid shape as `(rows, cols)`, or `None` for [`LayoutMode::Single`].
    pub fn grid(&self) -> Option<(u32, u32)> {
        match self {
            Self::Single => None,
            Self::Grid2x2 => Some((2, 2)),
            Self::Grid4x2 => Some((2, 4)),
        }
    }

    /// Number of photo copies on the output.
    pub fn copies(&self) -> u32 {
        self.grid().map(|(rows, cols)| rows * cols).unwrap_or(1)
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "grid2x2" | "2x2" => Some(Self::Grid2x2),
            "grid4x2" | "4x2" => Some(Self::Grid4x2),
            _ => None,
        }
    }
}

/// Encoded form of the final artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Lossy JPEG at the given quality (1-100).
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    /// MIME type of the encoded artifact.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    /// Infer the format from a file extension. JPEG uses `quality`.
    pub fn from_extension(ext: &str, quality: u8) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg { quality }),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Pipeline stages, in execution order. Used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    ColorCorrect,
    Segment,
    PostProcess,
    Composite,
    Layout,
    Encode,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::ColorCorrect => "color-correct",
            Self::Segment => "segment",
            Self::PostProcess => "post-process",
            Self::Composite => "composite",
            Self::Layout => "layout",
            Self::Encode => "encode",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis-aligned pixel rectangle. `x`/`y` may be negative for placements that
/// hang off the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Whether the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Whether this rectangle lies entirely within `width` x `height`.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width as i64 && self.bottom() <= height as i64
    }
}

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderReport {
    pub request_id: RequestId,
    /// SHA-256 of the submitted photo bytes, hex encoded.
    pub input_hash: String,
    /// Photo dimensions after orientation and downscaling.
    pub normalized_size: (u32, u32),
    /// Subject bounding box within the segmented foreground.
    pub subject_box: PixelRect,
    /// Where the resized subject was placed on the canvas.
    pub placement: PixelRect,
    pub layout: LayoutMode,
    pub rendered_at: DateTime<Utc>,
}
