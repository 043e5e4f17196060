// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and how they map onto a `PhotoConfig`.

use std::path::{Path, PathBuf};

use clap::Parser;
use passwerk_core::{BackgroundColor, LayoutMode, MattingParams, OutputFormat, PhotoConfig};

/// Base name of the artifact when `--output` is not given.
const DEFAULT_OUTPUT_STEM: &str = "id_photo";

#[derive(Debug, Parser)]
#[command(name = "passwerk")]
#[command(version, about = "Turn a portrait into a 3:4 identity photo or print sheet", long_about = None)]
pub struct Cli {
    /// Portrait photo (JPEG, PNG, WebP, ...)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file [default: id_photo.jpg next to INPUT]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON configuration file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the rembg segmentation server
    #[arg(long, value_name = "URL", env = "PASSWERK_SEGMENTER_URL")]
    pub segmenter_url: String,

    /// Segmentation model to request from the server
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Seconds to wait for the segmentation server
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,

    /// Background colour: white, blue or pink
    #[arg(long, value_name = "COLOUR", value_parser = parse_background)]
    pub background: Option<BackgroundColor>,

    /// Layout: single, 2x2 or 4x2
    #[arg(long, value_name = "MODE", value_parser = parse_layout)]
    pub layout: Option<LayoutMode>,

    /// Subject zoom (0.5 - 2.0)
    #[arg(long, value_name = "FLOAT")]
    pub zoom: Option<f32>,

    /// Vertical offset in pixels, positive moves the subject down (-300 - 300)
    #[arg(long, value_name = "PX", allow_hyphen_values = true)]
    pub offset: Option<i32>,

    /// Subject brightness (0.5 - 1.5)
    #[arg(long, value_name = "FLOAT")]
    pub brightness: Option<f32>,

    /// Subject contrast (0.5 - 1.5)
    #[arg(long, value_name = "FLOAT")]
    pub contrast: Option<f32>,

    /// Edge feathering radius in pixels (0 - 5)
    #[arg(long, value_name = "PX")]
    pub feather: Option<f32>,

    /// Gray-world automatic white balance
    #[arg(long)]
    pub auto_wb: bool,

    /// Colour temperature, negative is cooler (-100 - 100)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub temperature: Option<i32>,

    /// Ask the server for alpha matting (default thresholds)
    #[arg(long)]
    pub alpha_matting: bool,

    /// JPEG quality (1 - 100)
    #[arg(long, value_name = "N")]
    pub quality: Option<u8>,

    /// Write PNG instead of JPEG
    #[arg(long, conflicts_with = "pdf")]
    pub png: bool,

    /// Write a print-ready PDF
    #[arg(long)]
    pub pdf: bool,

    /// Also write the render report as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

fn parse_background(s: &str) -> Result<BackgroundColor, String> {
    BackgroundColor::from_keyword(s).ok_or_else(|| format!("unknown colour '{s}' (white, blue, pink)"))
}

fn parse_layout(s: &str) -> Result<LayoutMode, String> {
    LayoutMode::from_keyword(s).ok_or_else(|| format!("unknown layout '{s}' (single, 2x2, 4x2)"))
}

/// What to write and where.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputKind {
    Image(OutputFormat),
    Pdf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub kind: OutputKind,
}

impl Cli {
    /// Layer command-line flags over `config`.
    pub fn apply_overrides(&self, mut config: PhotoConfig) -> PhotoConfig {
        if let Some(background) = self.background {
            config.background_color = background;
        }
        if let Some(layout) = self.layout {
            config.layout_mode = layout;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if let Some(offset) = self.offset {
            config.vertical_offset = offset;
        }
        if let Some(brightness) = self.brightness {
            config.brightness = brightness;
        }
        if let Some(contrast) = self.contrast {
            config.contrast = contrast;
        }
        if let Some(feather) = self.feather {
            config.feather_radius = feather;
        }
        if self.auto_wb {
            config.auto_white_balance = true;
        }
        if let Some(temperature) = self.temperature {
            config.color_temperature = temperature;
        }
        if let Some(quality) = self.quality {
            config.jpeg_quality = quality;
        }
        if self.alpha_matting && config.matting.is_none() {
            config.matting = Some(MattingParams::default());
        }
        config
    }

    /// Decide the output file and encoding.
    ///
    /// `--pdf` and `--png` win; otherwise an explicit `--output` extension is
    /// honoured, falling back to JPEG.
    pub fn output_target(&self, config: &PhotoConfig) -> OutputTarget {
        let jpeg = config.output_format();
        let kind = if self.pdf {
            OutputKind::Pdf
        } else if self.png {
            OutputKind::Image(OutputFormat::Png)
        } else {
            match self.output.as_deref().and_then(extension_of) {
                Some(ext) if ext.eq_ignore_ascii_case("pdf") => OutputKind::Pdf,
                Some(ext) => OutputKind::Image(
                    OutputFormat::from_extension(&ext, config.jpeg_quality).unwrap_or(jpeg),
                ),
                None => OutputKind::Image(jpeg),
            }
        };

        let path = match &self.output {
            Some(path) => path.clone(),
            None => {
                let ext = match &kind {
                    OutputKind::Pdf => "pdf",
                    OutputKind::Image(format) => format.extension(),
                };
                sibling_dir(&self.input).join(format!("{DEFAULT_OUTPUT_STEM}.{ext}"))
            }
        };

        OutputTarget { path, kind }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().into_owned())
}

fn sibling_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
