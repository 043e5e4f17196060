// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end identity photo pipeline.
//
//   normalize -> color-correct -> segment -> post-process -> composite -> layout
//
// Everything but segmentation is synchronous and CPU-bound; inside `run` those
// halves execute on tokio's blocking pool. Each failure carries the stage it
// happened in.

use image::{RgbImage, RgbaImage};
use passwerk_core::error::{PasswerkError, PipelineError, StageContext};
use passwerk_core::{OutputFormat, PhotoConfig, PixelRect, RenderReport, RequestId, Stage};
use passwerk_segment::{CancelToken, SegmentationClient, Segmenter};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::color;
use crate::compose::{self, CanonicalPhoto, Placement};
use crate::encode;
use crate::layout;
use crate::matte::Foreground;
use crate::normalize;
use crate::pdf::PrintPdfWriter;

/// Output of the synchronous front half: the corrected photo and the PNG
/// handed to the segmentation engine.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub image: RgbImage,
    pub png: Vec<u8>,
}

/// Output of the synchronous back half.
#[derive(Debug, Clone)]
pub struct Finished {
    pub photo: CanonicalPhoto,
    /// The photo itself, or the print sheet for grid layouts.
    pub artifact: RgbImage,
    pub subject_box: PixelRect,
    pub placement: Placement,
}

/// A completed request.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The 600x800 identity photo.
    pub photo: CanonicalPhoto,
    /// What gets written out: the photo, or a 1800x1200 sheet.
    pub artifact: RgbImage,
    pub report: RenderReport,
}

impl Rendered {
    /// Serialize the artifact.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, PipelineError> {
        encode::encode(&self.artifact, format).at_stage(Stage::Encode)
    }

    /// Wrap the artifact in a single-page print PDF.
    pub fn to_pdf(&self, writer: &PrintPdfWriter) -> Result<Vec<u8>, PipelineError> {
        writer.create_from_rgb(&self.artifact).at_stage(Stage::Encode)
    }
}

/// Turns one uploaded photo into a finished identity photo or print sheet.
pub struct PhotoPipeline<S> {
    config: PhotoConfig,
    client: SegmentationClient<S>,
}

impl<S: Segmenter> PhotoPipeline<S> {
    /// Out-of-range settings in `config` are clamped before use.
    pub fn new(config: &PhotoConfig, client: SegmentationClient<S>) -> Self {
        Self {
            config: config.sanitized(),
            client,
        }
    }

    /// The effective (sanitized) configuration.
    pub fn config(&self) -> &PhotoConfig {
        &self.config
    }

    /// Decode, orient, downscale and colour-correct, then encode for the
    /// segmentation engine.
    pub fn prepare(&self, data: &[u8]) -> Result<Prepared, PipelineError> {
        prepare_photo(&self.config, data)
    }

    /// Post-process the engine's cutout, composite it and lay it out.
    pub fn finish(&self, cutout: RgbaImage) -> Result<Finished, PipelineError> {
        finish_photo(&self.config, cutout)
    }

    /// Run the whole chain on `data`. `cancel` aborts an in-flight
    /// segmentation call.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty, bytes = data.len()))]
    pub async fn run(&self, data: &[u8], cancel: &CancelToken) -> Result<Rendered, PipelineError> {
        let request_id = RequestId::new();
        tracing::Span::current().record("request_id", tracing::field::display(&request_id));
        let input_hash = hex::encode(Sha256::digest(data));

        let config = self.config.clone();
        let owned = data.to_vec();
        let prepared = off_runtime(Stage::Normalize, move || prepare_photo(&config, &owned)).await?;
        let normalized_size = prepared.image.dimensions();

        let cutout = self
            .client
            .segment(&prepared.png, normalized_size, self.config.matting.as_ref(), cancel)
            .await
            .at_stage(Stage::Segment)?;

        let config = self.config.clone();
        let finished = off_runtime(Stage::PostProcess, move || finish_photo(&config, cutout)).await?;

        let report = RenderReport {
            request_id,
            input_hash,
            normalized_size,
            subject_box: finished.subject_box,
            placement: finished.placement.rect,
            layout: self.config.layout_mode,
            rendered_at: chrono::Utc::now(),
        };
        info!(
            layout = ?report.layout,
            width = finished.artifact.width(),
            height = finished.artifact.height(),
            "Photo rendered"
        );

        Ok(Rendered {
            photo: finished.photo,
            artifact: finished.artifact,
            report,
        })
    }
}

fn prepare_photo(config: &PhotoConfig, data: &[u8]) -> Result<Prepared, PipelineError> {
    let image = normalize::normalize(data, config.resolution_cap).at_stage(Stage::Normalize)?;
    let image = color::correct(image, config);
    let png = encode::to_png_bytes(&image).at_stage(Stage::Segment)?;
    Ok(Prepared { image, png })
}

fn finish_photo(config: &PhotoConfig, cutout: RgbaImage) -> Result<Finished, PipelineError> {
    let softened = Foreground::new(cutout).soften(config);
    let bounds = softened.subject_bounds();
    let subject = softened.crop_to_subject().at_stage(Stage::PostProcess)?;
    let subject_box = bounds.unwrap_or_else(|| PixelRect::new(0, 0, subject.width(), subject.height()));

    let composite = compose::compose(&subject, config).at_stage(Stage::Composite)?;
    let artifact = layout::arrange(composite.photo.clone(), config.layout_mode);

    Ok(Finished {
        photo: composite.photo,
        artifact,
        subject_box,
        placement: composite.placement,
    })
}

/// Run CPU-bound work on the blocking pool so it does not stall the
/// runtime's worker threads. Panics propagate to the caller.
async fn off_runtime<T, F>(stage: Stage, work: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        // Only happens while the runtime is shutting down.
        Err(_) => Err(PipelineError::new(stage, PasswerkError::SegmentationCancelled)),
    }
}
