// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render one photo file to disk.
//
// The artifact is written to a temporary file beside the destination and
// renamed into place, so a failed or cancelled run never leaves a partial
// output behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use passwerk_core::RenderReport;
use passwerk_core::error::{PasswerkError, PipelineError, Result};
use passwerk_core::human_errors::{HumanError, humanize_error, humanize_pipeline_error};
use passwerk_image::{PhotoPipeline, PrintPdfWriter};
use passwerk_segment::{CancelToken, Segmenter};
use thiserror::Error;
use tracing::{info, instrument};

use crate::cli::{OutputKind, OutputTarget};

/// Why a render did not produce a file. Reading the input and writing the
/// artifact happen outside the photo pipeline and are reported on their own.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: PasswerkError },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: PasswerkError },
}

impl RenderError {
    pub fn humanize(&self) -> HumanError {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => humanize_error(source),
            Self::Pipeline(err) => humanize_pipeline_error(err),
        }
    }
}

/// Read `input`, run the pipeline and write the artifact to `target`.
#[instrument(skip(pipeline, cancel, target), fields(output = %target.path.display()))]
pub async fn render_file<S: Segmenter>(
    pipeline: &PhotoPipeline<S>,
    input: &Path,
    target: &OutputTarget,
    cancel: &CancelToken,
) -> std::result::Result<RenderReport, RenderError> {
    let data = std::fs::read(input).map_err(|e| RenderError::Read {
        path: input.to_path_buf(),
        source: e.into(),
    })?;

    let rendered = pipeline.run(&data, cancel).await?;
    let bytes = match &target.kind {
        OutputKind::Image(format) => rendered.encode(*format)?,
        OutputKind::Pdf => {
            let mut writer = PrintPdfWriter::default();
            writer.set_title("Passwerk ID Photo");
            rendered.to_pdf(&writer)?
        }
    };

    write_atomically(&target.path, &bytes).map_err(|source| RenderError::Write {
        path: target.path.clone(),
        source,
    })?;
    info!(bytes = bytes.len(), "artifact written");
    Ok(rendered.report)
}

/// Write `report` as pretty JSON.
pub fn write_report(path: &Path, report: &RenderReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    write_atomically(path, json.as_bytes())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(&dir)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|e| PasswerkError::Io(e.error))?;
    Ok(())
}
