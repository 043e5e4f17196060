// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Passwerk.

use std::time::Duration;

use thiserror::Error;

use crate::types::Stage;

/// Top-level error type for all Passwerk operations.
#[derive(Debug, Error)]
pub enum PasswerkError {
    // -- Input --
    #[error("could not decode input photo: {0}")]
    InputDecode(String),

    // -- Segmentation engine --
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    #[error("segmentation timed out after {}s", .0.as_secs_f32())]
    SegmentationTimeout(Duration),

    #[error("segmentation cancelled")]
    SegmentationCancelled,

    // -- Compositing --
    #[error("no foreground subject: {0}")]
    EmptyForeground(String),

    // -- Output --
    #[error("output encoding failed: {0}")]
    Encoding(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PasswerkError>;

/// A failure tagged with the pipeline stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: PasswerkError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: PasswerkError) -> Self {
        Self { stage, source }
    }
}

/// Attach a [`Stage`] to a stage result.
pub trait StageContext<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, PipelineError>;
}

impl<T> StageContext<T> for Result<T> {
    fn at_stage(self, stage: Stage) -> std::result::Result<T, PipelineError> {
        self.map_err(|source| PipelineError::new(stage, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_names_the_stage() {
        let err: std::result::Result<(), _> =
            Err::<(), _>(PasswerkError::EmptyForeground("all pixels transparent".into()))
                .at_stage(Stage::PostProcess);
        let err = err.unwrap_err();
        assert_eq!(err.stage, Stage::PostProcess);
        assert_eq!(
            err.to_string(),
            "post-process stage failed: no foreground subject: all pixels transparent"
        );
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let err = PasswerkError::SegmentationTimeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "segmentation timed out after 1.5s");
    }
}
