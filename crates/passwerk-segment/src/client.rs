// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded, cancellable segmentation calls.
//
// Every engine call is raced against a deadline and the request's cancel
// token. Whichever loses is dropped, which for the HTTP engine also aborts the
// in-flight request. The engine's output is checked against the submitted
// image before anyone downstream sees it.

use std::time::{Duration, Instant};

use image::RgbaImage;
use passwerk_core::MattingParams;
use passwerk_core::error::{PasswerkError, Result};
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::traits::Segmenter;

/// Time allowed for a single engine call unless overridden.
pub const DEFAULT_SEGMENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Drives a [`Segmenter`] with a timeout and cooperative cancellation.
pub struct SegmentationClient<S> {
    segmenter: S,
    timeout: Duration,
}

impl<S: Segmenter> SegmentationClient<S> {
    pub fn new(segmenter: S) -> Self {
        Self {
            segmenter,
            timeout: DEFAULT_SEGMENT_TIMEOUT,
        }
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Segment `image`, whose decoded size is `expected` (width, height).
    ///
    /// Fails with `SegmentationCancelled` if `cancel` fires first (or already
    /// has), `SegmentationTimeout` if the deadline passes, and `Segmentation`
    /// if the engine errors or returns a bitmap of the wrong size.
    #[instrument(skip(self, image, params, cancel), fields(engine = self.segmenter.name(), bytes = image.len()))]
    pub async fn segment(
        &self,
        image: &[u8],
        expected: (u32, u32),
        params: Option<&MattingParams>,
        cancel: &CancelToken,
    ) -> Result<RgbaImage> {
        if cancel.is_cancelled() {
            return Err(PasswerkError::SegmentationCancelled);
        }

        let started = Instant::now();
        let call = tokio::time::timeout(self.timeout, self.segmenter.segment(image, params));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(elapsed_ms = started.elapsed().as_millis() as u64, "Segmentation cancelled");
                return Err(PasswerkError::SegmentationCancelled);
            }
            outcome = call => outcome,
        };

        let foreground = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_s = self.timeout.as_secs_f32(), "Segmentation timed out");
                return Err(PasswerkError::SegmentationTimeout(self.timeout));
            }
        };

        if foreground.dimensions() != expected {
            let (w, h) = foreground.dimensions();
            return Err(PasswerkError::Segmentation(format!(
                "engine returned {w}x{h}, expected dimensions {}x{}",
                expected.0, expected.1
            )));
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            width = expected.0,
            height = expected.1,
            "Segmentation complete"
        );
        debug!(matting = params.is_some(), "Engine parameters");
        Ok(foreground)
    }
}
