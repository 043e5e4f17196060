// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine-agnostic segmentation interface.
//
// Passwerk does not implement matting itself. Any engine that turns encoded
// photo bytes into an RGBA foreground (alpha = subject confidence) can be
// plugged in behind this trait.

use std::future::Future;

use image::RgbaImage;
use passwerk_core::MattingParams;
use passwerk_core::error::Result;

/// Extracts the subject from a photo.
///
/// On success the returned bitmap has the same pixel dimensions as the
/// submitted image, alpha ~0 for background, ~255 for subject and
/// intermediate values at soft edges. Engines must report failure rather
/// than return a degraded result.
pub trait Segmenter: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Segment the encoded image. `params` is forwarded to the engine as-is.
    fn segment(
        &self,
        image: &[u8],
        params: Option<&MattingParams>,
    ) -> impl Future<Output = Result<RgbaImage>> + Send;
}

/// Synchronous in-process engines (and test doubles) can be plain closures.
impl<F> Segmenter for F
where
    F: Fn(&[u8], Option<&MattingParams>) -> Result<RgbaImage> + Send + Sync,
{
    fn name(&self) -> &str {
        "in-process"
    }

    fn segment(
        &self,
        image: &[u8],
        params: Option<&MattingParams>,
    ) -> impl Future<Output = Result<RgbaImage>> + Send {
        std::future::ready(self(image, params))
    }
}
