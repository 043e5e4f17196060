// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// passwerk-segment: the seam between the photo pipeline and whatever engine
// separates the subject from the background.
//
// The pipeline only ever talks to a `SegmentationClient`, which bounds each
// engine call in time and lets the request owner cancel it. Engines implement
// `Segmenter`; `RembgHttpSegmenter` talks to a rembg server, and plain
// closures work for in-process engines and tests.

pub mod cancel;
pub mod client;
pub mod rembg;
pub mod traits;

pub use cancel::CancelToken;
pub use client::{DEFAULT_SEGMENT_TIMEOUT, SegmentationClient};
pub use rembg::RembgHttpSegmenter;
pub use traits::Segmenter;
