// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// passwerk-image: everything Passwerk does to pixels.
//
// Decoding and orientation, colour correction, foreground post-processing,
// compositing onto the 600x800 canvas, print-sheet layout, and output
// encoding (JPEG, PNG, print PDF). `pipeline` chains the stages around an
// external segmentation engine.

pub mod color;
pub mod compose;
pub mod encode;
pub mod layout;
pub mod matte;
pub mod normalize;
pub mod pdf;
pub mod pipeline;

// Re-export the primary structs so callers can use `passwerk_image::PhotoPipeline` etc.
pub use compose::{CanonicalPhoto, Composite, Placement};
pub use layout::{GridPlan, PrintSheet};
pub use matte::Foreground;
pub use pdf::PrintPdfWriter;
pub use pipeline::{PhotoPipeline, Rendered};
