// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the synchronous photo stages: post-processing,
// compositing and print-sheet layout on synthetic cutouts.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use passwerk_core::{BackgroundColor, LayoutMode, PhotoConfig};
use passwerk_image::{CanonicalPhoto, Foreground, compose, layout};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 900x1200 cutout with an opaque head-and-shoulders ellipse standing on
/// the bottom edge, roughly what a portrait at the default resolution cap
/// produces.
fn portrait_cutout() -> RgbaImage {
    let (w, h) = (900u32, 1200u32);
    let (cx, cy) = (w as f32 / 2.0, h as f32 * 0.75);
    let (rx, ry) = (w as f32 * 0.35, h as f32 * 0.55);
    RgbaImage::from_fn(w, h, |x, y| {
        let dx = (x as f32 - cx) / rx;
        let dy = (y as f32 - cy) / ry;
        let alpha = if dx * dx + dy * dy <= 1.0 { 255 } else { 0 };
        Rgba([190, 140, 115, alpha])
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_post_process(c: &mut Criterion) {
    let cutout = portrait_cutout();
    let config = PhotoConfig {
        brightness: 1.1,
        contrast: 1.2,
        feather_radius: 2.0,
        ..PhotoConfig::default()
    };

    c.bench_function("post_process (900x1200, feather 2)", |b| {
        b.iter(|| {
            let fg = Foreground::new(black_box(cutout.clone()));
            black_box(fg.post_process(&config).unwrap());
        });
    });
}

fn bench_compose(c: &mut Criterion) {
    let subject = Foreground::new(portrait_cutout()).crop_to_subject().unwrap();
    let config = PhotoConfig {
        background_color: BackgroundColor::Blue,
        zoom: 1.2,
        ..PhotoConfig::default()
    };

    c.bench_function("compose (zoom 1.2)", |b| {
        b.iter(|| black_box(compose::compose(black_box(&subject), &config).unwrap()));
    });
}

fn bench_render_sheet(c: &mut Criterion) {
    let photo = CanonicalPhoto::blank(BackgroundColor::Pink);

    c.bench_function("render_sheet (4x2)", |b| {
        b.iter(|| black_box(layout::render_sheet(black_box(&photo), LayoutMode::Grid4x2)));
    });
}

criterion_group!(benches, bench_post_process, bench_compose, bench_render_sheet);
criterion_main!(benches);
