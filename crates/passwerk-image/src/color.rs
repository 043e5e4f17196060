// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour correction on the full photo, before segmentation: gray-world auto
// white balance followed by a manual warm/cool temperature bias.

use image::{Rgb, RgbImage};
use passwerk_core::PhotoConfig;
use tracing::{debug, info, instrument};

/// Apply the colour corrections enabled in `config`, in canonical order
/// (white balance, then temperature).
#[instrument(skip(image, config), fields(
    width = image.width(),
    height = image.height(),
    auto_white_balance = config.auto_white_balance,
    color_temperature = config.color_temperature,
))]
pub fn correct(image: RgbImage, config: &PhotoConfig) -> RgbImage {
    let balanced = if config.auto_white_balance {
        auto_white_balance(image)
    } else {
        image
    };
    apply_temperature(balanced, config.color_temperature)
}

/// Per-channel gains that make the channel means equal to their average.
///
/// A channel whose mean is zero keeps a gain of 1.
pub fn gray_world_gains(image: &RgbImage) -> [f64; 3] {
    let pixel_count = image.width() as u64 * image.height() as u64;
    if pixel_count == 0 {
        return [1.0; 3];
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, &value) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += value as u64;
        }
    }

    let means = sums.map(|sum| sum as f64 / pixel_count as f64);
    let target = (means[0] + means[1] + means[2]) / 3.0;
    means.map(|mean| if mean > 0.0 { target / mean } else { 1.0 })
}

/// Gray-world automatic white balance.
pub fn auto_white_balance(image: RgbImage) -> RgbImage {
    let gains = gray_world_gains(&image);
    info!(
        r_gain = gains[0],
        g_gain = gains[1],
        b_gain = gains[2],
        "Applying gray-world white balance"
    );
    if gains == [1.0; 3] {
        return image;
    }
    apply_gains(image, gains)
}

/// Shift colour temperature by `temperature` in [-100, 100].
///
/// Red is scaled by `1 + t/200` and blue by `1 - t/200`; green is untouched.
/// Positive values warm the photo, negative values cool it.
pub fn apply_temperature(image: RgbImage, temperature: i32) -> RgbImage {
    let t = temperature.clamp(-100, 100);
    if t == 0 {
        return image;
    }
    let bias = t as f64 / 200.0;
    debug!(temperature = t, "Applying colour temperature bias");
    apply_gains(image, [1.0 + bias, 1.0, 1.0 - bias])
}

fn apply_gains(mut image: RgbImage, gains: [f64; 3]) -> RgbImage {
    for pixel in image.pixels_mut() {
        let Rgb([r, g, b]) = *pixel;
        *pixel = Rgb([
            scale_channel(r, gains[0]),
            scale_channel(g, gains[1]),
            scale_channel(b, gains[2]),
        ]);
    }
    image
}

#[inline]
fn scale_channel(value: u8, gain: f64) -> u8 {
    (value as f64 * gain).round().clamp(0.0, 255.0) as u8
}
