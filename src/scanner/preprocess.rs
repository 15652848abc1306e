// SPDX-License-Identifier: GPL-3.0-only

//! Frame preprocessing for recognition
//!
//! Two stages live here. Downscaling runs on the capture side, before a
//! frame enters the recognition queue, so queued frames are already cheap
//! to hold. The enhancement chain (grayscale, median denoise, histogram
//! equalization) runs on the worker side right before the engine call;
//! it lifts the engine's confidence distribution enough to justify the
//! relaxed default acceptance threshold.

use crate::backends::camera::CameraFrame;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::median_filter;
use tracing::trace;

/// Radius of the median denoise window (1 = 3x3)
const MEDIAN_RADIUS: u32 = 1;

/// Downscale a captured frame by `factor` (in (0, 1]) for recognition.
///
/// Returns the scaled image together with the factor actually applied, so
/// the worker can map candidate geometry back to full-frame coordinates.
/// A factor of 1.0 is a plain copy.
pub fn downscale(frame: &CameraFrame, factor: f32) -> Option<(RgbImage, f32)> {
    let image = frame.to_rgb_image()?;

    if (factor - 1.0).abs() < f32::EPSILON {
        return Some((image, 1.0));
    }

    let width = ((frame.width as f32 * factor).round() as u32).max(1);
    let height = ((frame.height as f32 * factor).round() as u32).max(1);
    trace!(width, height, factor = factor as f64, "Downscaling frame for recognition");

    let scaled = imageops::resize(&image, width, height, FilterType::Triangle);
    Some((scaled, factor))
}

/// Run the enhancement chain the recognition engine sees:
/// grayscale -> 3x3 median denoise -> histogram equalization.
pub fn enhance(image: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(image);
    let denoised = median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    equalize_histogram(&denoised)
}
