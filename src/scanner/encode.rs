// SPDX-License-Identifier: GPL-3.0-only

//! Preview frame encoding

use crate::backends::camera::CameraFrame;
use image::codecs::jpeg::JpegEncoder;
use tracing::trace;

/// Encode a frame as JPEG at the given quality (1-100).
pub fn encode_jpeg(frame: &CameraFrame, quality: u8) -> Result<Vec<u8>, String> {
    let image = frame
        .to_rgb_image()
        .ok_or_else(|| "frame pixel data inconsistent with dimensions".to_string())?;

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode_image(&image)
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;

    trace!(
        width = frame.width,
        height = frame.height,
        bytes = buffer.len(),
        quality,
        "Encoded preview frame"
    );

    Ok(buffer)
}
