// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera sources

use image::RgbImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// A single frame from the camera.
///
/// Pixel data is tightly packed RGB24 (3 bytes per pixel, no stride
/// padding). Frames move by value between pipeline stages; the `Arc`
/// exists so the preview path and the annotation path can share a
/// read-only view without copying the pixels.
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGB24 pixel data, `width * height * 3` bytes
    pub data: Arc<[u8]>,
    /// Timestamp when the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CameraFrame({}x{}, {} bytes)",
            self.width,
            self.height,
            self.data.len()
        )
    }
}

impl CameraFrame {
    /// Build a frame from raw RGB24 bytes.
    ///
    /// Returns `None` if the byte count does not match the dimensions.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            captured_at: Instant::now(),
        })
    }

    /// View the frame as an `image` crate RGB buffer.
    ///
    /// Copies the pixels; returns `None` if the stored byte count is
    /// inconsistent with the dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}

/// Capture format requested from (or negotiated with) a device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl CaptureFormat {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }
}

impl std::fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} @ {}fps", self.width, self.height, self.fps)
    }
}

/// Device information from V4L2 capability queries
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceInfo {
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(CameraFrame::from_rgb(2, 2, vec![0u8; 12]).is_some());
        assert!(CameraFrame::from_rgb(2, 2, vec![0u8; 11]).is_none());
    }

    #[test]
    fn test_to_rgb_image_dimensions() {
        let frame = CameraFrame::from_rgb(4, 3, vec![7u8; 36]).expect("valid frame");
        let img = frame.to_rgb_image().expect("image");
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(0, 0).0, [7, 7, 7]);
    }
}
