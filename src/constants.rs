// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default capture rate when none is configured
pub const DEFAULT_TARGET_FPS: f64 = 30.0;

/// Default capture resolution requested from the device.
/// The device may negotiate something else; the pipeline adapts.
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

/// Default JPEG quality for preview frames
pub const DEFAULT_ENCODE_QUALITY: u8 = 80;

/// Default minimum confidence for accepting a recognition candidate.
///
/// This value assumes the preprocessed path (grayscale + median denoise +
/// histogram equalization), which shifts the engine's confidence
/// distribution upward. Without preprocessing, 0.60 is the appropriate
/// floor; see [`NAIVE_CONFIDENCE_THRESHOLD`].
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Confidence floor appropriate when frames reach the engine unprocessed.
/// Kept for callers that disable preprocessing-heavy configurations and
/// want to retune via `ScanConfig::confidence_threshold`.
pub const NAIVE_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Exact number of digits in a valid ID card number
pub const IDENTIFIER_LENGTH: usize = 9;

/// Capacity of the queue between the capture loop and the recognition
/// worker. Two slots: one frame being consumed, one waiting.
pub const RECOGNITION_QUEUE_CAPACITY: usize = 2;

/// How long the recognition worker blocks on the queue before re-checking
/// the stop flag
pub const QUEUE_TAKE_TIMEOUT: Duration = Duration::from_millis(100);

/// Backoff after a transient frame-read failure
pub const READ_BACKOFF: Duration = Duration::from_millis(100);

/// How long `stop()` waits for each loop thread to join before declaring
/// a forced shutdown
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
