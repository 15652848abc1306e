// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration for the scanning pipeline

use crate::constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_ENCODE_QUALITY, DEFAULT_TARGET_FPS};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Tunable pipeline parameters.
///
/// All fields may be changed while the pipeline is running via
/// [`crate::scanner::ScanPipeline::reconfigure`]; each loop reads the
/// current values at the head of its next iteration, so changes are never
/// retroactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Capture rate the loop paces itself to
    pub target_fps: f64,
    /// Minimum time between two recognition submissions
    pub recognition_interval: Duration,
    /// Submit 1 of every N eligible frames (1 = every frame)
    pub frame_skip_rate: u32,
    /// Downscale factor applied before a frame is queued for recognition,
    /// in (0, 1]
    pub resize_factor: f32,
    /// JPEG quality for preview frames (0-100)
    pub encode_quality: u8,
    /// Minimum engine confidence for accepting a candidate, in [0, 1]
    pub confidence_threshold: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            recognition_interval: Duration::ZERO,
            frame_skip_rate: 1,
            resize_factor: 1.0,
            encode_quality: DEFAULT_ENCODE_QUALITY,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ScanConfig {
    /// Validate all fields, returning the first violation found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_fps > 0.0) {
            return Err(ConfigError::InvalidFps(self.target_fps));
        }
        if !(self.resize_factor > 0.0 && self.resize_factor <= 1.0) {
            return Err(ConfigError::InvalidResizeFactor(self.resize_factor));
        }
        if self.frame_skip_rate == 0 {
            return Err(ConfigError::InvalidSkipRate(self.frame_skip_rate));
        }
        if self.encode_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.encode_quality));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::InvalidThreshold(self.confidence_threshold));
        }
        Ok(())
    }

    /// Per-iteration time budget of the capture loop
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps)
    }
}

/// Shared, runtime-mutable configuration handle.
///
/// Written by [`crate::scanner::ScanPipeline::reconfigure`], read by the
/// capture loop, the recognition worker, and the event dispatcher at the
/// head of each iteration.
pub type SharedConfig = Arc<RwLock<ScanConfig>>;

/// Wrap a validated config for sharing across the pipeline threads
pub fn shared(config: ScanConfig) -> SharedConfig {
    Arc::new(RwLock::new(config))
}
