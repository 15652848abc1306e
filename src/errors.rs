// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanning pipeline

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Main pipeline error type
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Device-related errors (open, configure)
    Device(DeviceError),
    /// Configuration validation errors
    Config(ConfigError),
    /// Recognition engine errors
    Ocr(OcrError),
    /// Generic error with message
    Other(String),
}

/// Device errors. These are fatal to the `start()` attempt that raised them:
/// the pipeline stays `Idle` and no loops are launched.
#[derive(Debug, Clone)]
pub enum DeviceError {
    /// No capture devices found
    NoDeviceFound,
    /// Device could not be opened
    OpenFailed(String),
    /// Device rejected the requested capture format
    ConfigureFailed(String),
    /// Device produces a pixel format the pipeline cannot consume
    UnsupportedFormat(String),
    /// Operation on a handle that was already closed
    Closed,
}

/// Transient frame-read errors. Logged and skipped; the capture loop
/// continues after a short backoff.
#[derive(Debug, Clone)]
pub enum ReadError {
    /// I/O error while dequeuing a frame
    Io(String),
    /// Frame arrived with an unexpected size or layout
    BadFrame(String),
}

/// Recognition engine errors. Treated as a failed cycle, never fatal
/// to the worker.
#[derive(Debug, Clone)]
pub enum OcrError {
    /// Engine binary or model is not available on this system
    EngineUnavailable(String),
    /// Engine invocation failed (spawn, I/O, non-zero exit)
    InvocationFailed(String),
    /// Engine produced output the adapter could not parse
    MalformedOutput(String),
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// target_fps must be positive
    InvalidFps(f64),
    /// resize_factor must be in (0, 1]
    InvalidResizeFactor(f32),
    /// frame_skip_rate must be at least 1
    InvalidSkipRate(u32),
    /// encode_quality must be at most 100
    InvalidQuality(u8),
    /// confidence_threshold must be in [0, 1]
    InvalidThreshold(f32),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Device(e) => write!(f, "Device error: {}", e),
            ScanError::Config(e) => write!(f, "Configuration error: {}", e),
            ScanError::Ocr(e) => write!(f, "Recognition error: {}", e),
            ScanError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoDeviceFound => write!(f, "No capture devices found"),
            DeviceError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            DeviceError::ConfigureFailed(msg) => write!(f, "Failed to configure device: {}", msg),
            DeviceError::UnsupportedFormat(msg) => write!(f, "Unsupported pixel format: {}", msg),
            DeviceError::Closed => write!(f, "Device handle is closed"),
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(msg) => write!(f, "Frame read failed: {}", msg),
            ReadError::BadFrame(msg) => write!(f, "Bad frame: {}", msg),
        }
    }
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrError::EngineUnavailable(msg) => write!(f, "Engine unavailable: {}", msg),
            OcrError::InvocationFailed(msg) => write!(f, "Engine invocation failed: {}", msg),
            OcrError::MalformedOutput(msg) => write!(f, "Malformed engine output: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFps(v) => write!(f, "target_fps must be positive (got {})", v),
            ConfigError::InvalidResizeFactor(v) => {
                write!(f, "resize_factor must be in (0, 1] (got {})", v)
            }
            ConfigError::InvalidSkipRate(v) => {
                write!(f, "frame_skip_rate must be at least 1 (got {})", v)
            }
            ConfigError::InvalidQuality(v) => {
                write!(f, "encode_quality must be at most 100 (got {})", v)
            }
            ConfigError::InvalidThreshold(v) => {
                write!(f, "confidence_threshold must be in [0, 1] (got {})", v)
            }
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for ReadError {}
impl std::error::Error for OcrError {}
impl std::error::Error for ConfigError {}

// Conversions from sub-errors to ScanError
impl From<DeviceError> for ScanError {
    fn from(err: DeviceError) -> Self {
        ScanError::Device(err)
    }
}

impl From<ConfigError> for ScanError {
    fn from(err: ConfigError) -> Self {
        ScanError::Config(err)
    }
}

impl From<OcrError> for ScanError {
    fn from(err: OcrError) -> Self {
        ScanError::Ocr(err)
    }
}

impl From<String> for ScanError {
    fn from(msg: String) -> Self {
        ScanError::Other(msg)
    }
}

impl From<&str> for ScanError {
    fn from(msg: &str) -> Self {
        ScanError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        ReadError::Io(err.to_string())
    }
}
