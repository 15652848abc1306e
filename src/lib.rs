// SPDX-License-Identifier: GPL-3.0-only

//! idscan - camera scanning pipeline for 9-digit ID card numbers
//!
//! Continuously captures frames from a V4L2 camera, submits a throttled
//! subset to a text-recognition engine, and reports recognized
//! identifiers (or failures) to a subscriber while streaming a JPEG
//! preview.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`scanner`]: The pipeline itself - capture loop, admission policy,
//!   bounded recognition queue, recognition worker, event dispatcher
//! - [`backends`]: Camera device abstraction (V4L2)
//! - [`ocr`]: Text-recognition engine interface and the Tesseract
//!   subprocess adapter
//! - [`config`]: Runtime-tunable pipeline parameters
//! - [`errors`]: Error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use idscan::{ScanConfig, ScanPipeline, ScanSubscriber};
//! use idscan::backends::camera::v4l2_factory;
//! use idscan::ocr::TesseractRecognizer;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ScanSubscriber for Printer {
//!     fn on_found(&self, identifier: &str) {
//!         println!("found {identifier}");
//!     }
//!     fn on_failed(&self) {}
//!     fn on_frame_update(&self, _jpeg: &[u8]) {}
//! }
//!
//! let recognizer = Arc::new(TesseractRecognizer::new()?);
//! let mut pipeline = ScanPipeline::new(
//!     ScanConfig::default(),
//!     v4l2_factory("/dev/video0"),
//!     recognizer,
//!     Arc::new(Printer),
//! )?;
//! pipeline.start()?;
//! // ... scan until done ...
//! pipeline.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod ocr;
pub mod scanner;

// Re-export commonly used types
pub use config::ScanConfig;
pub use errors::{ConfigError, DeviceError, OcrError, ReadError, ScanError};
pub use scanner::{PipelineState, ScanEvent, ScanPipeline, ScanSubscriber};
