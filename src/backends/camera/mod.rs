// SPDX-License-Identifier: GPL-3.0-only

//! Camera source abstraction
//!
//! The pipeline consumes the imaging device through two narrow traits:
//! [`FrameSource`] owns the device handle (configure, close) and
//! [`FrameStream`] delivers frames while a capture session is active.
//! The stream borrows the source exclusively, so the handle has a single
//! owner for its whole life — the capture thread.
//!
//! Opening a device is a [`SourceFactory`] call. The pipeline invokes the
//! factory exactly once per `start()`, on the caller's thread, so an
//! open failure surfaces synchronously to the `start()` caller.

pub mod types;
pub mod v4l2;

pub use types::{CameraFrame, CaptureFormat, DeviceInfo};
pub use v4l2::{V4l2Source, enumerate_devices};

use crate::errors::{DeviceError, ReadError};
use std::sync::Arc;

/// An opened imaging device
pub trait FrameSource: Send {
    /// Negotiate a capture format. Returns the format the device actually
    /// selected, which may differ from the request.
    fn configure(&mut self, request: &CaptureFormat) -> Result<CaptureFormat, DeviceError>;

    /// Begin a capture session. The returned stream borrows the source
    /// exclusively until dropped.
    fn stream(&mut self) -> Result<Box<dyn FrameStream + '_>, DeviceError>;

    /// Release the device. Further calls on the handle fail with
    /// [`DeviceError::Closed`].
    fn close(&mut self);
}

/// An active capture session on an opened device
pub trait FrameStream {
    /// Read the next frame, best-effort. Errors are transient: the caller
    /// logs them and retries on its next tick.
    fn read(&mut self) -> Result<CameraFrame, ReadError>;
}

/// Opens a fresh device handle. Called once per pipeline start; each call
/// is a new acquisition.
pub type SourceFactory = Arc<dyn Fn() -> Result<Box<dyn FrameSource>, DeviceError> + Send + Sync>;

/// Factory for a V4L2 device at the given path
pub fn v4l2_factory(path: impl Into<String>) -> SourceFactory {
    let path = path.into();
    Arc::new(move || {
        let source = V4l2Source::open(&path)?;
        Ok(Box::new(source) as Box<dyn FrameSource>)
    })
}
