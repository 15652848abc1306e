// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera source
//!
//! Negotiates RGB24 directly where the driver offers it and falls back to
//! YUYV with a CPU conversion otherwise. Uses memory-mapped streaming I/O;
//! the stream borrows the device handle, keeping it single-owner.

use super::types::{CameraFrame, CaptureFormat, DeviceInfo};
use super::{FrameSource, FrameStream};
use crate::errors::{DeviceError, ReadError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::video::capture::Parameters;
use v4l::{Device, Format, FourCC};

fn fourcc_rgb3() -> FourCC {
    FourCC::new(b"RGB3")
}

fn fourcc_yuyv() -> FourCC {
    FourCC::new(b"YUYV")
}

/// Number of mmap buffers for the capture stream
const STREAM_BUFFERS: u32 = 4;

/// An opened V4L2 capture device
pub struct V4l2Source {
    dev: Option<Device>,
    info: DeviceInfo,
    /// Negotiated format, set by `configure`
    negotiated: Option<Format>,
}

impl V4l2Source {
    /// Open the device at the given path (e.g. `/dev/video0`)
    pub fn open(path: &str) -> Result<Self, DeviceError> {
        let dev =
            Device::with_path(path).map_err(|e| DeviceError::OpenFailed(e.to_string()))?;

        let info = match dev.query_caps() {
            Ok(caps) => DeviceInfo {
                path: path.to_string(),
                card: caps.card,
                driver: caps.driver,
            },
            Err(e) => {
                debug!(path, error = %e, "Capability query failed");
                DeviceInfo {
                    path: path.to_string(),
                    ..Default::default()
                }
            }
        };

        info!(path, card = %info.card, "Opened V4L2 device");

        Ok(Self {
            dev: Some(dev),
            info,
            negotiated: None,
        })
    }

    /// Device information captured at open time
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

impl FrameSource for V4l2Source {
    fn configure(&mut self, request: &CaptureFormat) -> Result<CaptureFormat, DeviceError> {
        let dev = self.dev.as_ref().ok_or(DeviceError::Closed)?;

        // Try RGB24 first, fall back to YUYV with CPU conversion
        let rgb = Format::new(request.width, request.height, fourcc_rgb3());
        let mut actual = dev
            .set_format(&rgb)
            .map_err(|e| DeviceError::ConfigureFailed(e.to_string()))?;

        if actual.fourcc != fourcc_rgb3() {
            let yuyv = Format::new(request.width, request.height, fourcc_yuyv());
            actual = dev
                .set_format(&yuyv)
                .map_err(|e| DeviceError::ConfigureFailed(e.to_string()))?;
            if actual.fourcc != fourcc_yuyv() {
                return Err(DeviceError::UnsupportedFormat(actual.fourcc.to_string()));
            }
        }

        // Frame interval is advisory; many UVC devices pin it to the format
        let fps = request.fps.round().max(1.0) as u32;
        if let Err(e) = dev.set_params(&Parameters::with_fps(fps)) {
            warn!(fps, error = %e, "Device rejected frame interval, keeping its default");
        }

        info!(
            width = actual.width,
            height = actual.height,
            fourcc = %actual.fourcc,
            "V4L2 format configured"
        );

        self.negotiated = Some(actual.clone());
        Ok(CaptureFormat::new(actual.width, actual.height, request.fps))
    }

    fn stream(&mut self) -> Result<Box<dyn FrameStream + '_>, DeviceError> {
        let dev = self.dev.as_ref().ok_or(DeviceError::Closed)?;
        let format = match &self.negotiated {
            Some(f) => f.clone(),
            None => dev
                .format()
                .map_err(|e| DeviceError::ConfigureFailed(e.to_string()))?,
        };

        let stream = MmapStream::with_buffers(dev, Type::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| DeviceError::ConfigureFailed(e.to_string()))?;

        Ok(Box::new(V4l2Stream { stream, format }))
    }

    fn close(&mut self) {
        if self.dev.take().is_some() {
            info!(path = %self.info.path, "Released V4L2 device");
        }
        self.negotiated = None;
    }
}

/// Active mmap capture session
struct V4l2Stream<'a> {
    stream: MmapStream<'a>,
    format: Format,
}

impl FrameStream for V4l2Stream<'_> {
    fn read(&mut self) -> Result<CameraFrame, ReadError> {
        let (buf, meta) = self.stream.next()?;
        let captured_at = Instant::now();

        let used = if meta.bytesused > 0 {
            (meta.bytesused as usize).min(buf.len())
        } else {
            buf.len()
        };
        let buf = &buf[..used];

        let width = self.format.width;
        let height = self.format.height;
        let pixels = (width as usize) * (height as usize);

        let rgb = if self.format.fourcc == fourcc_rgb3() {
            if buf.len() < pixels * 3 {
                return Err(ReadError::BadFrame(format!(
                    "expected {} RGB bytes, got {}",
                    pixels * 3,
                    buf.len()
                )));
            }
            buf[..pixels * 3].to_vec()
        } else if self.format.fourcc == fourcc_yuyv() {
            if buf.len() < pixels * 2 {
                return Err(ReadError::BadFrame(format!(
                    "expected {} YUYV bytes, got {}",
                    pixels * 2,
                    buf.len()
                )));
            }
            yuyv_to_rgb(&buf[..pixels * 2])
        } else {
            return Err(ReadError::BadFrame(format!(
                "unexpected fourcc {}",
                self.format.fourcc
            )));
        };

        Ok(CameraFrame {
            width,
            height,
            data: Arc::from(rgb.into_boxed_slice()),
            captured_at,
        })
    }
}

/// Enumerate V4L2 capture devices on this system.
///
/// Devices that cannot be opened (permissions, in use by another process)
/// are skipped with a debug log.
pub fn enumerate_devices() -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for node in v4l::context::enum_devices() {
        let path = node.path().to_string_lossy().to_string();
        match Device::with_path(node.path()) {
            Ok(dev) => match dev.query_caps() {
                Ok(caps) => devices.push(DeviceInfo {
                    path,
                    card: caps.card,
                    driver: caps.driver,
                }),
                Err(e) => debug!(path = %path, error = %e, "Capability query failed, skipping"),
            },
            Err(e) => debug!(path = %path, error = %e, "Could not open device, skipping"),
        }
    }

    devices
}

/// Convert packed YUYV (YUV 4:2:2) to tightly packed RGB24.
///
/// YUYV layout: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for the YUV to RGB conversion.
fn yuyv_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 2 * 3);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
            rgb.push(r);
            rgb.push(g);
            rgb.push(b);
        }
    }

    rgb
}
