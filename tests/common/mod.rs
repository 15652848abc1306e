// SPDX-License-Identifier: GPL-3.0-only

//! Shared test doubles for pipeline integration tests

use idscan::ScanSubscriber;
use idscan::backends::camera::{CameraFrame, CaptureFormat, FrameSource, FrameStream, SourceFactory};
use idscan::errors::{DeviceError, OcrError, ReadError};
use idscan::ocr::{Candidate, TextRecognizer};
use image::GrayImage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

pub const FRAME_WIDTH: u32 = 32;
pub const FRAME_HEIGHT: u32 = 24;

/// Counters shared between a mock factory and the test body
#[derive(Default)]
pub struct CameraStats {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub reads: AtomicUsize,
}

struct MockSource {
    stats: Arc<CameraStats>,
    closed: bool,
}

struct MockStream {
    stats: Arc<CameraStats>,
}

impl FrameSource for MockSource {
    fn configure(&mut self, request: &CaptureFormat) -> Result<CaptureFormat, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        Ok(CaptureFormat::new(FRAME_WIDTH, FRAME_HEIGHT, request.fps))
    }

    fn stream(&mut self) -> Result<Box<dyn FrameStream + '_>, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        Ok(Box::new(MockStream {
            stats: Arc::clone(&self.stats),
        }))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl FrameStream for MockStream {
    fn read(&mut self) -> Result<CameraFrame, ReadError> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        let data = vec![128u8; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize];
        CameraFrame::from_rgb(FRAME_WIDTH, FRAME_HEIGHT, data)
            .ok_or_else(|| ReadError::BadFrame("mock frame".into()))
    }
}

/// Factory producing mock cameras, counting opens/closes/reads
pub fn mock_factory(stats: Arc<CameraStats>) -> SourceFactory {
    Arc::new(move || {
        stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSource {
            stats: Arc::clone(&stats),
            closed: false,
        }) as Box<dyn FrameSource>)
    })
}

/// Factory whose open always fails
pub fn failing_factory() -> SourceFactory {
    Arc::new(|| Err(DeviceError::OpenFailed("mock device unavailable".into())))
}

/// Recognizer that replays a script of results, then returns empty
/// result sets
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<Result<Vec<Candidate>, OcrError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<Result<Vec<Candidate>, OcrError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Recognizer that never finds anything
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<Vec<Candidate>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A candidate that passes the acceptance filter
pub fn good_candidate(text: &str) -> Candidate {
    Candidate {
        polygon: Candidate::rect_polygon(4.0, 4.0, 20.0, 8.0),
        text: text.to_string(),
        confidence: 0.9,
    }
}

/// Simplified event record kept by [`RecordingSubscriber`]
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Found(String),
    Failed,
    FrameUpdate(Vec<u8>),
}

/// Subscriber that records every delivery and wakes waiting tests
#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<Recorded>>,
    notify: Condvar,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, event: Recorded) {
        let mut events = self.events.lock().expect("events lock");
        events.push(event);
        self.notify.notify_all();
    }

    pub fn snapshot(&self) -> Vec<Recorded> {
        self.events.lock().expect("events lock").clone()
    }

    /// Outcome events only (Found/Failed), preview updates filtered out
    pub fn outcomes(&self) -> Vec<Recorded> {
        self.snapshot()
            .into_iter()
            .filter(|event| !matches!(event, Recorded::FrameUpdate(_)))
            .collect()
    }

    /// Block until the recorded events satisfy `predicate` or the
    /// timeout expires. Returns whether the predicate held.
    pub fn wait_until<F>(&self, timeout: Duration, predicate: F) -> bool
    where
        F: Fn(&[Recorded]) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock().expect("events lock");
        loop {
            if predicate(&events) {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .notify
                .wait_timeout(events, remaining)
                .expect("events lock");
            events = guard;
        }
    }
}

impl ScanSubscriber for RecordingSubscriber {
    fn on_found(&self, identifier: &str) {
        self.push(Recorded::Found(identifier.to_string()));
    }

    fn on_failed(&self) {
        self.push(Recorded::Failed);
    }

    fn on_frame_update(&self, jpeg: &[u8]) {
        self.push(Recorded::FrameUpdate(jpeg.to_vec()));
    }
}
