// SPDX-License-Identifier: GPL-3.0-only

//! Latest-frame buffer slot
//!
//! Holds the most recently captured frame for the preview and annotation
//! paths. Single most-recent-value semantics, not a queue: storing a new
//! frame drops the previous one. All access goes through a mutex, so a
//! reader never observes a partially written frame.

use crate::backends::camera::CameraFrame;
use std::sync::{Arc, Mutex};

/// Single-slot holder for the most recent frame
#[derive(Default)]
pub struct FrameSlot {
    current: Mutex<Option<Arc<CameraFrame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot's content, dropping any previous frame
    pub fn store(&self, frame: Arc<CameraFrame>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(frame);
        }
    }

    /// Snapshot of the most recent frame, if any
    pub fn latest(&self) -> Option<Arc<CameraFrame>> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32) -> Arc<CameraFrame> {
        let data = vec![0u8; (width * 2 * 3) as usize];
        Arc::new(CameraFrame::from_rgb(width, 2, data).expect("valid frame"))
    }

    #[test]
    fn test_empty_slot() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());
    }

    #[test]
    fn test_store_replaces_previous() {
        let slot = FrameSlot::new();
        slot.store(frame(2));
        slot.store(frame(4));
        let latest = slot.latest().expect("frame present");
        assert_eq!(latest.width, 4);
    }

    #[test]
    fn test_latest_is_a_snapshot() {
        let slot = FrameSlot::new();
        slot.store(frame(2));
        let snapshot = slot.latest().expect("frame present");
        slot.store(frame(4));
        // The earlier snapshot is unaffected by the new store
        assert_eq!(snapshot.width, 2);
    }
}
