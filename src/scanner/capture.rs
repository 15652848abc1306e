// SPDX-License-Identifier: GPL-3.0-only

//! Capture loop
//!
//! Paces itself to the configured frame rate with a fixed per-iteration
//! budget: do the work, then sleep for whatever remains of the frame
//! delay. Each successful read updates the frame slot, consults the
//! admission policy, and submits a preview job; nothing here ever blocks
//! on the recognition worker or the subscriber.

use crate::backends::camera::FrameSource;
use crate::config::SharedConfig;
use crate::constants::READ_BACKOFF;
use crate::scanner::admission::AdmissionPolicy;
use crate::scanner::events::{EventSender, PipelineEvent};
use crate::scanner::queue::BoundedQueue;
use crate::scanner::slot::FrameSlot;
use crate::scanner::worker::Submission;
use crate::scanner::preprocess;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, trace, warn};

pub(crate) struct CaptureContext {
    pub source: Box<dyn FrameSource>,
    pub config: SharedConfig,
    pub slot: Arc<FrameSlot>,
    pub queue: Arc<BoundedQueue<Submission>>,
    pub events: EventSender,
    pub preview_pending: Arc<AtomicBool>,
    pub stop: Arc<AtomicBool>,
}

/// Run the capture loop until the stop flag is set, then release the
/// device. The device handle stays owned by this thread for its whole
/// life.
pub(crate) fn run(ctx: CaptureContext) {
    let CaptureContext {
        mut source,
        config,
        slot,
        queue,
        events,
        preview_pending,
        stop,
    } = ctx;

    let mut admission = AdmissionPolicy::new();

    debug!("Capture loop started");

    match source.stream() {
        Err(e) => {
            // The worker has nothing to wait for if capture never starts
            error!(error = %e, "Failed to start capture stream");
            stop.store(true, Ordering::SeqCst);
        }
        Ok(mut stream) => {
            while !stop.load(Ordering::SeqCst) {
                let tick_start = Instant::now();
                let (frame_delay, interval, skip_rate, resize_factor) = {
                    match config.read() {
                        Ok(cfg) => (
                            cfg.frame_delay(),
                            cfg.recognition_interval,
                            cfg.frame_skip_rate,
                            cfg.resize_factor,
                        ),
                        Err(_) => break,
                    }
                };

                let frame = match stream.read() {
                    Ok(frame) => Arc::new(frame),
                    Err(e) => {
                        // Transient: skip this frame, keep capturing
                        warn!(error = %e, "Frame read failed");
                        thread::sleep(READ_BACKOFF);
                        continue;
                    }
                };

                slot.store(Arc::clone(&frame));

                if admission.admit(tick_start, interval, skip_rate) {
                    match preprocess::downscale(&frame, resize_factor) {
                        Some((image, scale)) => {
                            let evicted = queue.offer(Submission {
                                image,
                                scale,
                                captured_at: frame.captured_at,
                            });
                            if evicted {
                                trace!("Recognition queue full, evicted oldest frame");
                            }
                        }
                        None => warn!("Frame could not be downscaled, skipping submission"),
                    }
                }

                // Preview: submit only when the dispatcher has finished the
                // previous one, so a slow consumer cannot pile up frames
                if !preview_pending.swap(true, Ordering::AcqRel) {
                    if events.send(PipelineEvent::Preview(frame)).is_err() {
                        break;
                    }
                } else {
                    trace!("Preview still in flight, skipping frame");
                }

                if let Some(remaining) = frame_delay.checked_sub(tick_start.elapsed()) {
                    thread::sleep(remaining);
                }
            }
        }
    }

    source.close();
    debug!("Capture loop exiting");
}
