// SPDX-License-Identifier: GPL-3.0-only

//! Event delivery to the pipeline's consumer
//!
//! The capture loop and the recognition worker never call the subscriber
//! directly. They push messages onto a channel; a single long-lived
//! dispatch thread drains it, encodes preview frames, and invokes the
//! subscriber. A slow subscriber therefore stalls neither capture nor
//! recognition, and shutdown reduces to closing the channel and joining
//! one thread.

use crate::backends::camera::CameraFrame;
use crate::config::SharedConfig;
use crate::scanner::encode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A scan outcome or preview update delivered to the subscriber.
///
/// `Found`/`Failed` are emitted once per completed recognition cycle;
/// `FrameUpdate` carries a JPEG-encoded preview frame. Delivery is
/// at-most-once with no replay.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A valid identifier was recognized
    Found(String),
    /// The cycle completed without an accepted candidate
    Failed,
    /// JPEG-encoded preview of the most recent frame
    FrameUpdate(Vec<u8>),
}

/// Consumer callbacks.
///
/// Invoked from the dispatch thread, never from the thread that called
/// `start()` or `stop()`. Implementations must not assume a particular
/// thread identity and must tolerate a final in-flight callback racing
/// `stop()` returning.
pub trait ScanSubscriber: Send + Sync {
    fn on_found(&self, identifier: &str);
    fn on_failed(&self);
    fn on_frame_update(&self, jpeg: &[u8]);
}

/// Internal channel message. Previews travel unencoded so the capture
/// loop pays nothing beyond an `Arc` clone.
pub(crate) enum PipelineEvent {
    Found(String),
    Failed,
    Preview(Arc<CameraFrame>),
}

pub(crate) type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// Spawn the dispatch thread. It exits once every sender is dropped and
/// the channel is drained.
///
/// `preview_pending` is the capture loop's backpressure flag: it is set
/// when a preview is submitted and cleared here once the frame has been
/// encoded, so at most one preview is in flight at a time.
pub(crate) fn spawn_dispatcher(
    mut receiver: mpsc::UnboundedReceiver<PipelineEvent>,
    subscriber: Arc<dyn ScanSubscriber>,
    config: SharedConfig,
    preview_pending: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Event dispatch thread started");

        while let Some(event) = receiver.blocking_recv() {
            let event = match event {
                PipelineEvent::Found(identifier) => ScanEvent::Found(identifier),
                PipelineEvent::Failed => ScanEvent::Failed,
                PipelineEvent::Preview(frame) => {
                    let quality = config
                        .read()
                        .map(|cfg| cfg.encode_quality)
                        .unwrap_or(crate::constants::DEFAULT_ENCODE_QUALITY);

                    let encoded = encode::encode_jpeg(&frame, quality);
                    // Encoding done; let the capture loop submit the next one
                    preview_pending.store(false, Ordering::Release);

                    match encoded {
                        Ok(jpeg) => ScanEvent::FrameUpdate(jpeg),
                        Err(e) => {
                            warn!(error = %e, "Preview encoding failed");
                            continue;
                        }
                    }
                }
            };

            deliver(subscriber.as_ref(), &event);
        }

        debug!("Event dispatch thread exiting");
    })
}

/// Route one event to the matching subscriber callback
fn deliver(subscriber: &dyn ScanSubscriber, event: &ScanEvent) {
    match event {
        ScanEvent::Found(identifier) => subscriber.on_found(identifier),
        ScanEvent::Failed => subscriber.on_failed(),
        ScanEvent::FrameUpdate(jpeg) => subscriber.on_frame_update(jpeg),
    }
}
