// SPDX-License-Identifier: GPL-3.0-only

//! Recognition worker
//!
//! Pulls downscaled frames from the recognition queue, runs the
//! enhancement chain, invokes the engine, filters candidates, and emits
//! exactly one of `Found`/`Failed` per completed cycle. The worker is
//! single-threaded, so at most one recognition call is ever in flight.

use crate::config::SharedConfig;
use crate::constants::{IDENTIFIER_LENGTH, QUEUE_TAKE_TIMEOUT};
use crate::ocr::{Candidate, TextRecognizer};
use crate::scanner::events::{EventSender, PipelineEvent};
use crate::scanner::queue::BoundedQueue;
use crate::scanner::slot::FrameSlot;
use crate::scanner::{annotate, preprocess};
use image::RgbImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// A frame admitted for recognition, already downscaled by the capture
/// side. `scale` records the factor that was applied so candidate
/// geometry can be mapped back to full-frame coordinates.
pub(crate) struct Submission {
    pub image: RgbImage,
    pub scale: f32,
    pub captured_at: Instant,
}

/// Phases of one recognition cycle. The stop flag is only observed in
/// `WaitingForFrame`; an in-flight engine call always runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerPhase {
    WaitingForFrame,
    Preprocessing,
    Recognizing,
    Filtering,
    Emitting,
}

pub(crate) struct WorkerContext {
    pub queue: Arc<BoundedQueue<Submission>>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub config: SharedConfig,
    pub slot: Arc<FrameSlot>,
    pub events: EventSender,
    pub stop: Arc<AtomicBool>,
}

/// Run the recognition worker until the stop flag is set.
pub(crate) fn run(ctx: WorkerContext) {
    debug!("Recognition worker started");

    loop {
        trace!(phase = ?WorkerPhase::WaitingForFrame, "Worker idle");
        if ctx.stop.load(Ordering::SeqCst) {
            break;
        }

        let Some(submission) = ctx.queue.take(QUEUE_TAKE_TIMEOUT) else {
            continue;
        };

        let cycle_start = Instant::now();
        trace!(
            phase = ?WorkerPhase::Preprocessing,
            queued_ms = submission.captured_at.elapsed().as_millis() as u64,
            "Enhancing frame"
        );
        let enhanced = preprocess::enhance(&submission.image);

        trace!(phase = ?WorkerPhase::Recognizing, "Invoking engine");
        let result = ctx.recognizer.recognize(&enhanced);

        trace!(phase = ?WorkerPhase::Filtering, "Filtering candidates");
        let threshold = ctx
            .config
            .read()
            .map(|cfg| cfg.confidence_threshold)
            .unwrap_or(crate::constants::DEFAULT_CONFIDENCE_THRESHOLD);

        let accepted = match result {
            Ok(candidates) => first_accepted(candidates, threshold),
            Err(e) => {
                // Engine failures count as a failed cycle, never a crash
                warn!(error = %e, "Recognition engine error");
                None
            }
        };

        trace!(phase = ?WorkerPhase::Emitting, "Emitting result");
        match accepted {
            Some(accepted) => {
                info!(
                    identifier = %accepted.digits,
                    confidence = accepted.confidence as f64,
                    cycle_ms = cycle_start.elapsed().as_millis() as u64,
                    "Identifier recognized"
                );
                annotate_latest(&ctx, &accepted, submission.scale);
                let _ = ctx.events.send(PipelineEvent::Found(accepted.digits));
            }
            None => {
                trace!(
                    cycle_ms = cycle_start.elapsed().as_millis() as u64,
                    "No acceptable candidate"
                );
                let _ = ctx.events.send(PipelineEvent::Failed);
            }
        }
    }

    debug!("Recognition worker exiting");
}

/// An accepted candidate after filtering
pub(crate) struct Accepted {
    pub digits: String,
    pub polygon: [(f32, f32); 4],
    pub confidence: f32,
}

/// Apply the acceptance policy in engine order; first match wins.
///
/// A candidate is accepted when its text, stripped of non-digit
/// characters, is exactly nine digits and its confidence clears the
/// threshold.
pub(crate) fn first_accepted(candidates: Vec<Candidate>, threshold: f32) -> Option<Accepted> {
    for candidate in candidates {
        let digits: String = candidate
            .text
            .chars()
            .filter(|ch| ch.is_ascii_digit())
            .collect();

        if digits.len() != IDENTIFIER_LENGTH {
            continue;
        }
        if candidate.confidence < threshold {
            trace!(
                text = %candidate.text,
                confidence = candidate.confidence as f64,
                threshold = threshold as f64,
                "Candidate below confidence threshold"
            );
            continue;
        }

        return Some(Accepted {
            digits,
            polygon: candidate.polygon,
            confidence: candidate.confidence,
        });
    }

    None
}

/// Draw the accepted polygon onto the latest slot frame, scaled back to
/// full-frame coordinates.
fn annotate_latest(ctx: &WorkerContext, accepted: &Accepted, scale: f32) {
    let Some(latest) = ctx.slot.latest() else {
        return;
    };

    let inverse = if scale > 0.0 { 1.0 / scale } else { 1.0 };
    let polygon = [
        (accepted.polygon[0].0 * inverse, accepted.polygon[0].1 * inverse),
        (accepted.polygon[1].0 * inverse, accepted.polygon[1].1 * inverse),
        (accepted.polygon[2].0 * inverse, accepted.polygon[2].1 * inverse),
        (accepted.polygon[3].0 * inverse, accepted.polygon[3].1 * inverse),
    ];

    if let Some(annotated) = annotate::outline_polygon(&latest, &polygon) {
        ctx.slot.store(Arc::new(annotated));
    }
}
