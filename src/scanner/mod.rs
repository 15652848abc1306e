// SPDX-License-Identifier: GPL-3.0-only

//! Scanning pipeline
//!
//! Wires the capture loop, the recognition worker, and the event
//! dispatcher together and owns their lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   frames    ┌──────────────────┐
//! │ FrameSource ├────────────► Capture loop      │
//! └────────────┘             │  rate budget      │
//!                            │  admission policy │
//!                            └───┬─────────┬─────┘
//!                      frame slot│         │bounded queue (2, drop-oldest)
//!                            ┌───▼───┐ ┌───▼──────────────┐
//!                            │Preview│ │Recognition worker│
//!                            └───┬───┘ │ enhance→engine→  │
//!                                │     │ filter→annotate  │
//!                                │     └───┬──────────────┘
//!                            ┌───▼─────────▼───┐
//!                            │ Event dispatcher │──► ScanSubscriber
//!                            └──────────────────┘
//! ```
//!
//! The pipeline is an explicit instance owned by the caller; nothing here
//! is process-global, so independent pipelines can coexist (and be
//! tested) freely.

pub mod admission;
pub mod annotate;
pub mod capture;
pub mod encode;
pub mod events;
pub mod preprocess;
pub mod queue;
pub mod slot;
pub mod worker;

pub use events::{ScanEvent, ScanSubscriber};

use crate::backends::camera::{CaptureFormat, SourceFactory};
use crate::config::{ScanConfig, SharedConfig, shared};
use crate::constants::{
    DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, RECOGNITION_QUEUE_CAPACITY, SHUTDOWN_TIMEOUT,
};
use crate::errors::{ConfigError, ScanError};
use crate::ocr::TextRecognizer;
use crate::scanner::events::PipelineEvent;
use crate::scanner::queue::BoundedQueue;
use crate::scanner::slot::FrameSlot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pipeline lifecycle state. There is no terminal state: a stopped
/// pipeline is `Idle` and may be started again, re-acquiring the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopping,
}

/// Handles for one run's threads
struct RunningThreads {
    capture: JoinHandle<()>,
    worker: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
    events_tx: mpsc::UnboundedSender<PipelineEvent>,
}

/// The scanning pipeline.
///
/// Construct one per camera, [`start`](Self::start) it, and receive
/// results through the [`ScanSubscriber`] supplied at construction.
/// Dropping a running pipeline stops it.
pub struct ScanPipeline {
    config: SharedConfig,
    factory: SourceFactory,
    recognizer: Arc<dyn TextRecognizer>,
    subscriber: Arc<dyn ScanSubscriber>,
    state: Arc<Mutex<PipelineState>>,
    stop: Arc<AtomicBool>,
    threads: Option<RunningThreads>,
}

impl ScanPipeline {
    /// Create a pipeline. The configuration is validated; the device is
    /// not touched until [`start`](Self::start).
    pub fn new(
        config: ScanConfig,
        factory: SourceFactory,
        recognizer: Arc<dyn TextRecognizer>,
        subscriber: Arc<dyn ScanSubscriber>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: shared(config),
            factory,
            recognizer,
            subscriber,
            state: Arc::new(Mutex::new(PipelineState::Idle)),
            stop: Arc::new(AtomicBool::new(false)),
            threads: None,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
            .lock()
            .map(|guard| *guard)
            .unwrap_or(PipelineState::Idle)
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> ScanConfig {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .unwrap_or_default()
    }

    /// Replace the configuration at runtime. Takes effect on the next
    /// iteration of each loop; never restarts the pipeline.
    pub fn reconfigure(&self, config: ScanConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Ok(mut guard) = self.config.write() {
            debug!(?config, "Pipeline reconfigured");
            *guard = config;
        }
        Ok(())
    }

    /// Start the pipeline: open the device and launch the capture loop,
    /// the recognition worker, and the event dispatcher.
    ///
    /// No-op if already running. A device open failure is returned
    /// synchronously and leaves the pipeline `Idle` with no threads
    /// launched. Each start is a fresh acquisition: no admission state,
    /// queue content, or buffered frame survives from a previous run.
    pub fn start(&mut self) -> Result<(), ScanError> {
        {
            let state = self.state.lock().map_err(|_| "pipeline state poisoned")?;
            if *state == PipelineState::Running {
                debug!("start() ignored, pipeline already running");
                return Ok(());
            }
        }

        // Open and configure the device before committing to Running, so
        // failures surface to the caller and nothing needs unwinding
        let mut source = (self.factory)()?;
        let target_fps = self.config().target_fps;
        let format = source.configure(&CaptureFormat::new(
            DEFAULT_CAPTURE_WIDTH,
            DEFAULT_CAPTURE_HEIGHT,
            target_fps,
        ))?;
        info!(format = %format, "Capture device ready");

        self.stop.store(false, Ordering::SeqCst);

        // Fresh per-run state
        let slot = Arc::new(FrameSlot::new());
        let queue = Arc::new(BoundedQueue::new(RECOGNITION_QUEUE_CAPACITY));
        let preview_pending = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let dispatcher = events::spawn_dispatcher(
            events_rx,
            Arc::clone(&self.subscriber),
            Arc::clone(&self.config),
            Arc::clone(&preview_pending),
        );

        let capture_ctx = capture::CaptureContext {
            source,
            config: Arc::clone(&self.config),
            slot: Arc::clone(&slot),
            queue: Arc::clone(&queue),
            events: events_tx.clone(),
            preview_pending,
            stop: Arc::clone(&self.stop),
        };
        let capture = thread::spawn(move || capture::run(capture_ctx));

        let worker_ctx = worker::WorkerContext {
            queue,
            recognizer: Arc::clone(&self.recognizer),
            config: Arc::clone(&self.config),
            slot,
            events: events_tx.clone(),
            stop: Arc::clone(&self.stop),
        };
        let worker = thread::spawn(move || worker::run(worker_ctx));

        self.threads = Some(RunningThreads {
            capture,
            worker,
            dispatcher,
            events_tx,
        });

        if let Ok(mut state) = self.state.lock() {
            *state = PipelineState::Running;
        }
        info!("Pipeline running");
        Ok(())
    }

    /// Stop the pipeline: signal both loops, join them with a bounded
    /// timeout, release the device, drain and close the event channel.
    ///
    /// No-op if already idle. After `stop()` returns the pipeline may be
    /// started again.
    pub fn stop(&mut self) {
        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if *state == PipelineState::Idle {
                debug!("stop() ignored, pipeline already idle");
                return;
            }
            *state = PipelineState::Stopping;
        }

        info!("Stopping pipeline");
        self.stop.store(true, Ordering::SeqCst);

        if let Some(threads) = self.threads.take() {
            // The capture thread owns the device handle and releases it
            // on exit
            join_with_timeout(threads.capture, SHUTDOWN_TIMEOUT, "capture");
            join_with_timeout(threads.worker, SHUTDOWN_TIMEOUT, "worker");

            // All senders gone: the dispatcher drains what is left and
            // exits
            drop(threads.events_tx);
            join_with_timeout(threads.dispatcher, SHUTDOWN_TIMEOUT, "dispatcher");
        }

        if let Ok(mut state) = self.state.lock() {
            *state = PipelineState::Idle;
        }
        info!("Pipeline stopped");
    }
}

impl Drop for ScanPipeline {
    fn drop(&mut self) {
        if self.threads.is_some() {
            debug!("ScanPipeline dropped while running, stopping");
            self.stop();
        }
    }
}

/// Join a loop thread, giving up after `timeout`. A thread that fails to
/// stop in time is detached; its resources are released when it finishes
/// its in-flight work.
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration, name: &str) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    if handle.is_finished() {
        if handle.join().is_err() {
            warn!(name, "Loop thread panicked");
        }
    } else {
        warn!(name, timeout_ms = timeout.as_millis() as u64, "Forced shutdown: thread did not stop in time, detaching");
    }
}
