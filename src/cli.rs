// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the scanner
//!
//! This module provides command-line functionality for:
//! - Listing available capture devices
//! - Running the scanning pipeline interactively

use chrono::Local;
use idscan::backends::camera::{enumerate_devices, v4l2_factory};
use idscan::ocr::TesseractRecognizer;
use idscan::{ScanConfig, ScanPipeline, ScanSubscriber};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// List all available capture devices
pub fn list_devices(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let devices = enumerate_devices();

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No capture devices found.");
        return Ok(());
    }

    println!("Available capture devices:");
    println!();
    for device in &devices {
        println!("  {}  {} ({})", device.path, device.card, device.driver);
    }

    Ok(())
}

/// Subscriber that prints scan results to the terminal and optionally
/// mirrors preview frames to a file
struct TerminalSubscriber {
    preview_file: Option<PathBuf>,
    found: AtomicU64,
    failed: AtomicU64,
    done: Arc<AtomicBool>,
    once: bool,
}

impl ScanSubscriber for TerminalSubscriber {
    fn on_found(&self, identifier: &str) {
        let count = self.found.fetch_add(1, Ordering::SeqCst) + 1;
        println!(
            "[{}] found: {} (total {})",
            Local::now().format("%H:%M:%S"),
            identifier,
            count
        );
        if self.once {
            self.done.store(true, Ordering::SeqCst);
        }
    }

    fn on_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_frame_update(&self, jpeg: &[u8]) {
        if let Some(path) = &self.preview_file {
            if let Err(e) = std::fs::write(path, jpeg) {
                eprintln!("Failed to write preview frame: {}", e);
            }
        }
    }
}

/// Run the pipeline until Ctrl+C (or the first hit with `--once`)
pub fn scan(
    device: String,
    config_path: Option<PathBuf>,
    preview_file: Option<PathBuf>,
    lang: String,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)?;
            let config: ScanConfig = serde_json::from_str(&contents)?;
            config.validate()?;
            config
        }
        None => ScanConfig::default(),
    };

    println!("Initializing recognition engine...");
    let recognizer = Arc::new(TesseractRecognizer::with_lang(&lang)?);

    let done = Arc::new(AtomicBool::new(false));
    let subscriber = Arc::new(TerminalSubscriber {
        preview_file,
        found: AtomicU64::new(0),
        failed: AtomicU64::new(0),
        done: Arc::clone(&done),
        once,
    });

    let mut pipeline = ScanPipeline::new(
        config,
        v4l2_factory(device.clone()),
        recognizer,
        Arc::clone(&subscriber) as Arc<dyn ScanSubscriber>,
    )?;

    let interrupted = Arc::clone(&done);
    ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
    })?;

    pipeline.start()?;
    println!("Scanning on {} - press Ctrl+C to stop", device);

    while !done.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    pipeline.stop();

    let found = subscriber.found.load(Ordering::SeqCst);
    let failed = subscriber.failed.load(Ordering::SeqCst);
    println!(
        "Stopped. {} identifier(s) recognized, {} cycle(s) without a match.",
        found, failed
    );

    Ok(())
}
