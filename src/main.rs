// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "idscan")]
#[command(about = "Scan 9-digit ID card numbers with a camera")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available capture devices
    List {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan continuously, printing recognized identifiers until Ctrl+C
    Scan {
        /// Capture device path
        #[arg(short, long, default_value = "/dev/video0")]
        device: String,

        /// JSON configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the latest preview frame to this path as JPEG
        #[arg(long)]
        preview_file: Option<PathBuf>,

        /// Tesseract language pack
        #[arg(short, long, default_value = "spa")]
        lang: String,

        /// Stop after the first recognized identifier
        #[arg(long)]
        once: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=idscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { json } => cli::list_devices(json),
        Commands::Scan {
            device,
            config,
            preview_file,
            lang,
            once,
        } => cli::scan(device, config, preview_file, lang, once),
    }
}
