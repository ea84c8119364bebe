// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "mediacentre")]
#[command(about = "Stream, record and play back webcam video")]
#[command(version = mediacentre::constants::app_info::version())]
struct Cli {
    /// Use a synthetic test pattern and tone instead of real devices
    #[arg(long, global = true)]
    test_source: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available capture devices
    List,

    /// View the live stream in the terminal
    View {
        /// Device index to use (from 'mediacentre list')
        #[arg(short, long)]
        device: Option<u32>,
    },

    /// Record audio and video to a Matroska file
    Record {
        /// Device index to use (from 'mediacentre list')
        #[arg(short, long)]
        device: Option<u32>,

        /// Recording duration in seconds
        #[arg(short = 't', long, default_value = "10")]
        duration: u64,

        /// Recording gain (0.0 - 4.0)
        #[arg(short, long)]
        volume: Option<f64>,

        /// Output file path (default: ~/Videos/mediacentre/recording_TIMESTAMP.mkv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play back a Matroska file
    Play {
        /// File to play
        path: PathBuf,

        /// Save the last displayed frame as PNG
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Save one frame from a device as PNG
    Snapshot {
        /// Device index to use (from 'mediacentre list')
        #[arg(short, long)]
        device: Option<u32>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=mediacentre=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let test_source = cli.test_source;

    match cli.command {
        Commands::List => cli::list_devices(test_source),
        Commands::View { device } => cli::view(device, test_source),
        Commands::Record {
            device,
            duration,
            volume,
            output,
        } => cli::record(device, duration, volume, output, test_source),
        Commands::Play { path, snapshot } => cli::play(&path, snapshot),
        Commands::Snapshot { device, output } => cli::snapshot(device, &output, test_source),
    }
}
