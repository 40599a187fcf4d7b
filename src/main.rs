// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use simple_camera::Config;
use std::path::PathBuf;
use tracing::warn;

mod cli;

#[derive(Parser)]
#[command(name = "simple-camera")]
#[command(about = "Back-facing camera preview on a platform camera service")]
#[command(version)]
struct Cli {
    /// Camera setup file for the virtual platform (JSON)
    #[arg(long, global = true)]
    setup: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cameras and their output stream configurations
    List,

    /// Print the preview size selected for a display window
    PreviewSize {
        /// Window width (default from config)
        #[arg(long)]
        width: Option<u32>,

        /// Window height (default from config)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Open the back camera and stream a preview until the duration ends or Ctrl+C
    Stream {
        /// Window width (default from config)
        #[arg(long)]
        width: Option<u32>,

        /// Window height (default from config)
        #[arg(long)]
        height: Option<u32>,

        /// Stream duration in seconds
        #[arg(short, long, default_value_t = simple_camera::constants::DEFAULT_STREAM_SECONDS)]
        duration: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=simple_camera=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    if let Err(e) = &loaded {
        warn!(error = %e, "Ignoring unreadable config, using defaults");
    }

    let cli = Cli::parse();
    let setup_path = cli.setup.or_else(|| config.camera_setup.clone());
    let setup = cli::load_setup(setup_path.as_deref())?;

    match cli.command {
        Commands::List => cli::list_cameras(setup),
        Commands::PreviewSize { width, height } => cli::print_preview_size(
            setup,
            width.unwrap_or(config.window_width),
            height.unwrap_or(config.window_height),
        ),
        Commands::Stream {
            width,
            height,
            duration,
        } => cli::stream(
            setup,
            width.unwrap_or(config.window_width),
            height.unwrap_or(config.window_height),
            duration,
        ),
    }
}
