// SPDX-License-Identifier: GPL-3.0-only

use camera_showcase::backends::camera::types::{FaceDelivery, Facing};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "camera-showcase")]
#[command(about = "Photo capture, code scanning and face-triggered capture")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Virtual camera scene file (built-in scene when omitted)
    #[arg(long, global = true)]
    scene: Option<PathBuf>,

    /// Directory photos are written to
    #[arg(long, global = true)]
    photo_dir: Option<PathBuf>,

    /// Config file (default: <config dir>/camera-showcase/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive terminal UI (default)
    Terminal {
        /// Write logs to this file (the terminal UI owns the screen)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera facing: back or front
        #[arg(short, long, value_parser = parse_facing)]
        facing: Option<Facing>,

        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// Scan a barcode or QR code and print its value
    Scan {
        /// Give up after this many seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },

    /// Take a photo as soon as a face comes into view
    Face {
        /// Detection delivery: frame-processor or callback
        #[arg(short, long, value_parser = parse_delivery)]
        delivery: Option<FaceDelivery>,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn parse_facing(value: &str) -> Result<Facing, String> {
    Facing::from_name(value).ok_or_else(|| format!("unknown facing '{}'", value))
}

fn parse_delivery(value: &str) -> Result<FaceDelivery, String> {
    FaceDelivery::from_name(value).ok_or_else(|| format!("unknown delivery '{}'", value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set RUST_LOG to control the log level, e.g. RUST_LOG=camera_showcase=debug
    match &cli.command {
        None | Some(Commands::Terminal { log_file: None }) => {
            // Nothing may write to the terminal while the UI owns it
        }
        Some(Commands::Terminal {
            log_file: Some(path),
        }) => {
            let file = std::fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        Some(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let context = cli::Context {
        scene: cli.scene,
        photo_dir: cli.photo_dir,
        config: cli.config,
    };

    match cli.command {
        None | Some(Commands::Terminal { .. }) => cli::run_terminal(&context),
        Some(Commands::List) => cli::list_cameras(&context),
        Some(Commands::Photo {
            facing,
            output,
            timeout,
        }) => cli::take_photo(&context, facing, output, timeout),
        Some(Commands::Scan { timeout }) => cli::scan_code(&context, timeout),
        Some(Commands::Face { delivery, timeout }) => cli::detect_face(&context, delivery, timeout),
        Some(Commands::Config { write }) => cli::show_config(&context, write),
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}
