//! Tickrec CLI - Record and check tick-synchronized sessions
//!
//! # Commands
//!
//! - `tickrec record` - Drive a synthetic host through the recorder
//! - `tickrec verify` - Check that a video and action log pair up
//! - `tickrec config` - Show the effective configuration
//!
//! # Usage
//!
//! ```bash
//! # Record 200 ticks, paused between ticks 50 and 80, dying at tick 150
//! tickrec record --ticks 200 --pause 50..80 --die-at 150 --mark-ticks
//!
//! # Check a recorded session
//! tickrec verify recording.20240309-140507.avi
//! ```

mod config_cmd;
mod record;
mod verify;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Tickrec CLI - Record and check tick-synchronized sessions
#[derive(Parser)]
#[command(name = "tickrec")]
#[command(about = "Record and check tick-synchronized video + action sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a synthetic host through the recorder
    Record(record::RecordArgs),

    /// Check that a recorded video and action log pair up
    Verify(verify::VerifyArgs),

    /// Show the effective configuration
    Config(config_cmd::ConfigArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record(args) => record::execute(args),
        Commands::Verify(args) => verify::execute(args),
        Commands::Config(args) => config_cmd::execute(args),
    }
}
