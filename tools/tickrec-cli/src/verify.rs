//! Verify command - check a recorded session pair

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use tickrec_core::verify::{log_path_for, verify_session};

/// Arguments for the verify command
#[derive(Args)]
pub struct VerifyArgs {
    /// Recorded video (.avi or .gif)
    pub video: PathBuf,

    /// Action log (defaults to the video path with a .jsonl extension)
    pub log: Option<PathBuf>,
}

/// Execute the verify command
pub fn execute(args: VerifyArgs) -> Result<()> {
    let log = args.log.unwrap_or_else(|| log_path_for(&args.video));
    let report = verify_session(&args.video, &log)?;

    println!("Video:  {}", report.video_path.display());
    println!("Log:    {}", report.log_path.display());
    println!(
        "Frames: {} recorded (+1 priming), {} log lines",
        report.recorded_frames, report.log_lines
    );

    if report.is_paired() {
        println!("OK");
        return Ok(());
    }

    for mismatch in &report.mismatches {
        println!("  - {mismatch}");
    }
    bail!("{} mismatches", report.mismatches.len())
}
