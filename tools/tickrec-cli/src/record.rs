//! Record command - drive a synthetic host through the recorder
//!
//! The host renders a moving test pattern and feeds scripted pointer, wheel,
//! and keyboard input. Pause windows and a death tick exercise the recorder's
//! pause and shutdown paths.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use tickrec_core::{
    HostSignal, InputAccumulator, MouseButtons, RecorderConfig, SessionRecorder, SessionSummary,
    SyntheticSource, TickOutcome, VideoContainer,
};

use crate::config_cmd::load_config;

/// Arguments for the record command
#[derive(Args)]
pub struct RecordArgs {
    /// Config file (defaults to the platform config path)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of host ticks to run
    #[arg(long, default_value = "100")]
    pub ticks: u64,

    /// Pause the host for ticks FROM..TO (end exclusive, repeatable)
    #[arg(long, value_parser = parse_range)]
    pub pause: Vec<Range<u64>>,

    /// Host stops being alive from this tick on
    #[arg(long)]
    pub die_at: Option<u64>,

    // === Config overrides ===
    /// Frame width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Video frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Filename prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Burn the tick counter into each frame
    #[arg(long)]
    pub mark_ticks: bool,

    /// Video container (avi or gif)
    #[arg(long)]
    pub container: Option<VideoContainer>,

    /// Output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Sleep one frame interval between ticks
    #[arg(long)]
    pub realtime: bool,
}

/// A scripted host: which ticks are live and which are paused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HostScript {
    pauses: Vec<Range<u64>>,
    die_at: Option<u64>,
}

impl HostScript {
    /// Host flags for tick `t` (1-based).
    fn signal(&self, t: u64) -> HostSignal {
        let alive = self.die_at.is_none_or(|die| t < die);
        let paused = self.pauses.iter().any(|window| window.contains(&t));
        HostSignal::new(alive, paused)
    }
}

/// Execute the record command
pub fn execute(args: RecordArgs) -> Result<()> {
    let config = apply_overrides(load_config(args.config.as_deref())?, &args);
    config.validate()?;

    let script = HostScript {
        pauses: args.pause.clone(),
        die_at: args.die_at,
    };
    let interval = Duration::from_secs_f64(1.0 / f64::from(config.fps));
    let source = SyntheticSource::new(config.width, config.height);
    let mut recorder = SessionRecorder::new(config, source, InputAccumulator::new());
    let mut summaries = Vec::new();

    for t in 1..=args.ticks {
        feed_input(recorder.sampler_mut(), t);
        match recorder
            .on_tick(script.signal(t))
            .with_context(|| format!("Recording failed at host tick {t}"))?
        {
            TickOutcome::Finished(summary) => summaries.push(summary),
            TickOutcome::Recorded { .. } | TickOutcome::Drained | TickOutcome::Idle => {}
        }
        if args.realtime {
            std::thread::sleep(interval);
        }
    }

    if recorder.is_recording() {
        summaries.push(recorder.finish()?);
    }

    if summaries.is_empty() {
        bail!("Host was never alive; nothing recorded");
    }
    for summary in &summaries {
        print_summary(summary);
    }
    Ok(())
}

fn apply_overrides(mut config: RecorderConfig, args: &RecordArgs) -> RecorderConfig {
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    if args.mark_ticks {
        config.mark_ticks = true;
    }
    if let Some(container) = args.container {
        config.container = container;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    config
}

/// Scripted input for host tick `t`: a slow pointer sweep, a wheel notch
/// every 7 ticks, W held for 5 of every 10 ticks, and a left click every 25.
fn feed_input(input: &mut InputAccumulator, t: u64) {
    let phase = t as f64 * 0.1;
    input.move_pointer(phase.cos() * 4.0, phase.sin() * 4.0);
    if t % 7 == 0 {
        input.scroll(1.0);
    }
    match t % 10 {
        0 => {
            input.press_key("W");
            input.type_char('w');
        }
        5 => input.release_key("W"),
        _ => {}
    }
    if t % 25 == 0 {
        input.press_button(MouseButtons::LEFT);
    } else if t % 25 == 1 {
        input.release_button(MouseButtons::LEFT);
    }
}

fn print_summary(summary: &SessionSummary) {
    println!("Session {}", summary.stem);
    println!("  video:  {}", summary.video_path.display());
    println!("  log:    {}", summary.log_path.display());
    println!("  frames: {} (+1 priming)", summary.frames);
}

fn parse_range(s: &str) -> Result<Range<u64>, String> {
    let (from, to) = s
        .split_once("..")
        .ok_or_else(|| format!("expected FROM..TO, got {s:?}"))?;
    let from: u64 = from
        .trim()
        .parse()
        .map_err(|e| format!("bad range start {from:?}: {e}"))?;
    let to: u64 = to
        .trim()
        .parse()
        .map_err(|e| format!("bad range end {to:?}: {e}"))?;
    if to <= from {
        return Err(format!("empty range {s:?}"));
    }
    Ok(from..to)
}
