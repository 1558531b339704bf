//! Tick-synchronized session recorder
//!
//! The host calls [`SessionRecorder::on_tick`] once per simulation step with
//! its liveness and pause flags. The recorder opens a session on the first
//! live tick, records one frame plus one action record per unpaused tick,
//! drains input without recording while paused, and closes the session when
//! the host stops being alive.
//!
//! # States
//!
//! ```text
//!            alive                    paused
//!   Idle ──────────────▶ Active ◀──────────────▶ Paused
//!    ▲                     │                       │
//!    └──── finish ◀────────┴────── !alive ◀────────┘
//! ```
//!
//! Frame N of the video (priming frame excluded) always pairs with line N of
//! the action log, whose `tick` is N (1-based).

use std::path::PathBuf;

use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use crate::frame::FrameTranspose;
use crate::input::ActionSampler;
use crate::record::ActionRecord;
use crate::session::{SessionPaths, StemAllocator};
use crate::source::FrameSource;
use crate::writer::{FileSinks, SinkProvider, StreamWriter};

#[cfg(test)]
mod tests;

/// Host flags sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSignal {
    /// The recorded entity exists and is alive
    pub alive: bool,
    /// The simulation is paused
    pub paused: bool,
}

impl HostSignal {
    pub const RUNNING: Self = Self {
        alive: true,
        paused: false,
    };
    pub const PAUSED: Self = Self {
        alive: true,
        paused: true,
    };
    pub const DEAD: Self = Self {
        alive: false,
        paused: false,
    };

    pub fn new(alive: bool, paused: bool) -> Self {
        Self { alive, paused }
    }
}

/// Lifecycle state of the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No session open
    Idle,
    /// Session open, host running
    Active,
    /// Session open, host paused
    Paused,
}

/// What a single `on_tick` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Host not alive and no session open
    Idle,
    /// A frame and an action record were written for `tick` (1-based)
    Recorded { tick: u64 },
    /// Host paused: input was sampled and discarded
    Drained,
    /// Host stopped being alive and the session was closed
    Finished(SessionSummary),
}

/// Description of a closed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub stem: String,
    pub video_path: PathBuf,
    pub log_path: PathBuf,
    /// Recorded frames (priming frame excluded); equals action log lines
    pub frames: u64,
}

/// One open recording run.
struct Session {
    writer: StreamWriter,
    transpose: FrameTranspose,
    tick_counter: u64,
    /// Raw frame from the source (bottom-up RGB)
    raw: Vec<u8>,
    /// Transposed frame for the container (top-down BGR)
    out: Vec<u8>,
}

/// Orchestrates frame capture, input sampling, and the paired output files.
pub struct SessionRecorder<F, S, P = FileSinks> {
    config: RecorderConfig,
    source: F,
    sampler: S,
    provider: P,
    stems: StemAllocator,
    session: Option<Session>,
    paused: bool,
}

impl<F: FrameSource, S: ActionSampler> SessionRecorder<F, S, FileSinks> {
    /// Recorder writing sessions to files.
    pub fn new(config: RecorderConfig, source: F, sampler: S) -> Self {
        Self::with_provider(config, source, sampler, FileSinks)
    }
}

impl<F: FrameSource, S: ActionSampler, P: SinkProvider> SessionRecorder<F, S, P> {
    /// Recorder using a custom sink provider.
    pub fn with_provider(config: RecorderConfig, source: F, sampler: S, provider: P) -> Self {
        Self {
            config,
            source,
            sampler,
            provider,
            stems: StemAllocator::new(),
            session: None,
            paused: false,
        }
    }

    /// Advance the recorder by one host tick.
    ///
    /// Errors are fatal to the open session: its sinks are released, the
    /// recorder returns to `Idle`, and the error is returned. Nothing is
    /// retried.
    pub fn on_tick(&mut self, host: HostSignal) -> Result<TickOutcome> {
        if !host.alive {
            if self.session.is_some() {
                let summary = self.finish()?;
                return Ok(TickOutcome::Finished(summary));
            }
            return Ok(TickOutcome::Idle);
        }

        if self.session.is_none() {
            self.start()?;
        }

        if host.paused {
            if !self.paused {
                tracing::debug!("Host paused, recording suspended");
            }
            self.paused = true;
            self.drain_input();
            return Ok(TickOutcome::Drained);
        }

        if self.paused {
            tracing::debug!("Host resumed");
            self.paused = false;
        }

        let tick = self.record_tick()?;
        Ok(TickOutcome::Recorded { tick })
    }

    /// Close the open session.
    ///
    /// Flushes and closes the action log and finalizes the video. Both are
    /// released even if one fails. Calling this with no session open is an
    /// error.
    pub fn finish(&mut self) -> Result<SessionSummary> {
        let session = self.session.take().ok_or(RecorderError::NotRecording)?;
        self.paused = false;

        let paths = session.writer.paths().clone();
        let tick_counter = session.tick_counter;
        let counts = session.writer.close()?;
        debug_assert_eq!(counts.frames, tick_counter);
        debug_assert_eq!(counts.records, tick_counter);

        tracing::info!(
            "Recording finished: {} ({} frames)",
            paths.stem,
            counts.frames
        );

        Ok(SessionSummary {
            stem: paths.stem,
            video_path: paths.video,
            log_path: paths.log,
            frames: counts.frames,
        })
    }

    pub fn state(&self) -> RecorderState {
        match (&self.session, self.paused) {
            (None, _) => RecorderState::Idle,
            (Some(_), true) => RecorderState::Paused,
            (Some(_), false) => RecorderState::Active,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Ticks recorded in the open session (0 when idle).
    pub fn tick_counter(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.tick_counter)
    }

    /// Stem of the open session.
    pub fn session_stem(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.writer.paths().stem.as_str())
    }

    /// Paths of the open session.
    pub fn session_paths(&self) -> Option<&SessionPaths> {
        self.session.as_ref().map(|s| s.writer.paths())
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect at the next session.
    pub fn set_config(&mut self, config: RecorderConfig) {
        self.config = config;
    }

    /// The sampler, for feeding host input events.
    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    fn start(&mut self) -> Result<()> {
        let config = self.config.clone();
        config.validate()?;

        let expected = config.frame_size();
        let required = self.source.required_buffer_size();
        if required != expected {
            return Err(RecorderError::FrameSize {
                expected,
                actual: required,
            });
        }

        let dir = config.resolve_output_dir().ok_or_else(|| {
            RecorderError::InvalidConfig(
                "no output_dir set and no platform data directory available".to_string(),
            )
        })?;
        self.provider
            .prepare_dir(&dir)
            .map_err(|source| RecorderError::OutputDir {
                path: dir.clone(),
                source,
            })?;

        let stem = self.stems.allocate(&config.prefix);
        let paths = SessionPaths::new(&dir, &stem, config.container);
        let writer = StreamWriter::open(&mut self.provider, paths, &config)?;

        tracing::info!(
            "Recording started: {} ({}x{} @ {}fps, {})",
            writer.paths().video.display(),
            config.width,
            config.height,
            config.fps,
            config.container.extension()
        );

        self.session = Some(Session {
            writer,
            transpose: FrameTranspose {
                width: config.width,
                height: config.height,
                mark_ticks: config.mark_ticks,
            },
            tick_counter: 0,
            raw: vec![0u8; expected],
            out: vec![0u8; expected],
        });
        self.paused = false;
        Ok(())
    }

    fn drain_input(&mut self) {
        let _ = self.sampler.sample_keyboard();
        let _ = self.sampler.sample_mouse();
    }

    fn record_tick(&mut self) -> Result<u64> {
        let session = self.session.as_mut().ok_or(RecorderError::NotRecording)?;
        match record_into(session, &mut self.source, &mut self.sampler) {
            Ok(tick) => Ok(tick),
            Err(e) => {
                self.abort(&e);
                Err(e)
            }
        }
    }

    /// Drop the open session after a fatal error, releasing its sinks.
    fn abort(&mut self, cause: &RecorderError) {
        self.paused = false;
        let Some(session) = self.session.take() else {
            return;
        };
        tracing::warn!(
            "Recording aborted: {} after {} ticks: {}",
            session.writer.paths().stem,
            session.tick_counter,
            cause
        );
        if let Err(e) = session.writer.close() {
            tracing::warn!("Failed to release aborted session: {}", e);
        }
    }
}

/// Capture, transpose, and write one tick. The counter only moves once
/// every step has succeeded.
fn record_into<F: FrameSource, S: ActionSampler>(
    session: &mut Session,
    source: &mut F,
    sampler: &mut S,
) -> Result<u64> {
    source.get_frame(&mut session.raw)?;
    session
        .transpose
        .apply(&session.raw, &mut session.out, session.tick_counter)?;
    session.writer.write_frame(&session.out)?;

    let record = ActionRecord {
        tick: session.tick_counter + 1,
        mouse: sampler.sample_mouse(),
        keyboard: sampler.sample_keyboard(),
    };
    session.writer.write_record(&record)?;

    session.tick_counter += 1;
    tracing::trace!("Recorded tick {}", session.tick_counter);
    Ok(session.tick_counter)
}
