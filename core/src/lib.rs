//! Tickrec Core - Tick-synchronized gameplay recording
//!
//! This crate records a running simulation as a pair of files: a video with
//! one frame per simulation tick and a JSON-lines action log with one record
//! per tick. Frame N of the video (after a black priming frame) pairs with
//! line N of the log.
//!
//! # Architecture
//!
//! - [`SessionRecorder`] - Per-tick state machine driven by host liveness and pause flags
//! - [`FrameSource`] - Supplies raw bottom-up RGB frames from the host renderer
//! - [`ActionSampler`] - Supplies (and drains) per-tick mouse and keyboard state
//! - [`StreamWriter`] - Owns the paired video and action-log sinks of one session
//! - [`verify_session`] - Offline check that a recorded pair lines up

pub mod config;
pub mod error;
pub mod frame;
pub mod input;
pub mod record;
pub mod recorder;
pub mod session;
pub mod source;
pub mod verify;
pub mod video;
pub mod writer;

// Re-export core types
pub use config::{RecorderConfig, config_path, recordings_dir};
pub use error::{RecorderError, Result};
pub use recorder::{
    HostSignal, RecorderState, SessionRecorder, SessionSummary, TickOutcome,
};

// Re-export collaborator contracts
pub use input::{ActionSampler, InputAccumulator, KeyboardState, MouseButtons, MouseState};
pub use source::{FrameSource, SyntheticSource, required_buffer_size};

// Re-export output types
pub use record::ActionRecord;
pub use session::SessionPaths;
pub use video::{VideoContainer, VideoSink};
pub use writer::{FileSinks, SinkProvider, StreamWriter};

// Re-export verification
pub use verify::{Mismatch, VerifyReport, verify_session};
