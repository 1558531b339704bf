//! Recorder error types

use std::io;
use std::path::PathBuf;

/// Errors raised while opening, writing, or closing a recording session.
///
/// Nothing here is retried. A write failure mid-session is fatal to that
/// session; the files on disk stay consistent up to the last completed tick.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// A sink could not be created or opened
    #[error("failed to open {}: {source}", .path.display())]
    ResourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output directory could not be created
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing a frame to the video sink failed
    #[error("video write failed: {0}")]
    VideoWrite(#[source] io::Error),

    /// Writing a record to the action log failed
    #[error("action log write failed: {0}")]
    LogWrite(#[source] io::Error),

    /// An action record could not be serialized
    #[error("action record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A frame buffer did not match the configured resolution
    #[error("frame buffer is {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    /// The frame source failed to produce a frame
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// `finish()` was called with no session open
    #[error("finish() called while no session is recording")]
    NotRecording,

    /// One or both sinks failed to release. Both releases were attempted.
    #[error("failed to release session sinks (video: {}, log: {})", describe(.video), describe(.log))]
    Release {
        video: Option<io::Error>,
        log: Option<io::Error>,
    },

    /// Configuration rejected by validation
    #[error("invalid recorder config: {0}")]
    InvalidConfig(String),
}

fn describe(err: &Option<io::Error>) -> String {
    match err {
        Some(e) => e.to_string(),
        None => "ok".to_string(),
    }
}

/// Result alias for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;
