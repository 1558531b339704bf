//! Session naming
//!
//! Every session writes a pair of sibling files sharing one stem:
//! `<prefix>.<YYYYmmdd-HHMMSS>.<ext>` for video and `.jsonl` for actions.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::video::VideoContainer;

/// Extension of the action log
pub const LOG_EXTENSION: &str = "jsonl";

/// Output locations for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub stem: String,
    pub video: PathBuf,
    pub log: PathBuf,
}

impl SessionPaths {
    pub fn new(dir: &Path, stem: &str, container: VideoContainer) -> Self {
        Self {
            stem: stem.to_string(),
            video: dir.join(format!("{stem}.{}", container.extension())),
            log: dir.join(format!("{stem}.{LOG_EXTENSION}")),
        }
    }
}

/// Stem for a session started at `now`.
pub fn timestamp_stem(prefix: &str, now: DateTime<Local>) -> String {
    format!("{prefix}.{}", now.format("%Y%m%d-%H%M%S"))
}

/// Hands out a distinct stem per session.
///
/// Timestamps have one-second resolution, so a session that dies and
/// restarts within the same second would otherwise reuse the previous stem
/// and overwrite its video. Repeats get a `-1`, `-2`, ... suffix.
#[derive(Debug, Default)]
pub struct StemAllocator {
    last_base: Option<String>,
    repeats: u32,
}

impl StemAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, prefix: &str) -> String {
        self.allocate_at(prefix, Local::now())
    }

    pub fn allocate_at(&mut self, prefix: &str, now: DateTime<Local>) -> String {
        let base = timestamp_stem(prefix, now);
        if self.last_base.as_deref() == Some(base.as_str()) {
            self.repeats += 1;
            format!("{base}-{}", self.repeats)
        } else {
            self.repeats = 0;
            self.last_base = Some(base.clone());
            base
        }
    }
}
