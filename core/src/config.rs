//! Recorder configuration
//!
//! Settings are fixed when a session opens. Changing the config on a live
//! recorder only affects the next session.
//!
//! ```toml
//! width = 640
//! height = 360
//! fps = 20
//! prefix = "recording"
//! mark_ticks = false
//! container = "avi"
//! output_dir = "/tmp/sessions"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RecorderError, Result};
use crate::video::{GIF_MAX_FPS, VideoContainer};

/// Session recording configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Frame width in pixels (default: 640)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Frame height in pixels (default: 360)
    #[serde(default = "default_height")]
    pub height: u32,
    /// Video frame rate (default: 20)
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Filename prefix; the session timestamp is appended (default: "recording")
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Burn a "tick N" counter into every recorded frame (default: false)
    #[serde(default)]
    pub mark_ticks: bool,
    /// Video container format (default: avi)
    #[serde(default)]
    pub container: VideoContainer,
    /// Output directory. Falls back to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    360
}
fn default_fps() -> u32 {
    20
}
fn default_prefix() -> String {
    "recording".to_string()
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            prefix: default_prefix(),
            mark_ticks: false,
            container: VideoContainer::default(),
            output_dir: None,
        }
    }
}

impl RecorderConfig {
    /// Bytes in one RGB frame at the configured resolution.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Reject configurations no session could be opened with.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RecorderError::InvalidConfig(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(RecorderError::InvalidConfig(
                "fps must be non-zero".to_string(),
            ));
        }
        if self.prefix.is_empty() {
            return Err(RecorderError::InvalidConfig(
                "prefix must not be empty".to_string(),
            ));
        }
        if self.prefix.contains(['/', '\\']) {
            return Err(RecorderError::InvalidConfig(format!(
                "prefix {:?} must not contain path separators",
                self.prefix
            )));
        }
        if self.container == VideoContainer::Gif && self.fps > GIF_MAX_FPS {
            return Err(RecorderError::InvalidConfig(format!(
                "gif playback is limited to {GIF_MAX_FPS} fps, got {}",
                self.fps
            )));
        }
        if self.container == VideoContainer::Gif
            && (self.width > u16::MAX as u32 || self.height > u16::MAX as u32)
        {
            return Err(RecorderError::InvalidConfig(format!(
                "gif frames are limited to {}x{}",
                u16::MAX,
                u16::MAX
            )));
        }
        Ok(())
    }

    /// Directory the session files are written to.
    ///
    /// Uses `output_dir` when set, otherwise `recordings/` under the
    /// platform data directory.
    pub fn resolve_output_dir(&self) -> Option<PathBuf> {
        match &self.output_dir {
            Some(dir) => Some(dir.clone()),
            None => recordings_dir(),
        }
    }

    /// Loads a config file, failing on unreadable or malformed TOML.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Loads a config file, returning defaults if it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Writes the config as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

/// Returns the platform-specific config file path.
///
/// On Linux: `~/.config/tickrec/config.toml`
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "tickrec", "tickrec")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Returns the platform-specific directory for recorded sessions.
///
/// On Linux: `~/.local/share/tickrec/recordings`
///
/// Returns `None` if the home directory cannot be determined.
pub fn recordings_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "tickrec", "tickrec")
        .map(|dirs| dirs.data_dir().join("recordings"))
}
