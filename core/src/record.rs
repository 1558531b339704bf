//! Action log records

use serde::{Deserialize, Serialize};

use crate::input::{KeyboardState, MouseState};

/// One line of the action log.
///
/// `tick` is 1-based: the record written alongside the i-th recorded frame
/// (0-indexed, priming frame excluded) carries `tick == i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub tick: u64,
    pub mouse: MouseState,
    pub keyboard: KeyboardState,
}

impl ActionRecord {
    /// Serialize as a single JSON line, newline included.
    pub fn to_json_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
