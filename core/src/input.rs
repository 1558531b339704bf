//! Input-state sampling
//!
//! The recorder reads mouse and keyboard state once per tick through
//! [`ActionSampler`]. Reading is also draining: deltas and "new" presses
//! accumulated since the previous sample are reset by the read, while held
//! buttons and keys persist until released.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Source of per-tick input snapshots.
///
/// Each call both reads and resets the state accumulated since the previous
/// call of the same method. Sampling twice with no input in between returns
/// an empty delta the second time, never an error.
pub trait ActionSampler {
    fn sample_mouse(&mut self) -> MouseState;
    fn sample_keyboard(&mut self) -> KeyboardState;
}

impl<T: ActionSampler + ?Sized> ActionSampler for Box<T> {
    fn sample_mouse(&mut self) -> MouseState {
        (**self).sample_mouse()
    }

    fn sample_keyboard(&mut self) -> KeyboardState {
        (**self).sample_keyboard()
    }
}

bitflags::bitflags! {
    /// Set of mouse buttons
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 0b0000_0001;
        const RIGHT = 0b0000_0010;
        const MIDDLE = 0b0000_0100;
        const BACK = 0b0000_1000;
        const FORWARD = 0b0001_0000;
    }
}

impl MouseButtons {
    /// Button for a zero-based index (0 = left, 1 = right, 2 = middle, ...).
    pub fn from_index(index: u8) -> Option<Self> {
        if index >= 8 {
            return None;
        }
        Self::from_bits(1 << index)
    }

    /// Zero-based indices of the buttons in this set, ascending.
    pub fn indices(self) -> Vec<u8> {
        (0..8).filter(|i| self.bits() & (1 << i) != 0).collect()
    }
}

// Buttons serialize as a list of indices, e.g. `[0, 1]` for left + right
impl Serialize for MouseButtons {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.indices().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MouseButtons {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let indices = Vec::<u8>::deserialize(deserializer)?;
        indices.into_iter().try_fold(MouseButtons::empty(), |acc, i| {
            MouseButtons::from_index(i)
                .map(|b| acc | b)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown mouse button {i}")))
        })
    }
}

/// Mouse state for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseState {
    /// Pointer position
    pub x: f64,
    pub y: f64,
    /// Pointer movement since the previous sample
    pub dx: f64,
    pub dy: f64,
    /// Wheel movement since the previous sample
    pub dwheel: f64,
    /// Buttons held at sample time
    pub buttons: MouseButtons,
    /// Buttons pressed since the previous sample
    pub new_buttons: MouseButtons,
}

impl MouseState {
    /// True when nothing moved, nothing is held, and nothing was pressed.
    pub fn is_idle(&self) -> bool {
        self.dx == 0.0
            && self.dy == 0.0
            && self.dwheel == 0.0
            && self.buttons.is_empty()
            && self.new_buttons.is_empty()
    }
}

/// Keyboard state for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    /// Keys held at sample time, sorted
    pub keys: Vec<String>,
    /// Keys pressed since the previous sample, in press order
    pub new_keys: Vec<String>,
    /// Characters typed since the previous sample
    pub chars: String,
}

impl KeyboardState {
    pub fn is_idle(&self) -> bool {
        self.keys.is_empty() && self.new_keys.is_empty() && self.chars.is_empty()
    }
}

/// Event-fed sampler.
///
/// The host pushes input events as they happen; the recorder drains the
/// accumulated state once per tick.
#[derive(Debug, Default)]
pub struct InputAccumulator {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
    dwheel: f64,
    held_buttons: MouseButtons,
    new_buttons: MouseButtons,
    held_keys: BTreeSet<String>,
    new_keys: Vec<String>,
    chars: String,
}

impl InputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the pointer by a relative amount.
    pub fn move_pointer(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.dx += dx;
        self.dy += dy;
    }

    /// Warp the pointer without producing a movement delta.
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn scroll(&mut self, amount: f64) {
        self.dwheel += amount;
    }

    pub fn press_button(&mut self, button: MouseButtons) {
        self.held_buttons |= button;
        self.new_buttons |= button;
    }

    pub fn release_button(&mut self, button: MouseButtons) {
        self.held_buttons -= button;
    }

    pub fn press_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        // Auto-repeat of a held key is not a new press
        if self.held_keys.insert(key.clone()) && !self.new_keys.contains(&key) {
            self.new_keys.push(key);
        }
    }

    pub fn release_key(&mut self, key: &str) {
        self.held_keys.remove(key);
    }

    pub fn type_char(&mut self, c: char) {
        self.chars.push(c);
    }
}

impl ActionSampler for InputAccumulator {
    fn sample_mouse(&mut self) -> MouseState {
        let state = MouseState {
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            dwheel: self.dwheel,
            buttons: self.held_buttons,
            new_buttons: self.new_buttons,
        };
        self.dx = 0.0;
        self.dy = 0.0;
        self.dwheel = 0.0;
        self.new_buttons = MouseButtons::empty();
        state
    }

    fn sample_keyboard(&mut self) -> KeyboardState {
        KeyboardState {
            keys: self.held_keys.iter().cloned().collect(),
            new_keys: std::mem::take(&mut self.new_keys),
            chars: std::mem::take(&mut self.chars),
        }
    }
}
