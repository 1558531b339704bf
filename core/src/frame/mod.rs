//! Frame transposition
//!
//! Converts raw frames from the capture layout (bottom-up rows, RGB) into the
//! container layout (top-down rows, BGR) and optionally burns in a tick
//! counter.

mod font;

pub use font::Canvas;

use crate::error::{RecorderError, Result};

/// Overlay text anchor: left edge and baseline, in frame pixels
const OVERLAY_ORIGIN: (i64, i64) = (10, 30);
/// Font pixel size of the overlay
const OVERLAY_SCALE: usize = 3;
/// Overlay color (white is the same in either channel order)
const OVERLAY_COLOR: [u8; 3] = [255, 255, 255];

/// Flip rows top-to-bottom and swap R and B channels.
///
/// `src` is bottom-up RGB, `dst` receives top-down BGR. Both must hold
/// exactly `width * height * 3` bytes.
pub fn transpose_frame(src: &[u8], dst: &mut [u8], width: u32, height: u32) -> Result<()> {
    let expected = width as usize * height as usize * 3;
    if src.len() != expected {
        return Err(RecorderError::FrameSize {
            expected,
            actual: src.len(),
        });
    }
    if dst.len() != expected {
        return Err(RecorderError::FrameSize {
            expected,
            actual: dst.len(),
        });
    }
    if expected == 0 {
        return Ok(());
    }

    let stride = width as usize * 3;
    for (src_row, dst_row) in src
        .chunks_exact(stride)
        .zip(dst.chunks_exact_mut(stride).rev())
    {
        for (s, d) in src_row.chunks_exact(3).zip(dst_row.chunks_exact_mut(3)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
        }
    }
    Ok(())
}

/// Burn `"tick N"` into a top-down frame near its top-left corner.
pub fn overlay_tick(frame: &mut [u8], width: u32, height: u32, tick: u64) {
    let text = format!("tick {tick}");
    let (x, baseline) = OVERLAY_ORIGIN;
    let top = baseline - (font::GLYPH_HEIGHT * OVERLAY_SCALE) as i64;
    Canvas {
        pixels: frame,
        width: width as usize,
        height: height as usize,
    }
    .draw_text(x, top, &text, OVERLAY_SCALE, OVERLAY_COLOR);
}

/// Per-session transposition settings.
#[derive(Debug, Clone, Copy)]
pub struct FrameTranspose {
    pub width: u32,
    pub height: u32,
    pub mark_ticks: bool,
}

impl FrameTranspose {
    /// Transpose `raw` into `out`, overlaying the tick counter if enabled.
    pub fn apply(&self, raw: &[u8], out: &mut [u8], tick: u64) -> Result<()> {
        transpose_frame(raw, out, self.width, self.height)?;
        if self.mark_ticks {
            overlay_tick(out, self.width, self.height, tick);
        }
        Ok(())
    }
}
