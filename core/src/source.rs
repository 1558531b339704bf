//! Frame source contract
//!
//! A frame source fills a caller-provided buffer with the current tick's
//! pixels. Rows arrive bottom-up in RGB order, the way a GL framebuffer
//! readback delivers them. Depth capture is never requested by the recorder.

use crate::error::{RecorderError, Result};

/// Producer of raw frames for the current tick.
pub trait FrameSource {
    /// Size in bytes of the buffer `get_frame` expects.
    fn required_buffer_size(&self) -> usize;

    /// Fill `buf` with the current frame.
    ///
    /// Must not block beyond one host tick. Undersized buffers are an error.
    fn get_frame(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Buffer size for a frame of the given resolution.
///
/// RGB is three bytes per pixel; a depth map adds a fourth channel.
pub fn required_buffer_size(width: u32, height: u32, want_depth: bool) -> usize {
    let channels = if want_depth { 4 } else { 3 };
    width as usize * height as usize * channels
}

/// Deterministic test-pattern source.
///
/// Draws a horizontal red ramp and a vertical green ramp, with a white
/// column that advances one pixel per frame. Output is bottom-up RGB.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_index: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
        }
    }

    /// Number of frames produced so far.
    pub fn frames_produced(&self) -> u64 {
        self.frame_index
    }
}

impl FrameSource for SyntheticSource {
    fn required_buffer_size(&self) -> usize {
        required_buffer_size(self.width, self.height, false)
    }

    fn get_frame(&mut self, buf: &mut [u8]) -> Result<()> {
        let expected = self.required_buffer_size();
        if buf.len() < expected {
            return Err(RecorderError::FrameSize {
                expected,
                actual: buf.len(),
            });
        }

        if expected == 0 {
            self.frame_index += 1;
            return Ok(());
        }

        let width = self.width as usize;
        let height = self.height as usize;
        let bar = (self.frame_index % self.width as u64) as usize;

        for (row_idx, row) in buf[..expected].chunks_exact_mut(width * 3).enumerate() {
            // Bottom-up: the first stored row is the bottom of the image
            let y = height - 1 - row_idx;
            let green = ramp(y, height);
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                if x == bar {
                    px.copy_from_slice(&[255, 255, 255]);
                } else {
                    let red = ramp(x, width);
                    px.copy_from_slice(&[red, green, 0x40]);
                }
            }
        }

        self.frame_index += 1;
        Ok(())
    }
}

fn ramp(pos: usize, len: usize) -> u8 {
    if len <= 1 {
        0
    } else {
        (pos * 255 / (len - 1)) as u8
    }
}
