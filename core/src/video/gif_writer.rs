//! Streaming GIF writer
//!
//! Frames are quantized and written as they arrive instead of being buffered
//! until the end of the session.

use std::io::{self, Write};

use super::{VideoSink, check_frame_len};

/// NeuQuant sampling factor; 1 is slowest and best, 30 fastest
const QUANTIZE_SPEED: i32 = 10;

/// Writer for animated GIF files
pub struct GifWriter<W: Write> {
    encoder: gif::Encoder<W>,
    width: u16,
    height: u16,
    /// Frame delay in centiseconds
    delay: u16,
    frames: u64,
    rgb: Vec<u8>,
}

fn to_io(err: gif::EncodingError) -> io::Error {
    match err {
        gif::EncodingError::Io(e) => e,
        other => io::Error::other(other),
    }
}

/// Frame delay in centiseconds, rounded to the nearest.
///
/// GIF timing is approximate: 20 fps is exact (5 cs) but 30 fps plays back
/// at 3 cs, about 33 fps. Browsers clamp delays under 2 cs, so
/// configurations above 50 fps are rejected before a writer is built.
pub fn frame_delay(fps: u32) -> u16 {
    let fps = fps.max(1);
    ((100 + fps / 2) / fps).clamp(1, u32::from(u16::MAX)) as u16
}

impl<W: Write> GifWriter<W> {
    pub fn new(writer: W, width: u32, height: u32, fps: u32) -> io::Result<Self> {
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("gif frames are limited to 65535x65535, got {width}x{height}"),
            ));
        };
        if fps == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "gif requires non-zero fps",
            ));
        }

        let mut encoder = gif::Encoder::new(writer, w, h, &[]).map_err(to_io)?;
        encoder.set_repeat(gif::Repeat::Infinite).map_err(to_io)?;

        let delay = frame_delay(fps);

        Ok(Self {
            encoder,
            width: w,
            height: h,
            delay,
            frames: 0,
            rgb: Vec::with_capacity(width as usize * height as usize * 3),
        })
    }

    /// Write the trailer and return the inner writer.
    pub fn finalize(self) -> io::Result<W> {
        let mut inner = self.encoder.into_inner()?;
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> VideoSink for GifWriter<W> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        check_frame_len(frame, self.width as u32, self.height as u32)?;

        // BGR -> RGB
        self.rgb.clear();
        for px in frame.chunks_exact(3) {
            self.rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }

        let mut gif_frame =
            gif::Frame::from_rgb_speed(self.width, self.height, &self.rgb, QUANTIZE_SPEED);
        gif_frame.delay = self.delay;
        self.encoder.write_frame(&gif_frame).map_err(to_io)?;
        self.frames += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.finalize().map(drop)
    }
}
