//! Video containers
//!
//! Every container accepts packed top-down BGR frames at a fixed resolution.
//!
//! - **AVI** (`.avi`) - uncompressed 24-bit DIB frames, seekable, indexed
//! - **GIF** (`.gif`) - palette-quantized, handy for quick previews

mod avi_writer;
mod gif_writer;

pub use avi_writer::AviWriter;
pub use gif_writer::{GifWriter, frame_delay};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

/// Destination for encoded frames.
pub trait VideoSink {
    /// Append one top-down BGR frame.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Frames appended so far, including the priming frame.
    fn frames_written(&self) -> u64;

    /// Finalize the container and release the underlying file.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Highest frame rate a GIF delay can represent reliably
pub const GIF_MAX_FPS: u32 = 50;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    #[default]
    Avi,
    Gif,
}

impl VideoContainer {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            VideoContainer::Avi => "avi",
            VideoContainer::Gif => "gif",
        }
    }

    /// Guess the container from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "avi" => Some(VideoContainer::Avi),
            "gif" => Some(VideoContainer::Gif),
            _ => None,
        }
    }
}

impl std::str::FromStr for VideoContainer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avi" => Ok(VideoContainer::Avi),
            "gif" => Ok(VideoContainer::Gif),
            other => Err(format!("unknown container '{other}' (expected avi or gif)")),
        }
    }
}

/// Create a video file and its encoder.
pub fn create_video_file(
    container: VideoContainer,
    path: &Path,
    width: u32,
    height: u32,
    fps: u32,
) -> io::Result<Box<dyn VideoSink>> {
    let file = BufWriter::new(File::create(path)?);
    let sink: Box<dyn VideoSink> = match container {
        VideoContainer::Avi => Box::new(AviWriter::new(file, width, height, fps)?),
        VideoContainer::Gif => Box::new(GifWriter::new(file, width, height, fps)?),
    };
    Ok(sink)
}

/// An all-black frame, used to prime a freshly opened encoder.
pub fn black_frame(width: u32, height: u32) -> Vec<u8> {
    vec![0u8; width as usize * height as usize * 3]
}

fn check_frame_len(frame: &[u8], width: u32, height: u32) -> io::Result<()> {
    let expected = width as usize * height as usize * 3;
    if frame.len() != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame is {} bytes, expected {}", frame.len(), expected),
        ));
    }
    Ok(())
}
