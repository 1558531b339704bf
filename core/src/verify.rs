//! Offline check of a recorded session
//!
//! Reads a finished video and its action log back from disk and confirms that
//! frame N (priming frame excluded) pairs with log line N carrying `tick == N`.

use anyhow::{Context, Result, bail};
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::record::ActionRecord;
use crate::session::LOG_EXTENSION;
use crate::video::VideoContainer;

/// A single way in which a session fails the pairing check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The video holds no frames at all, not even the priming frame
    MissingPrimingFrame,
    /// Recorded frames and log lines disagree
    CountDiffers { frames: u64, lines: u64 },
    /// Line `line` (1-based) carries the wrong tick
    TickOutOfOrder { line: u64, expected: u64, found: u64 },
    /// Line `line` (1-based) is not a valid action record
    Malformed { line: u64, error: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::MissingPrimingFrame => write!(f, "video has no priming frame"),
            Mismatch::CountDiffers { frames, lines } => {
                write!(f, "{frames} recorded frames but {lines} log lines")
            }
            Mismatch::TickOutOfOrder {
                line,
                expected,
                found,
            } => write!(f, "line {line}: expected tick {expected}, found {found}"),
            Mismatch::Malformed { line, error } => write!(f, "line {line}: {error}"),
        }
    }
}

/// Result of [`verify_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub video_path: PathBuf,
    pub log_path: PathBuf,
    pub container: VideoContainer,
    /// Frames in the container, priming frame included
    pub container_frames: u64,
    /// Frames recorded for ticks, priming frame excluded
    pub recorded_frames: u64,
    pub log_lines: u64,
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    /// True when every recorded frame has exactly one matching log line.
    pub fn is_paired(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Default log path for a video: same stem, `.jsonl` extension.
pub fn log_path_for(video_path: &Path) -> PathBuf {
    video_path.with_extension(LOG_EXTENSION)
}

/// Check that a video and action log satisfy the pairing contract.
///
/// I/O and container parse failures are errors. A well-formed pair that
/// does not line up is reported through [`VerifyReport::mismatches`].
pub fn verify_session(video_path: &Path, log_path: &Path) -> Result<VerifyReport> {
    let container = VideoContainer::from_path(video_path).with_context(|| {
        format!(
            "Unrecognized video extension: {}",
            video_path.display()
        )
    })?;

    let container_frames = match container {
        VideoContainer::Avi => count_avi_frames(video_path)?,
        VideoContainer::Gif => count_gif_frames(video_path)?,
    };

    let mut mismatches = Vec::new();
    if container_frames == 0 {
        mismatches.push(Mismatch::MissingPrimingFrame);
    }
    let recorded_frames = container_frames.saturating_sub(1);

    let log = File::open(log_path)
        .with_context(|| format!("Failed to open action log: {}", log_path.display()))?;
    let mut log_lines = 0u64;
    for line in BufReader::new(log).lines() {
        let line =
            line.with_context(|| format!("Failed to read action log: {}", log_path.display()))?;
        log_lines += 1;
        match serde_json::from_str::<ActionRecord>(&line) {
            Ok(record) if record.tick != log_lines => {
                mismatches.push(Mismatch::TickOutOfOrder {
                    line: log_lines,
                    expected: log_lines,
                    found: record.tick,
                });
            }
            Ok(_) => {}
            Err(e) => mismatches.push(Mismatch::Malformed {
                line: log_lines,
                error: e.to_string(),
            }),
        }
    }

    if recorded_frames != log_lines {
        mismatches.push(Mismatch::CountDiffers {
            frames: recorded_frames,
            lines: log_lines,
        });
    }

    tracing::debug!(
        "Verified {}: {} frames, {} lines, {} mismatches",
        video_path.display(),
        recorded_frames,
        log_lines,
        mismatches.len()
    );

    Ok(VerifyReport {
        video_path: video_path.to_path_buf(),
        log_path: log_path.to_path_buf(),
        container,
        container_frames,
        recorded_frames,
        log_lines,
        mismatches,
    })
}

/// Count `00db` chunks inside the `movi` list of an AVI file.
pub fn count_avi_frames(path: &Path) -> Result<u64> {
    let file =
        File::open(path).with_context(|| format!("Failed to open video: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let mut fourcc = [0u8; 4];
    reader.read_exact(&mut fourcc)?;
    let _riff_size = reader.read_u32::<LittleEndian>()?;
    let mut form = [0u8; 4];
    reader.read_exact(&mut form)?;
    if &fourcc != b"RIFF" || &form != b"AVI " {
        bail!("Not an AVI file: {}", path.display());
    }

    loop {
        let Some((id, size)) = read_chunk_header(&mut reader)? else {
            bail!("No movi list in {}", path.display());
        };
        if &id == b"LIST" {
            let mut list_type = [0u8; 4];
            reader.read_exact(&mut list_type)?;
            if &list_type == b"movi" {
                return count_movi_chunks(&mut reader, u64::from(size).saturating_sub(4));
            }
            skip(&mut reader, u64::from(size).saturating_sub(4))?;
        } else {
            skip(&mut reader, padded(size))?;
        }
    }
}

fn count_movi_chunks<R: Read + Seek>(reader: &mut R, list_len: u64) -> Result<u64> {
    let mut frames = 0u64;
    let mut consumed = 0u64;
    while consumed + 8 <= list_len {
        let Some((id, size)) = read_chunk_header(reader)? else {
            break;
        };
        if &id[2..] == b"db" || &id[2..] == b"dc" {
            frames += 1;
        }
        skip(reader, padded(size))?;
        consumed += 8 + padded(size);
    }
    Ok(frames)
}

/// Read a chunk id and size, or `None` at end of file.
fn read_chunk_header<R: Read>(reader: &mut R) -> Result<Option<([u8; 4], u32)>> {
    let mut id = [0u8; 4];
    match reader.read_exact(&mut id) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let size = reader.read_u32::<LittleEndian>()?;
    Ok(Some((id, size)))
}

// RIFF chunks are word aligned
fn padded(size: u32) -> u64 {
    u64::from(size) + u64::from(size & 1)
}

fn skip<R: Seek>(reader: &mut R, len: u64) -> Result<()> {
    let offset = i64::try_from(len).context("Chunk too large")?;
    reader.seek(SeekFrom::Current(offset))?;
    Ok(())
}

/// Count the frames of a GIF file.
pub fn count_gif_frames(path: &Path) -> Result<u64> {
    let file =
        File::open(path).with_context(|| format!("Failed to open video: {}", path.display()))?;
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options
        .read_info(BufReader::new(file))
        .with_context(|| format!("Not a GIF file: {}", path.display()))?;

    let mut frames = 0u64;
    while decoder
        .read_next_frame()
        .with_context(|| format!("Corrupt GIF frame in {}", path.display()))?
        .is_some()
    {
        frames += 1;
    }
    Ok(frames)
}
