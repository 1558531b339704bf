//! Uncompressed AVI writer
//!
//! # File Structure
//!
//! ```text
//! RIFF 'AVI '
//! ├─ LIST 'hdrl'
//! │  ├─ avih            main header (frame count patched on finish)
//! │  └─ LIST 'strl'
//! │     ├─ strh         'vids' stream header (length patched on finish)
//! │     └─ strf         BITMAPINFOHEADER, 24-bit BI_RGB, negative height
//! ├─ LIST 'movi'
//! │  └─ 00db ...        one chunk per frame, rows padded to 4 bytes
//! └─ idx1               one entry per frame, offsets relative to 'movi'
//! ```
//!
//! A negative `biHeight` marks the DIB as top-down, so BGR frames are stored
//! exactly as the recorder produces them.
//!
//! Every RIFF size and index offset is a `u32`, which caps a file at 4 GiB
//! (about 5 minutes of 640x360 at 20 fps). A frame that would push the file
//! past that limit is rejected with `ErrorKind::FileTooLarge` before any of
//! its bytes are written, so the file still finalizes cleanly with the frames
//! accepted so far.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Seek, SeekFrom, Write};

use super::{VideoSink, check_frame_len};

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;
const AVIH_SIZE: u32 = 56;
const STRH_SIZE: u32 = 56;
const STRF_SIZE: u32 = 40;
/// Largest value a RIFF size field can hold
const MAX_RIFF_SIZE: u64 = u32::MAX as u64;
/// Bytes per idx1 entry
const INDEX_ENTRY_SIZE: u64 = 16;

/// Index entry for one written frame
struct IndexEntry {
    /// Chunk offset relative to the 'movi' fourcc
    offset: u32,
    size: u32,
}

/// File positions of header fields rewritten by `finish`
struct PatchOffsets {
    riff_size: u64,
    total_frames: u64,
    stream_length: u64,
    movi_size: u64,
    movi_fourcc: u64,
}

/// Writer for uncompressed 24-bit AVI files
pub struct AviWriter<W: Write + Seek> {
    writer: W,
    width: u32,
    height: u32,
    row_stride: usize,
    /// Padded bytes per frame chunk
    frame_bytes: u32,
    index: Vec<IndexEntry>,
    patch: PatchOffsets,
    row_buffer: Vec<u8>,
}

impl<W: Write + Seek> AviWriter<W> {
    /// Create a writer and emit the file header.
    pub fn new(mut writer: W, width: u32, height: u32, fps: u32) -> io::Result<Self> {
        if width == 0 || height == 0 || fps == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "avi requires non-zero width, height, and fps",
            ));
        }
        let row_stride = (width as usize * 3).div_ceil(4) * 4;
        let frame_bytes = u32::try_from(row_stride * height as usize)
            .map_err(|_| too_large(format!("a {width}x{height} frame does not fit an avi chunk")))?;

        writer.write_all(b"RIFF")?;
        let riff_size = writer.stream_position()?;
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_all(b"AVI ")?;

        // hdrl = 'hdrl' + avih chunk + strl list
        let strl_size = 4 + (8 + STRH_SIZE) + (8 + STRF_SIZE);
        let hdrl_size = 4 + (8 + AVIH_SIZE) + (8 + strl_size);
        writer.write_all(b"LIST")?;
        writer.write_u32::<LittleEndian>(hdrl_size)?;
        writer.write_all(b"hdrl")?;

        writer.write_all(b"avih")?;
        writer.write_u32::<LittleEndian>(AVIH_SIZE)?;
        writer.write_u32::<LittleEndian>(1_000_000 / fps)?; // dwMicroSecPerFrame
        writer.write_u32::<LittleEndian>(frame_bytes.saturating_mul(fps))?; // dwMaxBytesPerSec
        writer.write_u32::<LittleEndian>(0)?; // dwPaddingGranularity
        writer.write_u32::<LittleEndian>(AVIF_HASINDEX)?;
        let total_frames = writer.stream_position()?;
        writer.write_u32::<LittleEndian>(0)?; // dwTotalFrames
        writer.write_u32::<LittleEndian>(0)?; // dwInitialFrames
        writer.write_u32::<LittleEndian>(1)?; // dwStreams
        writer.write_u32::<LittleEndian>(frame_bytes)?; // dwSuggestedBufferSize
        writer.write_u32::<LittleEndian>(width)?;
        writer.write_u32::<LittleEndian>(height)?;
        writer.write_all(&[0u8; 16])?; // dwReserved[4]

        writer.write_all(b"LIST")?;
        writer.write_u32::<LittleEndian>(strl_size)?;
        writer.write_all(b"strl")?;

        writer.write_all(b"strh")?;
        writer.write_u32::<LittleEndian>(STRH_SIZE)?;
        writer.write_all(b"vids")?;
        writer.write_all(b"DIB ")?;
        writer.write_u32::<LittleEndian>(0)?; // dwFlags
        writer.write_u16::<LittleEndian>(0)?; // wPriority
        writer.write_u16::<LittleEndian>(0)?; // wLanguage
        writer.write_u32::<LittleEndian>(0)?; // dwInitialFrames
        writer.write_u32::<LittleEndian>(1)?; // dwScale
        writer.write_u32::<LittleEndian>(fps)?; // dwRate
        writer.write_u32::<LittleEndian>(0)?; // dwStart
        let stream_length = writer.stream_position()?;
        writer.write_u32::<LittleEndian>(0)?; // dwLength
        writer.write_u32::<LittleEndian>(frame_bytes)?; // dwSuggestedBufferSize
        writer.write_u32::<LittleEndian>(u32::MAX)?; // dwQuality (default)
        writer.write_u32::<LittleEndian>(0)?; // dwSampleSize
        writer.write_i16::<LittleEndian>(0)?; // rcFrame
        writer.write_i16::<LittleEndian>(0)?;
        writer.write_i16::<LittleEndian>(width.min(i16::MAX as u32) as i16)?;
        writer.write_i16::<LittleEndian>(height.min(i16::MAX as u32) as i16)?;

        writer.write_all(b"strf")?;
        writer.write_u32::<LittleEndian>(STRF_SIZE)?;
        writer.write_u32::<LittleEndian>(STRF_SIZE)?; // biSize
        writer.write_i32::<LittleEndian>(width as i32)?;
        writer.write_i32::<LittleEndian>(-(height as i32))?; // top-down
        writer.write_u16::<LittleEndian>(1)?; // biPlanes
        writer.write_u16::<LittleEndian>(24)?; // biBitCount
        writer.write_u32::<LittleEndian>(0)?; // BI_RGB
        writer.write_u32::<LittleEndian>(frame_bytes)?;
        writer.write_i32::<LittleEndian>(0)?;
        writer.write_i32::<LittleEndian>(0)?;
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_u32::<LittleEndian>(0)?;

        writer.write_all(b"LIST")?;
        let movi_size = writer.stream_position()?;
        writer.write_u32::<LittleEndian>(0)?;
        let movi_fourcc = writer.stream_position()?;
        writer.write_all(b"movi")?;

        Ok(Self {
            writer,
            width,
            height,
            row_stride,
            frame_bytes,
            index: Vec::new(),
            patch: PatchOffsets {
                riff_size,
                total_frames,
                stream_length,
                movi_size,
                movi_fourcc,
            },
            row_buffer: vec![0u8; row_stride],
        })
    }

    /// Write the index and patch the header counts.
    ///
    /// Returns the inner writer positioned at the end of the file.
    pub fn finalize(mut self) -> io::Result<W> {
        let idx1_start = self.writer.stream_position()?;
        let idx1_len = u32::try_from(self.index.len() as u64 * INDEX_ENTRY_SIZE)
            .map_err(|_| invalid_layout("idx1 size"))?;
        self.writer.write_all(b"idx1")?;
        self.writer.write_u32::<LittleEndian>(idx1_len)?;
        for entry in &self.index {
            self.writer.write_all(b"00db")?;
            self.writer.write_u32::<LittleEndian>(AVIIF_KEYFRAME)?;
            self.writer.write_u32::<LittleEndian>(entry.offset)?;
            self.writer.write_u32::<LittleEndian>(entry.size)?;
        }
        let end = self.writer.stream_position()?;

        let frames = u32::try_from(self.index.len()).map_err(|_| invalid_layout("frame count"))?;
        let movi_len = u32::try_from(idx1_start - self.patch.movi_fourcc)
            .map_err(|_| invalid_layout("movi size"))?;
        let riff_len = u32::try_from(end - 8).map_err(|_| invalid_layout("riff size"))?;
        self.patch_u32(self.patch.riff_size, riff_len)?;
        self.patch_u32(self.patch.total_frames, frames)?;
        self.patch_u32(self.patch.stream_length, frames)?;
        self.patch_u32(self.patch.movi_size, movi_len)?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn patch_u32(&mut self, pos: u64, value: u32) -> io::Result<()> {
        self.writer.seek(SeekFrom::Start(pos))?;
        self.writer.write_u32::<LittleEndian>(value)
    }
}

fn too_large(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::FileTooLarge, msg)
}

// Unreachable while write_frame enforces the size limit
fn invalid_layout(field: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("avi {field} exceeds the 32-bit RIFF limit"),
    )
}

impl<W: Write + Seek> VideoSink for AviWriter<W> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        check_frame_len(frame, self.width, self.height)?;

        let chunk_start = self.writer.stream_position()?;
        let size = self.frame_bytes;

        // The chunk, its index entry, and the idx1 header must all fit
        let entries = self.index.len() as u64 + 1;
        let file_end = chunk_start + 8 + u64::from(size) + 8 + entries * INDEX_ENTRY_SIZE;
        if file_end - 8 > MAX_RIFF_SIZE {
            return Err(too_large(format!(
                "avi file would exceed 4 GiB after {} frames",
                self.index.len()
            )));
        }
        let offset = u32::try_from(chunk_start - self.patch.movi_fourcc)
            .map_err(|_| invalid_layout("chunk offset"))?;

        self.writer.write_all(b"00db")?;
        self.writer.write_u32::<LittleEndian>(size)?;

        let packed = self.width as usize * 3;
        for row in frame.chunks_exact(packed) {
            self.row_buffer[..packed].copy_from_slice(row);
            self.writer.write_all(&self.row_buffer)?;
        }

        self.index.push(IndexEntry { offset, size });
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.index.len() as u64
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.finalize().map(drop)
    }
}
