//! Paired video + action-log output
//!
//! A [`StreamWriter`] exclusively owns the two sinks of one session. It is
//! released through [`StreamWriter::close`], which always attempts to release
//! both sinks even if the first release fails.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use crate::record::ActionRecord;
use crate::session::SessionPaths;
use crate::video::{self, VideoSink};

/// Opens the sinks for a new session.
pub trait SinkProvider {
    /// Make sure `dir` exists before any sink is opened in it.
    fn prepare_dir(&mut self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }

    /// Open the video sink at the configured resolution and frame rate.
    fn open_video(&mut self, path: &Path, config: &RecorderConfig)
    -> io::Result<Box<dyn VideoSink>>;

    /// Open the action log for appending.
    fn open_log(&mut self, path: &Path) -> io::Result<Box<dyn Write>>;
}

/// Sinks backed by files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSinks;

impl SinkProvider for FileSinks {
    fn prepare_dir(&mut self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn open_video(
        &mut self,
        path: &Path,
        config: &RecorderConfig,
    ) -> io::Result<Box<dyn VideoSink>> {
        video::create_video_file(config.container, path, config.width, config.height, config.fps)
    }

    fn open_log(&mut self, path: &Path) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Counts reported when a writer closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCounts {
    /// Frames written, excluding the priming frame
    pub frames: u64,
    /// Action log lines written
    pub records: u64,
}

/// Owner of one session's video sink and action log.
pub struct StreamWriter {
    video: Option<Box<dyn VideoSink>>,
    log: Option<Box<dyn Write>>,
    paths: SessionPaths,
    frames: u64,
    records: u64,
}

impl StreamWriter {
    /// Open both sinks and prime the video encoder.
    ///
    /// The video sink is opened first and receives one black frame so the
    /// encoder commits its header; that frame is not counted. If the log
    /// cannot be opened afterwards the video sink is released again and no
    /// session exists.
    pub fn open<P: SinkProvider + ?Sized>(
        provider: &mut P,
        paths: SessionPaths,
        config: &RecorderConfig,
    ) -> Result<Self> {
        let mut video = provider
            .open_video(&paths.video, config)
            .map_err(|source| RecorderError::ResourceOpen {
                path: paths.video.clone(),
                source,
            })?;

        if let Err(source) = video.write_frame(&video::black_frame(config.width, config.height)) {
            release_video(video);
            return Err(RecorderError::ResourceOpen {
                path: paths.video.clone(),
                source,
            });
        }
        tracing::debug!("Primed video encoder: {}", paths.video.display());

        let log = match provider.open_log(&paths.log) {
            Ok(log) => log,
            Err(source) => {
                release_video(video);
                return Err(RecorderError::ResourceOpen {
                    path: paths.log.clone(),
                    source,
                });
            }
        };

        Ok(Self {
            video: Some(video),
            log: Some(log),
            paths,
            frames: 0,
            records: 0,
        })
    }

    pub fn paths(&self) -> &SessionPaths {
        &self.paths
    }

    /// Frames written so far, excluding the priming frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Action records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Append the next frame to the video sink.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let video = self
            .video
            .as_mut()
            .ok_or_else(|| RecorderError::VideoWrite(closed_error()))?;
        video.write_frame(frame).map_err(RecorderError::VideoWrite)?;
        self.frames += 1;
        Ok(())
    }

    /// Append one record, newline-terminated, to the action log.
    ///
    /// The line is flushed through any buffering before it is counted, so a
    /// full disk fails the tick that wrote it rather than a later one.
    pub fn write_record(&mut self, record: &ActionRecord) -> Result<()> {
        let line = record.to_json_line()?;
        let log = self
            .log
            .as_mut()
            .ok_or_else(|| RecorderError::LogWrite(closed_error()))?;
        log.write_all(&line)
            .and_then(|()| log.flush())
            .map_err(RecorderError::LogWrite)?;
        self.records += 1;
        Ok(())
    }

    /// Flush and close the log, then finalize and release the video.
    ///
    /// Both releases are attempted regardless of the other's outcome. A
    /// container whose frame count disagrees with the frames written here is
    /// reported as a video release failure.
    pub fn close(mut self) -> Result<StreamCounts> {
        self.release()?;
        Ok(StreamCounts {
            frames: self.frames,
            records: self.records,
        })
    }

    fn release(&mut self) -> Result<()> {
        let log = match self.log.take() {
            Some(mut log) => log.flush().err(),
            None => None,
        };
        let video = match self.video.take() {
            Some(video) => {
                // The container must hold the priming frame plus every counted frame
                let held = video.frames_written();
                let finished = video.finish();
                match finished {
                    Err(e) => Some(e),
                    Ok(()) if held != self.frames + 1 => Some(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "container holds {held} frames, expected {}",
                            self.frames + 1
                        ),
                    )),
                    Ok(()) => None,
                }
            }
            None => None,
        };

        if video.is_none() && log.is_none() {
            Ok(())
        } else {
            Err(RecorderError::Release { video, log })
        }
    }
}

impl Drop for StreamWriter {
    fn drop(&mut self) {
        if self.video.is_none() && self.log.is_none() {
            return;
        }
        tracing::warn!(
            "Session {} dropped without close, releasing sinks",
            self.paths.stem
        );
        if let Err(e) = self.release() {
            tracing::warn!("Failed to release session sinks: {}", e);
        }
    }
}

fn release_video(video: Box<dyn VideoSink>) {
    if let Err(e) = video.finish() {
        tracing::warn!("Failed to release video sink: {}", e);
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "sink already released")
}
