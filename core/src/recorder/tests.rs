//! Tests for SessionRecorder

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{HostSignal, RecorderState, SessionRecorder, TickOutcome};
use crate::config::RecorderConfig;
use crate::error::{RecorderError, Result};
use crate::input::{ActionSampler, InputAccumulator, KeyboardState, MouseButtons, MouseState};
use crate::source::{FrameSource, required_buffer_size};
use crate::video::VideoSink;
#[cfg(target_os = "linux")]
use crate::verify::count_avi_frames;
#[cfg(target_os = "linux")]
use crate::writer::FileSinks;
use crate::writer::SinkProvider;

// ============================================================================
// Test collaborators
// ============================================================================

/// Everything written for one session
#[derive(Default)]
struct SessionJournal {
    video_path: PathBuf,
    log_path: PathBuf,
    frames: Vec<Vec<u8>>,
    log: Vec<u8>,
    video_released: u32,
    log_flushes: u32,
}

impl SessionJournal {
    fn lines(&self) -> Vec<serde_json::Value> {
        String::from_utf8(self.log.clone())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

#[derive(Default)]
struct Failures {
    /// Fail the video write once this many frames (priming included) exist
    video_write_at: Option<usize>,
    log_write: bool,
    log_open: bool,
}

#[derive(Default, Clone)]
struct MemSinks {
    sessions: Rc<RefCell<Vec<SessionJournal>>>,
    failures: Rc<RefCell<Failures>>,
    prepared_dirs: Rc<RefCell<Vec<PathBuf>>>,
}

struct MemVideo {
    sessions: Rc<RefCell<Vec<SessionJournal>>>,
    failures: Rc<RefCell<Failures>>,
    index: usize,
}

impl VideoSink for MemVideo {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut sessions = self.sessions.borrow_mut();
        let journal = &mut sessions[self.index];
        if self.failures.borrow().video_write_at == Some(journal.frames.len()) {
            return Err(io::Error::other("encoder rejected frame"));
        }
        journal.frames.push(frame.to_vec());
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.sessions.borrow()[self.index].frames.len() as u64
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.sessions.borrow_mut()[self.index].video_released += 1;
        Ok(())
    }
}

struct MemLog {
    sessions: Rc<RefCell<Vec<SessionJournal>>>,
    failures: Rc<RefCell<Failures>>,
    index: usize,
}

impl Write for MemLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failures.borrow().log_write {
            return Err(io::Error::other("disk full"));
        }
        self.sessions.borrow_mut()[self.index]
            .log
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sessions.borrow_mut()[self.index].log_flushes += 1;
        Ok(())
    }
}

impl SinkProvider for MemSinks {
    fn prepare_dir(&mut self, dir: &Path) -> io::Result<()> {
        self.prepared_dirs.borrow_mut().push(dir.to_path_buf());
        Ok(())
    }

    fn open_video(
        &mut self,
        path: &Path,
        _config: &RecorderConfig,
    ) -> io::Result<Box<dyn VideoSink>> {
        let mut sessions = self.sessions.borrow_mut();
        sessions.push(SessionJournal {
            video_path: path.to_path_buf(),
            ..Default::default()
        });
        Ok(Box::new(MemVideo {
            sessions: self.sessions.clone(),
            failures: self.failures.clone(),
            index: sessions.len() - 1,
        }))
    }

    fn open_log(&mut self, path: &Path) -> io::Result<Box<dyn Write>> {
        if self.failures.borrow().log_open {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        let mut sessions = self.sessions.borrow_mut();
        let index = sessions.len() - 1;
        sessions[index].log_path = path.to_path_buf();
        Ok(Box::new(MemLog {
            sessions: self.sessions.clone(),
            failures: self.failures.clone(),
            index,
        }))
    }
}

/// Source returning a constant fill, or a caller-supplied pattern
struct TestSource {
    width: u32,
    height: u32,
    fill: u8,
    pattern: Option<Vec<u8>>,
    calls: Rc<Cell<u32>>,
    fail: bool,
}

impl TestSource {
    fn new(width: u32, height: u32, fill: u8) -> Self {
        Self {
            width,
            height,
            fill,
            pattern: None,
            calls: Rc::new(Cell::new(0)),
            fail: false,
        }
    }
}

impl FrameSource for TestSource {
    fn required_buffer_size(&self) -> usize {
        required_buffer_size(self.width, self.height, false)
    }

    fn get_frame(&mut self, buf: &mut [u8]) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(RecorderError::Capture("readback failed".to_string()));
        }
        match &self.pattern {
            Some(pattern) => buf.copy_from_slice(pattern),
            None => buf.fill(self.fill),
        }
        Ok(())
    }
}

/// Sampler returning empty state and counting reads
#[derive(Default)]
struct CountingSampler {
    mouse_reads: Rc<Cell<u32>>,
    keyboard_reads: Rc<Cell<u32>>,
}

impl ActionSampler for CountingSampler {
    fn sample_mouse(&mut self) -> MouseState {
        self.mouse_reads.set(self.mouse_reads.get() + 1);
        MouseState::default()
    }

    fn sample_keyboard(&mut self) -> KeyboardState {
        self.keyboard_reads.set(self.keyboard_reads.get() + 1);
        KeyboardState::default()
    }
}

fn small_config() -> RecorderConfig {
    RecorderConfig {
        width: 2,
        height: 2,
        fps: 1,
        prefix: "test".to_string(),
        mark_ticks: false,
        output_dir: Some(PathBuf::from("/mem")),
        ..Default::default()
    }
}

type TestRecorder<S> = SessionRecorder<TestSource, S, MemSinks>;

fn recorder_with<S: ActionSampler>(
    config: RecorderConfig,
    source: TestSource,
    sampler: S,
) -> (TestRecorder<S>, MemSinks) {
    let sinks = MemSinks::default();
    let recorder = SessionRecorder::with_provider(config, source, sampler, sinks.clone());
    (recorder, sinks)
}

fn small_recorder() -> (TestRecorder<CountingSampler>, MemSinks) {
    recorder_with(
        small_config(),
        TestSource::new(2, 2, 0x10),
        CountingSampler::default(),
    )
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_three_ticks_then_death() {
    let (mut recorder, sinks) = small_recorder();
    assert_eq!(recorder.state(), RecorderState::Idle);

    for expected in 1..=3 {
        let outcome = recorder.on_tick(HostSignal::RUNNING).unwrap();
        assert_eq!(outcome, TickOutcome::Recorded { tick: expected });
    }
    assert_eq!(recorder.tick_counter(), 3);
    assert_eq!(recorder.state(), RecorderState::Active);

    let outcome = recorder.on_tick(HostSignal::DEAD).unwrap();
    let TickOutcome::Finished(summary) = outcome else {
        panic!("expected Finished, got {outcome:?}");
    };
    assert_eq!(summary.frames, 3);
    assert_eq!(recorder.state(), RecorderState::Idle);

    let sessions = sinks.sessions.borrow();
    assert_eq!(sessions.len(), 1);
    let journal = &sessions[0];

    // Priming frame + 3 recorded frames
    assert_eq!(journal.frames.len(), 4);
    assert_eq!(journal.frames[0], vec![0u8; 12]);
    for frame in &journal.frames[1..] {
        assert_eq!(frame, &vec![0x10u8; 12]);
    }

    let lines = journal.lines();
    assert_eq!(lines.len(), 3);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["tick"], (i + 1) as u64);
        assert!(line["mouse"].is_object());
        assert!(line["keyboard"].is_object());
    }

    assert_eq!(journal.video_released, 1);
    // Each record is flushed as written, then once more at close
    assert_eq!(journal.log_flushes, 4);
    assert_eq!(summary.video_path, journal.video_path);
    assert_eq!(summary.log_path, journal.log_path);
}

#[test]
fn test_dead_ticks_after_finish_write_nothing() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.on_tick(HostSignal::DEAD).unwrap();

    for _ in 0..3 {
        assert_eq!(
            recorder.on_tick(HostSignal::DEAD).unwrap(),
            TickOutcome::Idle
        );
        assert_eq!(
            recorder.on_tick(HostSignal::new(false, true)).unwrap(),
            TickOutcome::Idle
        );
    }

    let sessions = sinks.sessions.borrow();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].frames.len(), 2);
    assert_eq!(sessions[0].video_released, 1);
}

#[test]
fn test_dead_while_idle_opens_nothing() {
    let (mut recorder, sinks) = small_recorder();
    assert_eq!(
        recorder.on_tick(HostSignal::DEAD).unwrap(),
        TickOutcome::Idle
    );
    assert!(sinks.sessions.borrow().is_empty());
    assert!(sinks.prepared_dirs.borrow().is_empty());
}

#[test]
fn test_restart_after_death_gets_fresh_session() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    let first_stem = recorder.session_stem().unwrap().to_string();
    recorder.on_tick(HostSignal::DEAD).unwrap();

    let outcome = recorder.on_tick(HostSignal::RUNNING).unwrap();
    assert_eq!(outcome, TickOutcome::Recorded { tick: 1 });
    assert_eq!(recorder.tick_counter(), 1);
    let second_stem = recorder.session_stem().unwrap().to_string();
    assert_ne!(first_stem, second_stem);
    assert!(second_stem.starts_with("test."));

    let sessions = sinks.sessions.borrow();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].video_released, 1);
    assert_eq!(sessions[1].video_released, 0);
    assert_ne!(sessions[0].video_path, sessions[1].video_path);
    assert_eq!(sessions[1].lines()[0]["tick"], 1);
}

#[test]
fn test_finish_while_idle_is_an_error() {
    let (mut recorder, _sinks) = small_recorder();
    assert!(matches!(recorder.finish(), Err(RecorderError::NotRecording)));
}

#[test]
fn test_finish_runs_once_per_session() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    recorder.finish().unwrap();
    assert!(matches!(recorder.finish(), Err(RecorderError::NotRecording)));
    assert_eq!(
        recorder.on_tick(HostSignal::DEAD).unwrap(),
        TickOutcome::Idle
    );
    assert_eq!(sinks.sessions.borrow()[0].video_released, 1);
}

#[test]
fn test_paths_follow_prefix_and_container() {
    let (mut recorder, _sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    let paths = recorder.session_paths().unwrap().clone();
    assert_eq!(paths.video.parent(), Some(Path::new("/mem")));
    let video_name = paths.video.file_name().unwrap().to_str().unwrap();
    let log_name = paths.log.file_name().unwrap().to_str().unwrap();
    assert!(video_name.starts_with("test.") && video_name.ends_with(".avi"));
    assert_eq!(
        video_name.trim_end_matches(".avi"),
        log_name.trim_end_matches(".jsonl")
    );
}

// ============================================================================
// Pause
// ============================================================================

#[test]
fn test_pause_drains_without_recording() {
    let sampler = CountingSampler::default();
    let mouse_reads = sampler.mouse_reads.clone();
    let keyboard_reads = sampler.keyboard_reads.clone();
    let source = TestSource::new(2, 2, 0x10);
    let captures = source.calls.clone();
    let (mut recorder, sinks) = recorder_with(small_config(), source, sampler);

    recorder.on_tick(HostSignal::RUNNING).unwrap();
    assert_eq!(mouse_reads.get(), 1);

    for i in 1..=5 {
        let outcome = recorder.on_tick(HostSignal::PAUSED).unwrap();
        assert_eq!(outcome, TickOutcome::Drained);
        assert_eq!(recorder.state(), RecorderState::Paused);
        assert_eq!(recorder.tick_counter(), 1);
        assert_eq!(mouse_reads.get(), 1 + i);
        assert_eq!(keyboard_reads.get(), 1 + i);
    }
    assert_eq!(captures.get(), 1);
    {
        let sessions = sinks.sessions.borrow();
        assert_eq!(sessions[0].frames.len(), 2);
        assert_eq!(sessions[0].lines().len(), 1);
    }

    // Resuming continues the tick sequence
    let outcome = recorder.on_tick(HostSignal::RUNNING).unwrap();
    assert_eq!(outcome, TickOutcome::Recorded { tick: 2 });
    assert_eq!(recorder.state(), RecorderState::Active);
    let sessions = sinks.sessions.borrow();
    assert_eq!(sessions[0].lines()[1]["tick"], 2);
}

#[test]
fn test_first_tick_paused_opens_session_only() {
    let (mut recorder, sinks) = small_recorder();
    let outcome = recorder.on_tick(HostSignal::PAUSED).unwrap();
    assert_eq!(outcome, TickOutcome::Drained);
    assert_eq!(recorder.state(), RecorderState::Paused);
    assert_eq!(recorder.tick_counter(), 0);

    let sessions = sinks.sessions.borrow();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].frames.len(), 1); // priming only
    assert!(sessions[0].log.is_empty());
}

#[test]
fn test_death_while_paused_finishes() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.on_tick(HostSignal::PAUSED).unwrap();

    let outcome = recorder.on_tick(HostSignal::new(false, true)).unwrap();
    assert!(matches!(outcome, TickOutcome::Finished(ref s) if s.frames == 1));
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(sinks.sessions.borrow()[0].video_released, 1);
}

#[test]
fn test_input_during_pause_is_dropped() {
    let (mut recorder, sinks) = recorder_with(
        small_config(),
        TestSource::new(2, 2, 0x10),
        InputAccumulator::new(),
    );
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    // Events between the last recorded tick and a paused tick are drained
    recorder.sampler_mut().move_pointer(4.0, 0.0);
    recorder.sampler_mut().scroll(2.0);
    recorder.sampler_mut().press_button(MouseButtons::LEFT);
    recorder.sampler_mut().press_key("E");
    recorder.sampler_mut().type_char('e');
    recorder.on_tick(HostSignal::PAUSED).unwrap();

    recorder.on_tick(HostSignal::RUNNING).unwrap();

    let sessions = sinks.sessions.borrow();
    let lines = sessions[0].lines();
    let resumed = &lines[1];
    assert_eq!(resumed["tick"], 2);
    assert_eq!(resumed["mouse"]["dx"], 0.0);
    assert_eq!(resumed["mouse"]["dwheel"], 0.0);
    assert_eq!(resumed["mouse"]["new_buttons"], serde_json::json!([]));
    assert_eq!(resumed["keyboard"]["new_keys"], serde_json::json!([]));
    assert_eq!(resumed["keyboard"]["chars"], "");
    // Held state is still reported
    assert_eq!(resumed["mouse"]["buttons"], serde_json::json!([0]));
    assert_eq!(resumed["keyboard"]["keys"], serde_json::json!(["E"]));
    assert_eq!(resumed["mouse"]["x"], 4.0);
}

#[test]
fn test_input_between_active_ticks_is_recorded() {
    let (mut recorder, sinks) = recorder_with(
        small_config(),
        TestSource::new(2, 2, 0x10),
        InputAccumulator::new(),
    );
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.sampler_mut().move_pointer(-1.5, 3.0);
    recorder.sampler_mut().press_key("W");
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    let lines = sinks.sessions.borrow()[0].lines();
    assert_eq!(lines[1]["mouse"]["dx"], -1.5);
    assert_eq!(lines[1]["keyboard"]["new_keys"], serde_json::json!(["W"]));
    assert_eq!(lines[2]["mouse"]["dx"], 0.0);
    assert_eq!(lines[2]["keyboard"]["new_keys"], serde_json::json!([]));
}

// ============================================================================
// Frame pipeline
// ============================================================================

#[test]
fn test_written_frame_is_flipped_and_swapped() {
    let (w, h) = (3u32, 2u32);
    let mut pattern = vec![0u8; (w * h * 3) as usize];
    pattern[0..3].copy_from_slice(&[255, 0, 0]); // row 0, col 0 in source order
    let mut source = TestSource::new(w, h, 0);
    source.pattern = Some(pattern);

    let config = RecorderConfig {
        width: w,
        height: h,
        ..small_config()
    };
    let (mut recorder, sinks) = recorder_with(config, source, CountingSampler::default());
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    let sessions = sinks.sessions.borrow();
    let written = &sessions[0].frames[1];
    let last_row = ((h - 1) * w * 3) as usize;
    assert_eq!(&written[last_row..last_row + 3], &[0, 0, 255]);
    assert_eq!(&written[0..3], &[0, 0, 0]);
}

#[test]
fn test_mark_ticks_burns_counter_into_frames() {
    let config = RecorderConfig {
        width: 128,
        height: 40,
        mark_ticks: true,
        ..small_config()
    };
    let (mut recorder, sinks) = recorder_with(
        config,
        TestSource::new(128, 40, 0),
        CountingSampler::default(),
    );
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    let sessions = sinks.sessions.borrow();
    let frames = &sessions[0].frames;
    // Priming frame stays black
    assert!(frames[0].iter().all(|&b| b == 0));
    assert!(frames[1].iter().any(|&b| b == 255));
    // "tick 0" and "tick 1" differ
    assert_ne!(frames[1], frames[2]);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_video_write_failure_is_fatal() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    // Priming + 2 frames exist; the third recorded frame fails
    sinks.failures.borrow_mut().video_write_at = Some(3);
    let err = recorder.on_tick(HostSignal::RUNNING).unwrap_err();
    assert!(matches!(err, RecorderError::VideoWrite(_)));
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert!(matches!(recorder.finish(), Err(RecorderError::NotRecording)));

    let sessions = sinks.sessions.borrow();
    let journal = &sessions[0];
    assert_eq!(journal.frames.len(), 3);
    assert_eq!(journal.lines().len(), 2);
    assert_eq!(journal.video_released, 1);
    assert_eq!(journal.log_flushes, 3);
}

#[test]
fn test_log_write_failure_is_fatal() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    sinks.failures.borrow_mut().log_write = true;
    let err = recorder.on_tick(HostSignal::RUNNING).unwrap_err();
    assert!(matches!(err, RecorderError::LogWrite(_)));
    assert!(!recorder.is_recording());
    assert_eq!(recorder.tick_counter(), 0);
    assert_eq!(sinks.sessions.borrow()[0].video_released, 1);
}

#[test]
fn test_capture_failure_writes_nothing() {
    let mut source = TestSource::new(2, 2, 0x10);
    source.fail = true;
    let sampler = CountingSampler::default();
    let reads = sampler.mouse_reads.clone();
    let (mut recorder, sinks) = recorder_with(small_config(), source, sampler);

    let err = recorder.on_tick(HostSignal::RUNNING).unwrap_err();
    assert!(matches!(err, RecorderError::Capture(_)));
    assert_eq!(reads.get(), 0);

    let sessions = sinks.sessions.borrow();
    assert_eq!(sessions[0].frames.len(), 1);
    assert!(sessions[0].log.is_empty());
    assert_eq!(sessions[0].video_released, 1);
}

#[test]
fn test_log_open_failure_aborts_start() {
    let (mut recorder, sinks) = small_recorder();
    sinks.failures.borrow_mut().log_open = true;

    let err = recorder.on_tick(HostSignal::RUNNING).unwrap_err();
    assert!(matches!(err, RecorderError::ResourceOpen { .. }));
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(sinks.sessions.borrow()[0].video_released, 1);

    // Once the log can be opened a session starts normally
    sinks.failures.borrow_mut().log_open = false;
    assert_eq!(
        recorder.on_tick(HostSignal::RUNNING).unwrap(),
        TickOutcome::Recorded { tick: 1 }
    );
}

#[test]
fn test_source_size_mismatch_aborts_start() {
    let (mut recorder, sinks) = recorder_with(
        small_config(),
        TestSource::new(4, 4, 0),
        CountingSampler::default(),
    );
    let err = recorder.on_tick(HostSignal::RUNNING).unwrap_err();
    assert!(matches!(
        err,
        RecorderError::FrameSize {
            expected: 12,
            actual: 48
        }
    ));
    assert!(sinks.sessions.borrow().is_empty());
}

#[test]
fn test_invalid_config_aborts_start() {
    let config = RecorderConfig {
        fps: 0,
        ..small_config()
    };
    let (mut recorder, sinks) =
        recorder_with(config, TestSource::new(2, 2, 0), CountingSampler::default());
    assert!(matches!(
        recorder.on_tick(HostSignal::RUNNING),
        Err(RecorderError::InvalidConfig(_))
    ));
    assert!(sinks.sessions.borrow().is_empty());
}

/// Real files, except the action log goes to a device that is always full.
#[cfg(target_os = "linux")]
struct FullDiskLog;

#[cfg(target_os = "linux")]
impl SinkProvider for FullDiskLog {
    fn prepare_dir(&mut self, dir: &Path) -> io::Result<()> {
        FileSinks.prepare_dir(dir)
    }

    fn open_video(
        &mut self,
        path: &Path,
        config: &RecorderConfig,
    ) -> io::Result<Box<dyn VideoSink>> {
        FileSinks.open_video(path, config)
    }

    fn open_log(&mut self, _path: &Path) -> io::Result<Box<dyn Write>> {
        FileSinks.open_log(Path::new("/dev/full"))
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_full_disk_fails_the_tick_that_hit_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = RecorderConfig {
        output_dir: Some(dir.path().to_path_buf()),
        ..small_config()
    };
    let mut recorder = SessionRecorder::with_provider(
        config,
        TestSource::new(2, 2, 0x10),
        CountingSampler::default(),
        FullDiskLog,
    );

    let err = recorder.on_tick(HostSignal::RUNNING).unwrap_err();
    assert!(matches!(err, RecorderError::LogWrite(_)), "{err}");
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.tick_counter(), 0);

    // The video was finalized on abort and is still readable
    let video = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == "avi"))
        .unwrap();
    // Priming frame plus the frame of the failed tick
    assert_eq!(count_avi_frames(&video).unwrap(), 2);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_change_applies_to_next_session() {
    let (mut recorder, sinks) = small_recorder();
    recorder.on_tick(HostSignal::RUNNING).unwrap();

    recorder.set_config(RecorderConfig {
        mark_ticks: true,
        prefix: "next".to_string(),
        ..small_config()
    });
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    assert!(recorder.session_stem().unwrap().starts_with("test."));

    recorder.on_tick(HostSignal::DEAD).unwrap();
    recorder.on_tick(HostSignal::RUNNING).unwrap();
    assert!(recorder.session_stem().unwrap().starts_with("next."));
    assert_eq!(recorder.config().prefix, "next");
    assert_eq!(sinks.prepared_dirs.borrow().len(), 2);
}
