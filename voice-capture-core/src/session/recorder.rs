//! The recording session state machine.
//!
//! Owns the capture device, the output sink, the amplitude meter, and the
//! VAD loop, and guarantees exactly one active capture path and at most
//! one VAD loop at a time. Generic over the `CaptureProvider`/
//! `RecordingSink` capability pair so every platform shares one
//! implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::{CaptureFormat, SessionConfig};
use crate::models::error::CaptureError;
use crate::models::events::StatusEvent;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::RecordingState;
use crate::processing::amplitude::compute_db;
use crate::session::meter::{AmplitudeMeter, LevelCell};
use crate::storage::metadata::write_sidecar;
use crate::traits::capture_provider::{CaptureProvider, FrameSource};
use crate::traits::classifier::{validate_threshold, ThresholdSupport, VoiceClassifier};
use crate::traits::recording_sink::RecordingSink;
use crate::traits::session_delegate::SessionDelegate;
use crate::vad::policy::EventPolicy;
use crate::vad::task::VadLoop;

/// Poll interval of the capture writer while the stream is paused.
const PAUSE_POLL: Duration = Duration::from_millis(10);

/// Backoff after a transient read failure on the primary capture path.
const CAPTURE_READ_BACKOFF: Duration = Duration::from_millis(50);

/// Internal mutable session state, protected by `parking_lot::Mutex`.
///
/// Public API methods hold this lock for state transitions only — never
/// across device I/O or thread joins.
struct SessionShared {
    state: RecordingState,
    /// Sticky VAD flag: caller intent, independent of whether the loop is
    /// currently running. Survives pause/resume.
    vad_enabled: bool,
    capture_start: Option<Instant>,
    paused_duration: Duration,
    last_pause: Option<Instant>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            vad_enabled: false,
            capture_start: None,
            paused_duration: Duration::ZERO,
            last_pause: None,
        }
    }

    /// Active (non-paused) recording time so far.
    fn elapsed_duration(&self) -> f64 {
        let Some(start) = self.capture_start else {
            return 0.0;
        };
        let mut paused = self.paused_duration;
        if let Some(pause_start) = self.last_pause {
            paused += pause_start.elapsed();
        }
        start.elapsed().saturating_sub(paused).as_secs_f64()
    }
}

/// Microphone recording session with concurrent voice-activity detection.
///
/// Lifecycle: `start` → (`pause` ↔ `resume`)* → `stop`. Voice activity
/// detection is armed separately via `start_voice_activity_detection` and
/// re-arms itself across pause/resume.
///
/// `start` while already recording fails with `AlreadyRecording`; callers
/// wanting restart semantics stop first.
///
/// Methods take `&mut self`; callers invoking the API from multiple
/// threads wrap the session in their own lock. All delegate callbacks run
/// on background threads.
pub struct RecordingSession<P: CaptureProvider, S: RecordingSink + 'static> {
    provider: P,
    config: SessionConfig,
    format: CaptureFormat,
    sink: Arc<Mutex<S>>,
    classifier: Arc<Mutex<Box<dyn VoiceClassifier>>>,
    delegate: Arc<dyn SessionDelegate>,
    shared: Arc<Mutex<SessionShared>>,
    level: Arc<LevelCell>,

    capture_running: Arc<AtomicBool>,
    capture_active: Arc<AtomicBool>,
    capture_handle: Option<thread::JoinHandle<()>>,
    meter: Option<AmplitudeMeter>,
    vad: Option<VadLoop>,
    output_path: Option<PathBuf>,
}

impl<P: CaptureProvider, S: RecordingSink + 'static> RecordingSession<P, S> {
    pub fn new(
        provider: P,
        sink: S,
        mut classifier: Box<dyn VoiceClassifier>,
        delegate: Arc<dyn SessionDelegate>,
        config: SessionConfig,
    ) -> Result<Self, CaptureError> {
        config.validate()?;
        let _ = classifier.set_threshold(config.voice_threshold)?;

        Ok(Self {
            provider,
            config,
            format: CaptureFormat::default(),
            sink: Arc::new(Mutex::new(sink)),
            classifier: Arc::new(Mutex::new(classifier)),
            delegate,
            shared: Arc::new(Mutex::new(SessionShared::new())),
            level: Arc::new(LevelCell::new()),
            capture_running: Arc::new(AtomicBool::new(false)),
            capture_active: Arc::new(AtomicBool::new(false)),
            capture_handle: None,
            meter: None,
            vad: None,
            output_path: None,
        })
    }

    pub fn state(&self) -> RecordingState {
        self.shared.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    /// Whether the VAD loop thread is currently running.
    pub fn is_voice_activity_active(&self) -> bool {
        self.vad.as_ref().map_or(false, |vad| vad.is_running())
    }

    /// The sticky VAD flag (caller intent, survives pause/resume).
    pub fn is_voice_activity_enabled(&self) -> bool {
        self.shared.lock().vad_enabled
    }

    /// Path of the recording currently being written, if any.
    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    /// Start recording into a fresh file under the configured output
    /// directory. Returns the output path.
    pub fn start(&mut self) -> Result<PathBuf, CaptureError> {
        {
            let shared = self.shared.lock();
            if !shared.state.is_idle() {
                return Err(CaptureError::AlreadyRecording);
            }
        }

        if !self.provider.is_available() {
            return Err(CaptureError::PermissionDenied);
        }

        let source = self.provider.open(&self.format)?;

        let file_name = format!("recording_{}.wav", uuid::Uuid::new_v4());
        let path = self.config.output_directory.join(file_name);
        if let Err(e) = self.sink.lock().open(&path, &self.format) {
            drop(source);
            log::error!("failed to open recording sink: {e}");
            return Err(e);
        }

        self.level.reset();
        {
            let mut shared = self.shared.lock();
            shared.capture_start = Some(Instant::now());
            shared.paused_duration = Duration::ZERO;
            shared.last_pause = None;
            shared.vad_enabled = false;
        }

        self.capture_running.store(true, Ordering::SeqCst);
        self.capture_active.store(true, Ordering::SeqCst);
        self.capture_handle = Some(spawn_capture_writer(
            source,
            Arc::clone(&self.sink),
            Arc::clone(&self.level),
            Arc::clone(&self.shared),
            Arc::clone(&self.delegate),
            Arc::clone(&self.capture_running),
            Arc::clone(&self.capture_active),
            self.format.frame_size,
        ));
        self.meter = Some(AmplitudeMeter::spawn(
            self.config.clamped_amplitude_hz(),
            Arc::clone(&self.level),
            Arc::clone(&self.delegate),
        ));

        self.transition(RecordingState::Recording, Some(StatusEvent::Recording));
        self.output_path = Some(path.clone());
        Ok(path)
    }

    /// Stop recording and finalize the output.
    ///
    /// Valid from every state except Idle. Teardown runs in the fixed
    /// order VAD loop → amplitude meter → capture device, and every step
    /// runs even if an earlier one failed.
    pub fn stop(&mut self) -> Result<RecordingResult, CaptureError> {
        {
            let shared = self.shared.lock();
            if shared.state.is_idle() {
                return Err(CaptureError::NotRecording);
            }
        }
        self.transition(RecordingState::Stopping, None);

        self.teardown_vad(true);
        self.teardown_meter();
        self.teardown_capture();

        let report = self.sink.lock().finalize();

        let duration_secs = {
            let mut shared = self.shared.lock();
            let duration = shared.elapsed_duration();
            shared.capture_start = None;
            shared.paused_duration = Duration::ZERO;
            shared.last_pause = None;
            duration
        };
        self.output_path = None;

        match report {
            Ok(report) => {
                let metadata = RecordingMetadata::new(
                    duration_secs,
                    &report.output_path.to_string_lossy(),
                    &report.checksum,
                    &self.format,
                );
                if let Err(e) = write_sidecar(&metadata, &report.output_path) {
                    log::warn!("failed to write metadata sidecar: {e}");
                }
                let result = RecordingResult {
                    file_path: report.output_path,
                    duration_secs,
                    metadata,
                    checksum: report.checksum,
                };
                self.transition(RecordingState::Idle, Some(StatusEvent::Stopped));
                self.delegate.on_recording_finished(&result);
                Ok(result)
            }
            Err(e) => {
                log::error!("failed to finalize recording: {e}");
                self.delegate.on_error(&e);
                self.transition(RecordingState::Idle, Some(StatusEvent::Failed));
                Err(e)
            }
        }
    }

    /// Pause the capture stream without releasing the device.
    ///
    /// Tears down the VAD loop (keeping the sticky flag) and the meter.
    pub fn pause(&mut self) -> Result<(), CaptureError> {
        {
            let mut shared = self.shared.lock();
            if !shared.state.is_recording() {
                return Err(CaptureError::NotRecording);
            }
            shared.last_pause = Some(Instant::now());
        }

        self.teardown_vad(false);
        self.teardown_meter();
        self.capture_active.store(false, Ordering::SeqCst);

        self.transition(RecordingState::Paused, Some(StatusEvent::Paused));
        Ok(())
    }

    /// Resume a paused session, re-arming the VAD loop iff it was enabled
    /// before the pause.
    pub fn resume(&mut self) -> Result<(), CaptureError> {
        let vad_enabled;
        {
            let mut shared = self.shared.lock();
            if !shared.state.is_paused() {
                return Err(CaptureError::NotPaused);
            }
            if let Some(pause_start) = shared.last_pause.take() {
                shared.paused_duration += pause_start.elapsed();
            }
            vad_enabled = shared.vad_enabled;
        }

        self.capture_active.store(true, Ordering::SeqCst);
        self.meter = Some(AmplitudeMeter::spawn(
            self.config.clamped_amplitude_hz(),
            Arc::clone(&self.level),
            Arc::clone(&self.delegate),
        ));

        if vad_enabled {
            match self.spawn_vad_loop() {
                Ok(vad) => self.vad = Some(vad),
                Err(e) => {
                    log::error!("failed to re-arm vad loop on resume: {e}");
                    self.delegate.on_error(&e);
                }
            }
        }

        self.transition(RecordingState::Recording, Some(StatusEvent::Recording));
        Ok(())
    }

    /// Launch the voice-activity loop on its own dedicated frame source.
    pub fn start_voice_activity_detection(&mut self) -> Result<(), CaptureError> {
        {
            let shared = self.shared.lock();
            if !shared.state.is_recording() {
                return Err(CaptureError::NotRecording);
            }
        }
        if self.is_voice_activity_active() {
            return Err(CaptureError::AlreadyActive);
        }

        let vad = self.spawn_vad_loop()?;
        self.shared.lock().vad_enabled = true;
        self.vad = Some(vad);
        Ok(())
    }

    /// Stop the voice-activity loop and clear the sticky flag.
    pub fn stop_voice_activity_detection(&mut self) -> Result<(), CaptureError> {
        if !self.is_voice_activity_active() {
            return Err(CaptureError::NotActive);
        }
        self.teardown_vad(true);
        Ok(())
    }

    /// Update the classifier's voice-confidence threshold.
    ///
    /// Backends with fixed sensitivity modes validate the range and report
    /// `ThresholdSupport::Fixed`.
    pub fn set_voice_activity_threshold(
        &mut self,
        threshold: f32,
    ) -> Result<ThresholdSupport, CaptureError> {
        validate_threshold(threshold)?;
        self.classifier.lock().set_threshold(threshold)
    }

    // --- Internal helpers ---

    fn transition(&self, new_state: RecordingState, status: Option<StatusEvent>) {
        {
            let mut shared = self.shared.lock();
            if !shared.state.can_transition_to(new_state) && shared.state != new_state {
                log::warn!(
                    "unexpected state transition {:?} -> {:?}",
                    shared.state,
                    new_state
                );
            }
            shared.state = new_state;
        }
        if let Some(status) = status {
            self.delegate.on_status_changed(status);
        }
    }

    fn spawn_vad_loop(&self) -> Result<VadLoop, CaptureError> {
        let source = self.provider.open(&self.format)?;
        let policy = EventPolicy::new(self.config.vad_event_mode, self.config.vad_throttle_ms);
        VadLoop::spawn(
            source,
            Arc::clone(&self.classifier),
            policy,
            self.format,
            Arc::clone(&self.level),
            Arc::clone(&self.delegate),
        )
    }

    /// Stop the VAD loop if present. Idempotent; safe during any teardown.
    fn teardown_vad(&mut self, clear_flag: bool) {
        if clear_flag {
            self.shared.lock().vad_enabled = false;
        }
        if let Some(mut vad) = self.vad.take() {
            vad.stop();
        }
    }

    fn teardown_meter(&mut self) {
        if let Some(mut meter) = self.meter.take() {
            meter.stop();
        }
    }

    /// Stop the capture writer and release the device. Idempotent.
    fn teardown_capture(&mut self) {
        self.capture_running.store(false, Ordering::SeqCst);
        self.capture_active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.join();
        }
    }
}

impl<P: CaptureProvider, S: RecordingSink + 'static> Drop for RecordingSession<P, S> {
    fn drop(&mut self) {
        self.teardown_vad(true);
        self.teardown_meter();
        self.teardown_capture();
    }
}

/// Capture writer thread: pulls frames from the primary source, tracks the
/// live amplitude, and streams frames into the sink.
///
/// The frame source lives on this thread; dropping it on exit releases the
/// device after the loops that depend on it are gone.
#[allow(clippy::too_many_arguments)]
fn spawn_capture_writer<S: RecordingSink + 'static>(
    mut source: Box<dyn FrameSource>,
    sink: Arc<Mutex<S>>,
    level: Arc<LevelCell>,
    shared: Arc<Mutex<SessionShared>>,
    delegate: Arc<dyn SessionDelegate>,
    running: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    frame_size: usize,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("capture-writer".into())
        .spawn(move || {
            let mut frame = vec![0i16; frame_size];
            let mut stream_paused = false;

            while running.load(Ordering::SeqCst) {
                if !active.load(Ordering::SeqCst) {
                    if !stream_paused {
                        if let Err(e) = source.pause() {
                            log::warn!("failed to pause capture stream: {e}");
                        }
                        stream_paused = true;
                    }
                    thread::sleep(PAUSE_POLL);
                    continue;
                }
                if stream_paused {
                    if let Err(e) = source.resume() {
                        log::warn!("failed to resume capture stream: {e}");
                    }
                    stream_paused = false;
                }

                match source.read_frame(&mut frame) {
                    Ok(n) if n == frame.len() => {
                        level.store(compute_db(&frame));
                        let write = sink.lock().write_frame(&frame);
                        if let Err(e) = write {
                            log::error!("sink write failed: {e}");
                            delegate.on_error(&e);
                            {
                                let mut s = shared.lock();
                                if s.state.can_transition_to(RecordingState::Error) {
                                    s.state = RecordingState::Error;
                                }
                            }
                            delegate.on_status_changed(StatusEvent::Error);
                            active.store(false, Ordering::SeqCst);
                        }
                    }
                    Ok(n) => {
                        log::warn!("short capture read: {n}/{} samples", frame.len());
                    }
                    Err(e) => {
                        log::warn!("capture read failed: {e}");
                        thread::sleep(CAPTURE_READ_BACKOFF);
                    }
                }
            }
        })
        .expect("failed to spawn capture writer thread")
}
