//! Background voice-activity classification loop.
//!
//! Pulls frames from a dedicated source at the frame cadence, classifies
//! them, applies the event policy, and forwards events to the delegate.
//! The loop owns its frame source and classifier access; none of the
//! per-frame work runs under the session lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::config::CaptureFormat;
use crate::models::error::CaptureError;
use crate::models::events::{now_ms, VadEvent};
use crate::processing::amplitude::compute_db;
use crate::session::meter::LevelCell;
use crate::traits::capture_provider::FrameSource;
use crate::traits::classifier::VoiceClassifier;
use crate::traits::session_delegate::SessionDelegate;
use crate::vad::policy::EventPolicy;

/// Consecutive read failures tolerated before the loop terminates itself.
pub const MAX_CONSECUTIVE_READ_FAILURES: u32 = 5;

/// Retry backoff after a failed frame read.
pub const READ_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Handle to a running VAD loop thread.
///
/// Cancellation is cooperative: the flag is observed between frame reads,
/// so the thread exits within about one frame period. The loop clears the
/// flag itself when it dies from the error budget, so `is_running` also
/// reflects self-termination.
pub(crate) struct VadLoop {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl VadLoop {
    pub(crate) fn spawn(
        source: Box<dyn FrameSource>,
        classifier: Arc<Mutex<Box<dyn VoiceClassifier>>>,
        policy: EventPolicy,
        format: CaptureFormat,
        level: Arc<LevelCell>,
        delegate: Arc<dyn SessionDelegate>,
    ) -> Result<Self, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("vad-loop".into())
            .spawn(move || {
                run_loop(
                    source,
                    classifier,
                    policy,
                    format,
                    level,
                    delegate,
                    &thread_running,
                );
                thread_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| CaptureError::DeviceInitFailed(format!("failed to spawn vad loop: {e}")))?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request cancellation and wait for the thread to exit. Idempotent.
    pub(crate) fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for VadLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    mut source: Box<dyn FrameSource>,
    classifier: Arc<Mutex<Box<dyn VoiceClassifier>>>,
    mut policy: EventPolicy,
    format: CaptureFormat,
    level: Arc<LevelCell>,
    delegate: Arc<dyn SessionDelegate>,
    running: &AtomicBool,
) {
    let frame_duration = format.frame_duration();
    let mut frame = vec![0i16; format.frame_size];
    let mut consecutive_failures: u32 = 0;
    policy.reset();
    classifier.lock().reset();

    while running.load(Ordering::SeqCst) {
        let iteration_start = Instant::now();

        let read = source.read_frame(&mut frame);
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let full_frame = match read {
            Ok(n) if n == frame.len() => true,
            Ok(n) => {
                log::warn!("vad loop short read: {n}/{} samples", frame.len());
                false
            }
            Err(e) => {
                log::warn!("vad loop read failed: {e}");
                false
            }
        };

        if !full_frame {
            consecutive_failures += 1;
            if consecutive_failures >= MAX_CONSECUTIVE_READ_FAILURES {
                let error = CaptureError::ConsecutiveReadFailure(consecutive_failures);
                log::error!("vad loop terminating: {error}");
                delegate.on_error(&error);
                return;
            }
            thread::sleep(READ_ERROR_BACKOFF);
            continue;
        }

        let audio_level_db = compute_db(&frame);
        level.store(audio_level_db);

        let decision = match classifier.lock().classify(&frame) {
            Ok(decision) => decision,
            Err(e) => {
                log::warn!("vad classify failed: {e}");
                consecutive_failures += 1;
                if consecutive_failures >= MAX_CONSECUTIVE_READ_FAILURES {
                    let error = CaptureError::ConsecutiveReadFailure(consecutive_failures);
                    log::error!("vad loop terminating: {error}");
                    delegate.on_error(&error);
                    return;
                }
                thread::sleep(READ_ERROR_BACKOFF);
                continue;
            }
        };
        consecutive_failures = 0;

        if let Some(emit) = policy.evaluate(decision.is_voice, Instant::now()) {
            let event = VadEvent {
                is_voice_detected: decision.is_voice,
                timestamp_ms: now_ms(),
                confidence: decision.confidence,
                audio_level_db,
                is_state_change: emit.is_state_change,
                previous_state: emit.previous_state,
                kind: emit.kind,
                state_duration_ms: emit.state_duration.as_millis() as u64,
            };
            delegate.on_voice_activity(&event);
        }

        // A blocking source already paces reads at the frame cadence; only
        // sleep out the remainder so fast (non-blocking) sources don't spin.
        let elapsed = iteration_start.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }
}
