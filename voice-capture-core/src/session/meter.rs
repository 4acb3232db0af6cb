//! Amplitude metering: the shared level cell and the periodic meter task.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::config::{MAX_AMPLITUDE_HZ, MIN_AMPLITUDE_HZ};
use crate::models::events::{now_ms, AmplitudeSample, DB_FLOOR};
use crate::traits::session_delegate::SessionDelegate;

/// Last measured amplitude, shared between the capture paths and the meter.
///
/// Stores f32 bits in an atomic so the audio threads never block on the
/// meter. Reads the floor value until the first measurement lands.
#[derive(Debug)]
pub struct LevelCell {
    bits: AtomicU32,
}

impl LevelCell {
    pub fn new() -> Self {
        Self {
            bits: AtomicU32::new(DB_FLOOR.to_bits()),
        }
    }

    pub fn store(&self, db: f32) {
        self.bits.store(db.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Back to the floor value, as at session start.
    pub fn reset(&self) {
        self.store(DB_FLOOR);
    }
}

impl Default for LevelCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic amplitude sampler.
///
/// Runs on its own thread at a cadence independent of the VAD loop,
/// republishing the most recent level for UI consumption.
pub(crate) struct AmplitudeMeter {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AmplitudeMeter {
    /// Spawn the meter at `update_hz`, clamped to `[1, 120]`.
    pub(crate) fn spawn(
        update_hz: u32,
        level: Arc<LevelCell>,
        delegate: Arc<dyn SessionDelegate>,
    ) -> Self {
        let hz = update_hz.clamp(MIN_AMPLITUDE_HZ, MAX_AMPLITUDE_HZ);
        let period = Duration::from_secs_f64(1.0 / f64::from(hz));

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("amplitude-meter".into())
            .spawn(move || {
                while thread_running.load(Ordering::SeqCst) {
                    thread::sleep(period);
                    if !thread_running.load(Ordering::SeqCst) {
                        break;
                    }
                    let sample = AmplitudeSample {
                        decibels: level.load(),
                        timestamp_ms: now_ms(),
                    };
                    delegate.on_amplitude(&sample);
                }
            })
            .expect("failed to spawn amplitude meter thread");

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Cancel and join. Idempotent.
    pub(crate) fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AmplitudeMeter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::CaptureError;
    use crate::models::events::{StatusEvent, VadEvent};
    use crate::models::recording_result::RecordingResult;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingDelegate {
        samples: Mutex<Vec<AmplitudeSample>>,
    }

    impl SessionDelegate for CountingDelegate {
        fn on_status_changed(&self, _status: StatusEvent) {}
        fn on_amplitude(&self, sample: &AmplitudeSample) {
            self.samples.lock().push(*sample);
        }
        fn on_voice_activity(&self, _event: &VadEvent) {}
        fn on_error(&self, _error: &CaptureError) {}
        fn on_recording_finished(&self, _result: &RecordingResult) {}
    }

    #[test]
    fn level_cell_defaults_to_floor() {
        let cell = LevelCell::new();
        assert_eq!(cell.load(), DB_FLOOR);
        cell.store(-20.0);
        assert_eq!(cell.load(), -20.0);
        cell.reset();
        assert_eq!(cell.load(), DB_FLOOR);
    }

    #[test]
    fn meter_reports_floor_before_first_measurement() {
        let level = Arc::new(LevelCell::new());
        let delegate = Arc::new(CountingDelegate::default());

        let mut meter = AmplitudeMeter::spawn(100, Arc::clone(&level), delegate.clone());
        thread::sleep(Duration::from_millis(80));
        meter.stop();

        let samples = delegate.samples.lock();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.decibels == DB_FLOOR));
    }

    #[test]
    fn meter_forwards_latest_level() {
        let level = Arc::new(LevelCell::new());
        let delegate = Arc::new(CountingDelegate::default());
        level.store(-12.0);

        let mut meter = AmplitudeMeter::spawn(100, Arc::clone(&level), delegate.clone());
        thread::sleep(Duration::from_millis(80));
        meter.stop();

        let samples = delegate.samples.lock();
        assert!(samples.iter().any(|s| s.decibels == -12.0));
    }

    #[test]
    fn stop_is_idempotent() {
        let level = Arc::new(LevelCell::new());
        let delegate = Arc::new(CountingDelegate::default());

        let mut meter = AmplitudeMeter::spawn(50, level, delegate);
        meter.stop();
        meter.stop();
    }
}
