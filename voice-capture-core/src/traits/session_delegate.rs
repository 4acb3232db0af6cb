use crate::models::error::CaptureError;
use crate::models::events::{AmplitudeSample, StatusEvent, VadEvent};
use crate::models::recording_result::RecordingResult;

/// Event delegate for session notifications.
///
/// All methods are called from background threads, never from the thread
/// invoking the session's public API. Implementations should marshal to
/// their own context if needed and must not block: the meter, VAD loop,
/// and capture writer all deliver through this interface. Ordering is
/// monotonic per event kind but not guaranteed FIFO across kinds.
pub trait SessionDelegate: Send + Sync {
    /// Called on every top-level state transition.
    fn on_status_changed(&self, status: StatusEvent);

    /// Called at the configured amplitude cadence.
    fn on_amplitude(&self, sample: &AmplitudeSample);

    /// Called per the configured VAD event policy.
    fn on_voice_activity(&self, event: &VadEvent);

    /// Called when an asynchronous failure occurs (VAD loop death, sink
    /// write failure, re-arm failure on resume).
    fn on_error(&self, error: &CaptureError);

    /// Called after a successful stop, once the output is finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
