use thiserror::Error;

/// Errors that can occur during recording and voice-activity operations.
///
/// Every state-mutating call on the session returns one of these named
/// cases; nothing is reported through string-valued result codes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    /// The capture capability is unavailable (no device, or access denied).
    #[error("permission denied")]
    PermissionDenied,

    /// The capture device could not be opened at the requested format.
    #[error("device init failed: {0}")]
    DeviceInitFailed(String),

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("not paused")]
    NotPaused,

    /// Voice activity detection is already running.
    #[error("voice activity detection already active")]
    AlreadyActive,

    /// Voice activity detection is not running.
    #[error("voice activity detection not active")]
    NotActive,

    /// Voice-confidence threshold outside `0.0..=1.0`.
    #[error("invalid threshold {0} (expected 0.0..=1.0)")]
    InvalidThreshold(f32),

    /// A single frame read failed. Transient; retried with backoff inside
    /// the VAD loop.
    #[error("frame read failed: {0}")]
    ReadError(String),

    /// The consecutive-read-failure budget was exhausted. Fatal to the VAD
    /// loop only; the session and its primary capture path are unaffected.
    #[error("{0} consecutive frame reads failed")]
    ConsecutiveReadFailure(u32),

    /// Sink open/write/finalize failure.
    #[error("storage error: {0}")]
    StorageError(String),
}
