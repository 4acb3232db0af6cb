//! # voice-capture-core
//!
//! Platform-agnostic voice recording core.
//!
//! Provides the recording session lifecycle, real-time amplitude metering,
//! voice-activity classification with debounced event delivery, and WAV
//! output. Platform backends (e.g. the cpal microphone backend) implement
//! the `CaptureProvider`/`FrameSource` traits and plug into the generic
//! `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! voice-capture-core (this crate)
//! ├── traits/       ← CaptureProvider, FrameSource, VoiceClassifier,
//! │                   RecordingSink, SessionDelegate
//! ├── models/       ← CaptureError, RecordingState, CaptureFormat,
//! │                   SessionConfig, VadEvent, RecordingResult, ...
//! ├── processing/   ← amplitude math, sample conversion, RingBuffer
//! ├── vad/          ← EventPolicy, the VAD loop, classifier backends
//! ├── session/      ← RecordingSession (generic orchestrator), meter
//! └── storage/      ← WavSink, WAV headers, metadata sidecar
//! ```
//!
//! Audio format is fixed at 16 kHz mono 16-bit PCM in 512-sample frames
//! (32 ms), dictated by the classifier window.

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;
pub mod vad;

// Re-export key types at crate root for convenience.
pub use models::config::{CaptureFormat, SessionConfig, VadEventMode};
pub use models::device::DeviceInfo;
pub use models::error::CaptureError;
pub use models::events::{
    AmplitudeSample, StatusEvent, VadDecision, VadEvent, VadEventKind, DB_FLOOR,
};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::RecordingState;
pub use processing::amplitude::compute_db;
pub use processing::ring_buffer::RingBuffer;
pub use session::meter::LevelCell;
pub use session::recorder::RecordingSession;
pub use storage::wav_sink::WavSink;
pub use traits::capture_provider::{CaptureProvider, FrameSource};
pub use traits::classifier::{ThresholdSupport, VoiceClassifier};
pub use traits::recording_sink::{RecordingSink, SinkReport};
pub use traits::session_delegate::SessionDelegate;
pub use vad::energy::EnergyClassifier;
pub use vad::policy::EventPolicy;

#[cfg(feature = "vad_earshot")]
pub use vad::earshot::EarshotClassifier;

#[cfg(feature = "vad_silero")]
pub use vad::silero::SileroClassifier;
