use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Fixed capture sample rate in Hz, dictated by the classifier window.
pub const SAMPLE_RATE: u32 = 16_000;
/// Mono capture only.
pub const CHANNELS: u16 = 1;
/// 16-bit signed little-endian PCM.
pub const BIT_DEPTH: u16 = 16;
/// Samples per classification frame (32 ms at 16 kHz).
pub const FRAME_SIZE: usize = 512;

/// Bounds for the amplitude meter cadence. Out-of-range requests are
/// clamped, not rejected.
pub const MIN_AMPLITUDE_HZ: u32 = 1;
pub const MAX_AMPLITUDE_HZ: u32 = 120;

/// PCM format of the capture path.
///
/// The format is fixed by the classifier's required window: 16 kHz mono
/// s16le in 512-sample frames. `validate()` exists so backends can reject
/// any hand-constructed variant early instead of misclassifying audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub frame_size: usize,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            bit_depth: BIT_DEPTH,
            frame_size: FRAME_SIZE,
        }
    }
}

impl CaptureFormat {
    /// Duration of one frame at this format (32 ms for the fixed format).
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_size as u64 * 1000 / self.sample_rate as u64)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.channels != CHANNELS || self.bit_depth != BIT_DEPTH {
            return Err(CaptureError::DeviceInitFailed(format!(
                "unsupported format: {} ch / {} bit (mono 16-bit only)",
                self.channels, self.bit_depth
            )));
        }
        // The frame must stay a 32 ms window; changing the sample rate
        // without the frame size (or vice versa) is invalid.
        if self.sample_rate != SAMPLE_RATE || self.frame_size != FRAME_SIZE {
            return Err(CaptureError::DeviceInitFailed(format!(
                "unsupported rate/frame pairing: {} Hz / {} samples",
                self.sample_rate, self.frame_size
            )));
        }
        Ok(())
    }
}

/// When the VAD loop forwards events to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VadEventMode {
    /// Emit an event for every classified frame.
    OnEveryFrame,
    /// Emit only when the speech/silence state flips.
    OnChange,
    /// Emit on flips, and otherwise at most once per throttle interval.
    Throttled,
}

/// Caller-supplied session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory where recording files are written.
    pub output_directory: PathBuf,
    /// Amplitude meter cadence in Hz, clamped to `[1, 120]`.
    pub amplitude_update_hz: u32,
    pub vad_event_mode: VadEventMode,
    /// Minimum interval between events in `Throttled` mode.
    pub vad_throttle_ms: u64,
    /// Voice-confidence threshold, `0.0..=1.0`.
    pub voice_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            amplitude_update_hz: 10,
            vad_event_mode: VadEventMode::OnChange,
            vad_throttle_ms: 300,
            voice_threshold: 0.5,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if !(0.0..=1.0).contains(&self.voice_threshold) || self.voice_threshold.is_nan() {
            return Err(CaptureError::InvalidThreshold(self.voice_threshold));
        }
        Ok(())
    }

    /// Meter cadence with the `[1, 120]` Hz clamp applied.
    pub fn clamped_amplitude_hz(&self) -> u32 {
        self.amplitude_update_hz.clamp(MIN_AMPLITUDE_HZ, MAX_AMPLITUDE_HZ)
    }
}
