//! Silero neural voice classifier backed by the `voice_activity_detector`
//! crate.
//!
//! Produces a continuous speech probability per frame, compared against a
//! tunable threshold. The model only supports 8 or 16 kHz input; the
//! constructor rejects anything else.

use voice_activity_detector::VoiceActivityDetector;

use crate::models::config::CaptureFormat;
use crate::models::error::CaptureError;
use crate::models::events::VadDecision;
use crate::traits::classifier::{validate_threshold, ThresholdSupport, VoiceClassifier};

pub struct SileroClassifier {
    detector: VoiceActivityDetector,
    threshold: f32,
}

impl SileroClassifier {
    pub fn new(format: &CaptureFormat, threshold: f32) -> Result<Self, CaptureError> {
        validate_threshold(threshold)?;
        match format.sample_rate {
            8_000 | 16_000 => {}
            other => {
                return Err(CaptureError::DeviceInitFailed(format!(
                    "unsupported sample rate for silero model: {other} Hz (must be 8000 or 16000)"
                )))
            }
        }

        let detector = VoiceActivityDetector::builder()
            .sample_rate(format.sample_rate as i32)
            .chunk_size(format.frame_size)
            .build()
            .map_err(|e| CaptureError::DeviceInitFailed(format!("vad model init failed: {e}")))?;

        Ok(Self {
            detector,
            threshold,
        })
    }
}

impl VoiceClassifier for SileroClassifier {
    fn classify(&mut self, frame: &[i16]) -> Result<VadDecision, CaptureError> {
        let confidence = self.detector.predict(frame.iter().copied());
        Ok(VadDecision {
            is_voice: confidence >= self.threshold,
            confidence,
        })
    }

    fn set_threshold(&mut self, threshold: f32) -> Result<ThresholdSupport, CaptureError> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(ThresholdSupport::Applied)
    }

    fn name(&self) -> &'static str {
        "silero"
    }
}
