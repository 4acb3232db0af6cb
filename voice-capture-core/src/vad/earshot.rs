//! WebRTC-style voice classifier backed by the `earshot` crate.
//!
//! The detector exposes fixed sensitivity profiles instead of a continuous
//! threshold, so `set_threshold` validates its input and reports
//! `ThresholdSupport::Fixed`. Decisions are boolean; confidence is mapped
//! to 1.0/0.0.

use earshot::{VoiceActivityDetector, VoiceActivityProfile};

use crate::models::error::CaptureError;
use crate::models::events::VadDecision;
use crate::traits::classifier::{validate_threshold, ThresholdSupport, VoiceClassifier};

/// Largest analysis window the detector accepts at 16 kHz (30 ms).
const ANALYSIS_WINDOW: usize = 480;

pub struct EarshotClassifier {
    detector: VoiceActivityDetector,
}

impl EarshotClassifier {
    pub fn new(profile: VoiceActivityProfile) -> Self {
        Self {
            detector: VoiceActivityDetector::new(profile),
        }
    }
}

impl Default for EarshotClassifier {
    fn default() -> Self {
        Self::new(VoiceActivityProfile::QUALITY)
    }
}

impl VoiceClassifier for EarshotClassifier {
    fn classify(&mut self, frame: &[i16]) -> Result<VadDecision, CaptureError> {
        if frame.len() < ANALYSIS_WINDOW {
            return Err(CaptureError::ReadError(format!(
                "frame too short for analysis window: {} < {ANALYSIS_WINDOW}",
                frame.len()
            )));
        }
        // The 512-sample capture frame carries a 32 ms window; the detector
        // analyzes its first 30 ms.
        let window = &frame[..ANALYSIS_WINDOW];
        let is_voice = self
            .detector
            .predict_16khz(window)
            .map_err(|e| CaptureError::ReadError(format!("vad prediction failed: {e:?}")))?;
        Ok(VadDecision {
            is_voice,
            confidence: if is_voice { 1.0 } else { 0.0 },
        })
    }

    fn set_threshold(&mut self, threshold: f32) -> Result<ThresholdSupport, CaptureError> {
        validate_threshold(threshold)?;
        Ok(ThresholdSupport::Fixed)
    }

    fn reset(&mut self) {
        self.detector.reset();
    }

    fn name(&self) -> &'static str {
        "earshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_silence_as_non_voice() {
        let mut vad = EarshotClassifier::default();
        let decision = vad.classify(&vec![0i16; 512]).unwrap();
        assert!(!decision.is_voice);
        assert_eq!(decision.confidence, 0.0);
    }

    #[test]
    fn short_frame_is_an_error() {
        let mut vad = EarshotClassifier::default();
        assert!(matches!(
            vad.classify(&[0i16; 100]),
            Err(CaptureError::ReadError(_))
        ));
    }

    #[test]
    fn threshold_is_validated_but_fixed() {
        let mut vad = EarshotClassifier::default();
        assert_eq!(vad.set_threshold(0.5).unwrap(), ThresholdSupport::Fixed);
        assert_eq!(
            vad.set_threshold(1.5),
            Err(CaptureError::InvalidThreshold(1.5))
        );
    }

    #[test]
    fn decision_confidence_is_binary() {
        let mut vad = EarshotClassifier::new(VoiceActivityProfile::VERY_AGGRESSIVE);
        let decision = vad.classify(&vec![0i16; 512]).unwrap();
        assert!(decision.confidence == 0.0 || decision.confidence == 1.0);
    }
}
