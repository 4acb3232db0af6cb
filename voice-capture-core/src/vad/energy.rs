//! Frame-energy voice classifier.
//!
//! Maps the frame RMS level onto a confidence value and compares it
//! against a continuous, tunable threshold. No model resources; always
//! available regardless of enabled features.

use crate::models::error::CaptureError;
use crate::models::events::VadDecision;
use crate::processing::amplitude::compute_db;
use crate::traits::classifier::{validate_threshold, ThresholdSupport, VoiceClassifier};

/// dB span mapped onto the `[0, 1]` confidence range. Frames at or below
/// -60 dBFS read as confidence 0; full scale reads as 1.
const CONFIDENCE_RANGE_DB: f32 = 60.0;

/// Energy-threshold classifier.
#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    threshold: f32,
}

impl EnergyClassifier {
    pub fn new(threshold: f32) -> Result<Self, CaptureError> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }
}

impl Default for EnergyClassifier {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl VoiceClassifier for EnergyClassifier {
    fn classify(&mut self, frame: &[i16]) -> Result<VadDecision, CaptureError> {
        let db = compute_db(frame);
        let confidence = ((db + CONFIDENCE_RANGE_DB) / CONFIDENCE_RANGE_DB).clamp(0.0, 1.0);
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
        "energy"
    }
}
