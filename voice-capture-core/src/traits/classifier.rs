use crate::models::error::CaptureError;
use crate::models::events::VadDecision;

/// Whether a backend applied a requested threshold or runs with fixed
/// sensitivity modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSupport {
    /// The threshold was applied and will affect subsequent decisions.
    Applied,
    /// The backend uses fixed discrete sensitivity modes; the call is a
    /// validated no-op.
    Fixed,
}

/// Speech/silence classification capability over one fixed-size frame.
///
/// The model internals are opaque; all backends produce the same
/// `VadDecision` shape so the VAD loop and event policy stay
/// backend-agnostic.
pub trait VoiceClassifier: Send {
    /// Classify one 512-sample frame.
    fn classify(&mut self, frame: &[i16]) -> Result<VadDecision, CaptureError>;

    /// Update the voice-confidence threshold.
    ///
    /// Must validate the `0.0..=1.0` range for every backend, including
    /// ones that cannot be tuned.
    fn set_threshold(&mut self, threshold: f32) -> Result<ThresholdSupport, CaptureError>;

    /// Clear any internal model state between recordings.
    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Shared range check for `set_threshold` implementations.
pub fn validate_threshold(threshold: f32) -> Result<(), CaptureError> {
    if !(0.0..=1.0).contains(&threshold) || threshold.is_nan() {
        return Err(CaptureError::InvalidThreshold(threshold));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_range() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(0.5).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert_eq!(
            validate_threshold(-0.1),
            Err(CaptureError::InvalidThreshold(-0.1))
        );
        assert_eq!(
            validate_threshold(1.1),
            Err(CaptureError::InvalidThreshold(1.1))
        );
        assert!(validate_threshold(f32::NAN).is_err());
    }
}
