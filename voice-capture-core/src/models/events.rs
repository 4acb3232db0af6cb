use serde::Serialize;

/// Minimum reportable amplitude in dBFS; represents effective silence.
pub const DB_FLOOR: f32 = -160.0;

/// Top-level session status, delivered on every state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusEvent {
    Recording,
    Stopped,
    Paused,
    Failed,
    Error,
}

impl StatusEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Paused => "paused",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One amplitude reading, as forwarded by the meter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmplitudeSample {
    /// dBFS level, clamped to `[-160.0, 0.0]`.
    pub decibels: f32,
    /// Unix epoch milliseconds at the time the sample was forwarded.
    pub timestamp_ms: i64,
}

/// Speech/silence decision for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadDecision {
    pub is_voice: bool,
    /// Speech probability or backend-specific confidence, `0.0..=1.0`.
    pub confidence: f32,
}

/// Classification of a voice-activity event relative to the previous state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VadEventKind {
    SpeechStart,
    SilenceStart,
    SpeechContinue,
    SilenceContinue,
}

impl VadEventKind {
    /// The `*_start` kinds mark a state flip.
    pub fn is_start(&self) -> bool {
        matches!(self, Self::SpeechStart | Self::SilenceStart)
    }
}

/// Voice-activity event delivered to the caller per the event policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VadEvent {
    pub is_voice_detected: bool,
    pub timestamp_ms: i64,
    pub confidence: f32,
    pub audio_level_db: f32,
    pub is_state_change: bool,
    pub previous_state: bool,
    #[serde(rename = "event_type")]
    pub kind: VadEventKind,
    /// Milliseconds since the current speech/silence state began; resets to
    /// zero on each flip.
    pub state_duration_ms: u64,
}

/// Current wall-clock time as Unix epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_wire_format() {
        assert_eq!(StatusEvent::Recording.to_string(), "recording");
        assert_eq!(StatusEvent::Failed.to_string(), "failed");
        assert_eq!(
            serde_json::to_string(&StatusEvent::Paused).unwrap(),
            "\"paused\""
        );
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&VadEventKind::SpeechStart).unwrap(),
            "\"speech_start\""
        );
        assert_eq!(
            serde_json::to_string(&VadEventKind::SilenceContinue).unwrap(),
            "\"silence_continue\""
        );
    }

    #[test]
    fn start_kinds_are_state_changes() {
        assert!(VadEventKind::SpeechStart.is_start());
        assert!(VadEventKind::SilenceStart.is_start());
        assert!(!VadEventKind::SpeechContinue.is_start());
        assert!(!VadEventKind::SilenceContinue.is_start());
    }

    #[test]
    fn vad_event_wire_shape() {
        let event = VadEvent {
            is_voice_detected: true,
            timestamp_ms: 1_000,
            confidence: 0.9,
            audio_level_db: -12.5,
            is_state_change: true,
            previous_state: false,
            kind: VadEventKind::SpeechStart,
            state_duration_ms: 0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"speech_start\""));
        assert!(json.contains("\"is_voice_detected\":true"));
    }
}
