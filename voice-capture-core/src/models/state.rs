use serde::Serialize;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → recording ↔ paused
///           ↓          ↓
///         error → stopping → idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    Stopping,
    Error,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether `self → to` is a legal transition.
    ///
    /// Transitions are total functions of (current state, event); anything
    /// outside this table is rejected by the session with a named error.
    pub fn can_transition_to(&self, to: RecordingState) -> bool {
        matches!(
            (*self, to),
            (Self::Idle, Self::Recording)
                | (Self::Recording, Self::Paused)
                | (Self::Recording, Self::Stopping)
                | (Self::Recording, Self::Error)
                | (Self::Paused, Self::Recording)
                | (Self::Paused, Self::Stopping)
                | (Self::Error, Self::Stopping)
                | (Self::Stopping, Self::Idle)
        )
    }
}
