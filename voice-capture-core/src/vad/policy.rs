//! Event emission policy for the VAD loop.
//!
//! Decides, per classified frame, whether an event reaches the caller and
//! computes its transition metadata. Time is injected as `Instant` values
//! so the policy stays deterministic under test.

use std::time::{Duration, Instant};

use crate::models::config::VadEventMode;
use crate::models::events::VadEventKind;

/// Metadata for one event the policy decided to emit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyDecision {
    pub kind: VadEventKind,
    pub is_state_change: bool,
    pub previous_state: bool,
    /// Time since the current speech/silence state began. Zero on flips.
    pub state_duration: Duration,
}

/// Debounce/throttle logic over a stream of speech/silence decisions.
///
/// `state_duration` is always measured from the last state flip, never
/// from the last emitted event; the two differ in throttled mode and this
/// implementation uses the flip-based definition uniformly.
#[derive(Debug)]
pub struct EventPolicy {
    mode: VadEventMode,
    throttle: Duration,
    previous: Option<bool>,
    state_since: Option<Instant>,
    last_emitted: Option<Instant>,
}

impl EventPolicy {
    pub fn new(mode: VadEventMode, throttle_ms: u64) -> Self {
        Self {
            mode,
            throttle: Duration::from_millis(throttle_ms),
            previous: None,
            state_since: None,
            last_emitted: None,
        }
    }

    /// Forget all history; the next decision counts as a state change.
    pub fn reset(&mut self) {
        self.previous = None;
        self.state_since = None;
        self.last_emitted = None;
    }

    /// Feed one decision; returns emission metadata if an event is due.
    pub fn evaluate(&mut self, is_voice: bool, now: Instant) -> Option<PolicyDecision> {
        let flipped = self.previous.map_or(true, |prev| prev != is_voice);
        if flipped {
            self.state_since = Some(now);
        }

        let emit = match self.mode {
            VadEventMode::OnEveryFrame => true,
            VadEventMode::OnChange => flipped,
            VadEventMode::Throttled => {
                flipped
                    || self
                        .last_emitted
                        .map_or(true, |last| now.duration_since(last) >= self.throttle)
            }
        };
        if !emit {
            return None;
        }

        let previous_state = self.previous.unwrap_or(!is_voice);
        let state_duration = if flipped {
            Duration::ZERO
        } else {
            self.state_since
                .map_or(Duration::ZERO, |since| now.duration_since(since))
        };

        self.previous = Some(is_voice);
        self.last_emitted = Some(now);

        Some(PolicyDecision {
            kind: match (is_voice, flipped) {
                (true, true) => VadEventKind::SpeechStart,
                (false, true) => VadEventKind::SilenceStart,
                (true, false) => VadEventKind::SpeechContinue,
                (false, false) => VadEventKind::SilenceContinue,
            },
            is_state_change: flipped,
            previous_state,
            state_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn on_change_emits_only_on_flips() {
        let mut policy = EventPolicy::new(VadEventMode::OnChange, 0);
        let base = Instant::now();

        let sequence = [true, true, false, false, true];
        let mut emitted = Vec::new();
        for (i, &is_voice) in sequence.iter().enumerate() {
            if let Some(decision) = policy.evaluate(is_voice, at(base, i as u64 * 32)) {
                emitted.push((i, decision.kind));
            }
        }

        assert_eq!(
            emitted,
            vec![
                (0, VadEventKind::SpeechStart),
                (2, VadEventKind::SilenceStart),
                (4, VadEventKind::SpeechStart),
            ]
        );
    }

    #[test]
    fn first_decision_counts_as_state_change() {
        let mut policy = EventPolicy::new(VadEventMode::OnChange, 0);
        let decision = policy.evaluate(false, Instant::now()).unwrap();
        assert_eq!(decision.kind, VadEventKind::SilenceStart);
        assert!(decision.is_state_change);
        assert!(decision.previous_state);
        assert_eq!(decision.state_duration, Duration::ZERO);
    }

    #[test]
    fn every_frame_emits_continues() {
        let mut policy = EventPolicy::new(VadEventMode::OnEveryFrame, 0);
        let base = Instant::now();

        let first = policy.evaluate(true, base).unwrap();
        assert_eq!(first.kind, VadEventKind::SpeechStart);

        let second = policy.evaluate(true, at(base, 32)).unwrap();
        assert_eq!(second.kind, VadEventKind::SpeechContinue);
        assert!(!second.is_state_change);
        assert!(second.previous_state);
        assert_eq!(second.state_duration, Duration::from_millis(32));

        let third = policy.evaluate(false, at(base, 64)).unwrap();
        assert_eq!(third.kind, VadEventKind::SilenceStart);
        assert!(third.is_state_change);
    }

    #[test]
    fn throttled_suppresses_within_interval() {
        let mut policy = EventPolicy::new(VadEventMode::Throttled, 200);
        let base = Instant::now();

        // Identical decisions every 32 ms for one second.
        let mut emitted = Vec::new();
        for i in 0..31u64 {
            if let Some(decision) = policy.evaluate(true, at(base, i * 32)) {
                emitted.push((i * 32, decision));
            }
        }

        // First at t=0, then one per >=200 ms window: ~5 total.
        assert_eq!(emitted.len(), 5, "emitted at {:?}", emitted);
        assert_eq!(emitted[0].1.kind, VadEventKind::SpeechStart);
        for window in emitted.windows(2) {
            assert!(window[1].0 - window[0].0 >= 200);
            assert_eq!(window[1].1.kind, VadEventKind::SpeechContinue);
        }
    }

    #[test]
    fn throttled_still_emits_flips_immediately() {
        let mut policy = EventPolicy::new(VadEventMode::Throttled, 10_000);
        let base = Instant::now();

        assert!(policy.evaluate(true, base).is_some());
        // Within the throttle window, but a flip: must emit.
        let flip = policy.evaluate(false, at(base, 32)).unwrap();
        assert_eq!(flip.kind, VadEventKind::SilenceStart);
        // Non-flip inside the window stays suppressed.
        assert!(policy.evaluate(false, at(base, 64)).is_none());
    }

    #[test]
    fn state_duration_measured_from_flip_not_last_event() {
        let mut policy = EventPolicy::new(VadEventMode::Throttled, 100);
        let base = Instant::now();

        policy.evaluate(true, base);
        // Suppressed frames advance the state clock anyway.
        policy.evaluate(true, at(base, 32));
        policy.evaluate(true, at(base, 64));
        let decision = policy.evaluate(true, at(base, 128)).unwrap();

        assert_eq!(decision.state_duration, Duration::from_millis(128));

        // Flip resets the duration even though events were emitted since.
        let flip = policy.evaluate(false, at(base, 160)).unwrap();
        assert_eq!(flip.state_duration, Duration::ZERO);
    }

    #[test]
    fn reset_forgets_previous_state() {
        let mut policy = EventPolicy::new(VadEventMode::OnChange, 0);
        let base = Instant::now();

        policy.evaluate(true, base);
        assert!(policy.evaluate(true, at(base, 32)).is_none());

        policy.reset();
        let decision = policy.evaluate(true, at(base, 64)).unwrap();
        assert_eq!(decision.kind, VadEventKind::SpeechStart);
    }
}
