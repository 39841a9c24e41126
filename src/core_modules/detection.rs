// THEORY:
// The `detection` module is the core of the behavioral analysis layer. It
// adds the concept of "memory" to the per-frame blob verdicts: a single
// boolean per frame becomes a narrative about how long motion has been
// continuously present, and that duration decides how serious each alert
// request is.

use crate::core_modules::alert::Severity;
use std::time::Duration;

/// The temporal state of motion inside the region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// No qualifying blob in the current frame.
    Idle,
    /// Motion is present but has not yet lasted `detect_duration`.
    Active,
    /// Motion has been continuously present for at least `detect_duration`.
    Sustained,
}

/// Tracks continuous-motion duration across frames and requests alerts.
///
/// The policy is level-triggered: every frame with a qualifying blob produces
/// an alert request whose severity reflects the current state. Throttling is
/// a separate concern.
pub struct DetectionStateMachine {
    state: MotionState,
    continuous_since: Option<Duration>,
    detect_duration: Duration,
}

impl DetectionStateMachine {
    pub fn new(detect_duration: Duration) -> Self {
        Self {
            state: MotionState::Idle,
            continuous_since: None,
            detect_duration,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Feeds one frame's verdict at stream time `at` and returns the alert
    /// severity requested for this frame, if any.
    ///
    /// `continuous_since` is recorded exactly when motion appears and
    /// cleared the first frame it is gone.
    pub fn observe(&mut self, blob_present: bool, at: Duration) -> Option<Severity> {
        if !blob_present {
            self.state = MotionState::Idle;
            self.continuous_since = None;
            return None;
        }

        let since = *self.continuous_since.get_or_insert(at);
        self.state = if at.saturating_sub(since) >= self.detect_duration {
            MotionState::Sustained
        } else {
            MotionState::Active
        };

        Some(match self.state {
            MotionState::Sustained => Severity::Sustained,
            _ => Severity::Transient,
        })
    }
}
