//! Alert values and the capability boundary for their side effects. The core
//! only ever produces `AlertEvent` values; what an alert sounds or looks like
//! is the receiving sink's business.

use std::fmt;
use std::time::Duration;
use tracing::info;

/// How serious the motion behind an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Motion that has not yet lasted the configured detect duration.
    Transient,
    /// Motion continuously present past the configured detect duration.
    Sustained,
}

impl Severity {
    /// Tone length for sinks that emit a beep: a longer tone for sustained
    /// motion, a shorter one for transient motion.
    pub fn beep_millis(&self) -> u64 {
        match self {
            Severity::Sustained => 900,
            Severity::Transient => 500,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Transient => write!(formatter, "transient"),
            Severity::Sustained => write!(formatter, "sustained"),
        }
    }
}

/// A single throttled alert, emitted at most once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertEvent {
    pub severity: Severity,
    /// Stream-relative timestamp of the frame that requested the alert.
    pub at: Duration,
}

/// The side-effect capability handed an alert after throttling. Delivery
/// runs outside the per-frame loop; implementations must not assume any
/// ordering relative to later frames.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, event: &AlertEvent);
}

/// A sink that reports alerts through the log. Stands in for collaborators
/// that beep or minimize windows on the host system.
pub struct ConsoleSink {
    pub minimize_windows: bool,
}

impl AlertSink for ConsoleSink {
    fn deliver(&self, event: &AlertEvent) {
        info!(
            severity = %event.severity,
            at_secs = event.at.as_secs_f64(),
            beep_millis = event.severity.beep_millis(),
            minimize_windows = self.minimize_windows,
            "alert"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sustained_beeps_longer_than_transient() {
        assert_eq!(Severity::Sustained.beep_millis(), 900);
        assert_eq!(Severity::Transient.beep_millis(), 500);
    }

    #[test]
    fn severity_display_is_lowercase() {
        assert_eq!(Severity::Transient.to_string(), "transient");
        assert_eq!(Severity::Sustained.to_string(), "sustained");
    }
}
