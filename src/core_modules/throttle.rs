//! Global rate limiter for alert dispatch. One shared cooldown window across
//! severities: a transient alert and a later sustained alert compete for the
//! same clock.

use std::time::Duration;

/// Enforces a minimum interval between fired alerts.
pub struct AlertThrottle {
    min_interval: Duration,
    last_alert_at: Option<Duration>,
}

impl AlertThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_alert_at: None,
        }
    }

    /// Returns true and starts a new cooldown window when the interval since
    /// the last fired alert has elapsed (or no alert has ever fired).
    /// Returns false and leaves state untouched otherwise.
    pub fn should_fire(&mut self, requested_at: Duration) -> bool {
        let eligible = match self.last_alert_at {
            None => true,
            Some(last) => requested_at.saturating_sub(last) >= self.min_interval,
        };

        if eligible {
            self.last_alert_at = Some(requested_at);
        }
        eligible
    }

    pub fn last_alert_at(&self) -> Option<Duration> {
        self.last_alert_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn first_request_always_fires() {
        let mut throttle = AlertThrottle::new(secs(5));
        assert!(throttle.should_fire(secs(0)));
        assert_eq!(throttle.last_alert_at(), Some(secs(0)));
    }

    #[test]
    fn request_inside_cooldown_is_suppressed() {
        let mut throttle = AlertThrottle::new(secs(5));
        assert!(throttle.should_fire(secs(0)));
        assert!(!throttle.should_fire(secs(4)));
        // The suppressed request did not restart the window.
        assert_eq!(throttle.last_alert_at(), Some(secs(0)));
    }

    #[test]
    fn request_at_cooldown_boundary_fires() {
        let mut throttle = AlertThrottle::new(secs(5));
        assert!(throttle.should_fire(secs(0)));
        assert!(throttle.should_fire(secs(5)));
        assert_eq!(throttle.last_alert_at(), Some(secs(5)));
    }

    #[test]
    fn suppressed_requests_do_not_extend_the_window() {
        let mut throttle = AlertThrottle::new(secs(5));
        assert!(throttle.should_fire(secs(0)));
        assert!(!throttle.should_fire(secs(2)));
        assert!(!throttle.should_fire(secs(4)));
        assert!(throttle.should_fire(secs(5)));
    }
}
