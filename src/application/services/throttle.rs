//! Time gates for UI work triggered by redraws and rapid input.

use std::time::Duration;

use tokio::time::Instant;

/// Lets work run at most once per `interval`.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    #[must_use]
    pub fn is_ready(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Starts the next interval at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_run = Some(now);
    }
}

/// Once triggered, stays closed for `window`.
#[derive(Debug, Clone)]
pub struct RateWindow {
    window: Duration,
    closed_until: Option<Instant>,
}

impl RateWindow {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            closed_until: None,
        }
    }

    #[must_use]
    pub fn is_active(&self, now: Instant) -> bool {
        self.closed_until.is_some_and(|until| now < until)
    }

    /// Restarts the window from `now`.
    pub fn trigger(&mut self, now: Instant) {
        self.closed_until = Some(now + self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_first_run_allowed() {
        let throttle = Throttle::new(Duration::from_millis(100));
        assert!(throttle.is_ready(Instant::now()));
    }

    #[test]
    fn test_throttle_blocks_within_interval() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(100));

        throttle.record(start);
        assert!(!throttle.is_ready(start + Duration::from_millis(40)));
        assert!(!throttle.is_ready(start + Duration::from_millis(99)));
        assert!(throttle.is_ready(start + Duration::from_millis(100)));

        throttle.record(start + Duration::from_millis(100));
        assert!(!throttle.is_ready(start + Duration::from_millis(150)));
    }

    #[test]
    fn test_rate_window_rejects_then_admits() {
        let start = Instant::now();
        let mut window = RateWindow::new(Duration::from_secs(1));

        assert!(!window.is_active(start));
        window.trigger(start);
        assert!(window.is_active(start + Duration::from_millis(999)));
        assert!(!window.is_active(start + Duration::from_secs(1)));

        window.trigger(start + Duration::from_secs(2));
        assert!(window.is_active(start + Duration::from_millis(2_500)));
    }
}
