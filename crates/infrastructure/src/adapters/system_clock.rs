//! Wall clock adapter

use chrono::{DateTime, Utc};
use gatekeep_application::ports::Clock;

/// [`Clock`] backed by the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates the clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_tracks_utc() {
        let before = Utc::now();
        let now = SystemClock::new().now();
        let after = Utc::now();
        assert!(before <= now && now <= after);
    }
}
