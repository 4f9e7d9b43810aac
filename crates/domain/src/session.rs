//! Session record and idle detection thresholds.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserSummary;
use crate::error::{DomainError, DomainResult};

/// The authenticated session as seen by the client.
///
/// Created by the authentication flow, kept alive by user activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The signed-in user.
    pub user: UserSummary,
    /// Last qualifying user interaction.
    pub last_activity_at: DateTime<Utc>,
    /// When the session lapses if no further activity happens.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Starts a session at `now` that lapses after `idle_expiry` of inactivity.
    #[must_use]
    pub fn start(user: UserSummary, now: DateTime<Utc>, idle_expiry: Duration) -> Self {
        Self {
            user,
            last_activity_at: now,
            expires_at: deadline(now, idle_expiry),
        }
    }

    /// Records activity at `now`, pushing the expiry deadline forward.
    pub fn touch(&mut self, now: DateTime<Utc>, idle_expiry: Duration) {
        self.last_activity_at = now;
        self.expires_at = deadline(now, idle_expiry);
    }

    /// Time elapsed since the last activity. Never negative.
    #[must_use]
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

fn deadline(from: DateTime<Utc>, after: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(after)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Where an idle duration falls relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleBand {
    /// Below the warning threshold.
    #[default]
    Active,
    /// At or past the warning threshold but before expiry.
    Warning,
    /// At or past the expiry threshold.
    Expired,
}

/// Idle warning and hard-expiry thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleThresholds {
    warning: Duration,
    expiry: Duration,
}

impl IdleThresholds {
    /// Creates thresholds, requiring `0 < warning < expiry`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidThresholds` when the ordering is violated.
    pub fn new(warning: Duration, expiry: Duration) -> DomainResult<Self> {
        if warning.is_zero() {
            return Err(DomainError::InvalidThresholds(
                "warning threshold must be positive".to_string(),
            ));
        }
        if warning >= expiry {
            return Err(DomainError::InvalidThresholds(format!(
                "warning ({}ms) must be shorter than expiry ({}ms)",
                warning.as_millis(),
                expiry.as_millis()
            )));
        }
        Ok(Self { warning, expiry })
    }

    /// Inactivity after which the idle warning is shown.
    #[must_use]
    pub const fn warning(&self) -> Duration {
        self.warning
    }

    /// Inactivity after which the session expires.
    #[must_use]
    pub const fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Classifies an idle duration.
    #[must_use]
    pub fn classify(&self, idle: Duration) -> IdleBand {
        if idle >= self.expiry {
            IdleBand::Expired
        } else if idle >= self.warning {
            IdleBand::Warning
        } else {
            IdleBand::Active
        }
    }

    /// Time left before expiry for a given idle duration.
    #[must_use]
    pub fn remaining(&self, idle: Duration) -> Duration {
        self.expiry.saturating_sub(idle)
    }
}

impl Default for IdleThresholds {
    /// 25 minutes to warning, 30 minutes to expiry.
    fn default() -> Self {
        Self {
            warning: Duration::from_secs(25 * 60),
            expiry: Duration::from_secs(30 * 60),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn thresholds() -> IdleThresholds {
        IdleThresholds::new(Duration::from_secs(60), Duration::from_secs(120)).unwrap()
    }

    #[test]
    fn test_classify_bands() {
        let t = thresholds();
        assert_eq!(t.classify(Duration::from_secs(59)), IdleBand::Active);
        assert_eq!(t.classify(Duration::from_secs(60)), IdleBand::Warning);
        assert_eq!(t.classify(Duration::from_millis(60_001)), IdleBand::Warning);
        assert_eq!(t.classify(Duration::from_secs(120)), IdleBand::Expired);
        assert_eq!(t.classify(Duration::from_secs(5000)), IdleBand::Expired);
    }

    #[test]
    fn test_thresholds_reject_bad_ordering() {
        assert!(IdleThresholds::new(Duration::from_secs(120), Duration::from_secs(60)).is_err());
        assert!(IdleThresholds::new(Duration::from_secs(60), Duration::from_secs(60)).is_err());
        assert!(IdleThresholds::new(Duration::ZERO, Duration::from_secs(60)).is_err());
    }

    #[test]
    fn test_remaining_saturates() {
        let t = thresholds();
        assert_eq!(t.remaining(Duration::from_secs(100)), Duration::from_secs(20));
        assert_eq!(t.remaining(Duration::from_secs(500)), Duration::ZERO);
    }

    #[test]
    fn test_touch_moves_deadline() {
        let start = Utc::now();
        let mut record = SessionRecord::start(
            UserSummary::new("1", "ada"),
            start,
            Duration::from_secs(120),
        );
        assert_eq!(record.expires_at, start + TimeDelta::seconds(120));

        let later = start + TimeDelta::seconds(30);
        record.touch(later, Duration::from_secs(120));
        assert_eq!(record.last_activity_at, later);
        assert_eq!(record.expires_at, later + TimeDelta::seconds(120));
    }

    #[test]
    fn test_idle_for_never_negative() {
        let now = Utc::now();
        let record = SessionRecord::start(UserSummary::new("1", "ada"), now, Duration::from_secs(1));
        assert_eq!(record.idle_for(now - TimeDelta::seconds(10)), Duration::ZERO);
        assert_eq!(
            record.idle_for(now + TimeDelta::seconds(10)),
            Duration::from_secs(10)
        );
    }
}
