//! Capped exponential backoff for transient network failures.

use std::time::Duration;

/// Retries granted to one logical request.
pub const MAX_RETRIES: u32 = 3;

/// Delay before the first retry.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound for any single delay.
pub const MAX_DELAY: Duration = Duration::from_millis(8000);

/// Stateless retry schedule.
///
/// Only transport failures go through this policy; HTTP status responses
/// are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Number of retries granted.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether a request that has been retried `attempt` times may go again.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before retry number `attempt + 1`: `min(base * 2^attempt, max)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, BASE_DELAY, MAX_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backoff_sequence_is_capped() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (0..5).map(|n| policy.delay_for(n).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000]);
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(31), MAX_DELAY);
        assert_eq!(policy.delay_for(32), MAX_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), MAX_DELAY);
    }

    #[test]
    fn test_retry_budget() {
        let policy = RetryPolicy::default();
        let granted: Vec<bool> = (0..5).map(|n| policy.should_retry(n)).collect();
        assert_eq!(granted, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_disabled_policy() {
        let policy = RetryPolicy::disabled();
        assert!(!policy.should_retry(0));
        assert_eq!(policy.max_retries(), 0);
    }
}
