//! Shared holder of the current session record.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gatekeep_domain::{SessionRecord, UserSummary};
use parking_lot::RwLock;

/// The current session, shared between the auth flow, the refresh
/// coordinator and the idle monitor.
///
/// Readers are public. Creating and destroying the record is reserved to
/// the authentication flow and the refresh failure path; updating
/// `last_activity_at` is reserved to the idle monitor.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    record: Arc<RwLock<Option<SessionRecord>>>,
}

impl SessionState {
    /// Creates an empty (signed out) state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the current record.
    #[must_use]
    pub fn current(&self) -> Option<SessionRecord> {
        self.record.read().clone()
    }

    /// Whether a session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.record.read().is_some()
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        self.record.read().as_ref().map(|record| record.user.clone())
    }

    /// Idle time at `now`, or `None` when signed out.
    #[must_use]
    pub fn idle_for(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.record.read().as_ref().map(|record| record.idle_for(now))
    }

    pub(crate) fn begin(&self, record: SessionRecord) {
        *self.record.write() = Some(record);
    }

    pub(crate) fn end(&self) -> Option<SessionRecord> {
        self.record.write().take()
    }

    /// Records activity unless the previous one is more recent than
    /// `min_spacing`. Returns whether the record was updated.
    pub(crate) fn record_activity(
        &self,
        now: DateTime<Utc>,
        idle_expiry: Duration,
        min_spacing: Duration,
    ) -> bool {
        let mut guard = self.record.write();
        let Some(record) = guard.as_mut() else {
            return false;
        };
        if !min_spacing.is_zero() && record.idle_for(now) < min_spacing {
            return false;
        }
        record.touch(now, idle_expiry);
        true
    }
}
