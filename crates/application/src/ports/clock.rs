//! Clock port

use chrono::{DateTime, Utc};

/// Source of wall-clock time for session bookkeeping.
///
/// Idle detection and token issue timestamps read time only through this
/// trait so tests can drive them with a manual clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
