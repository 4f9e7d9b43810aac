//! Session lifecycle callbacks

use std::time::Duration;

/// Callbacks the idle monitor invokes on band transitions.
///
/// Both are called at most once per transition, never on every tick.
pub trait SessionHooks: Send + Sync {
    /// The user has been idle past the warning threshold.
    ///
    /// `remaining` is the time left before the session expires.
    fn on_show_idle_warning(&self, remaining: Duration);

    /// The user has been idle past the expiry threshold.
    ///
    /// Implementations clear credentials and navigate to login; the
    /// monitor itself performs neither.
    fn on_session_expired(&self);
}
