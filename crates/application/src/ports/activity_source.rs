//! Activity event source port

use std::fmt;
use std::sync::Arc;

use gatekeep_domain::ActivityKind;

/// Callback invoked for every matching activity event.
pub type ActivityListener = Arc<dyn Fn(ActivityKind) + Send + Sync>;

/// Handle returned by [`ActivitySource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Registration options for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerOptions {
    /// The listener never blocks or cancels the event it observes.
    pub passive: bool,
}

impl ListenerOptions {
    /// Passive registration, used for activity tracking.
    #[must_use]
    pub const fn passive() -> Self {
        Self { passive: true }
    }
}

/// Something that emits user interaction events.
pub trait ActivitySource: Send + Sync {
    /// Registers `listener` for events of `kind`.
    fn add_listener(
        &self,
        kind: ActivityKind,
        listener: ActivityListener,
        options: ListenerOptions,
    ) -> ListenerId;

    /// Unregisters a listener. Returns false if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
