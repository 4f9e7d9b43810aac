//! In-process activity event bus.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use gatekeep_application::ports::{ActivityListener, ActivitySource, ListenerId, ListenerOptions};
use gatekeep_domain::ActivityKind;
use parking_lot::RwLock;
use tracing::trace;

struct Registration {
    kind: ActivityKind,
    listener: ActivityListener,
}

/// Fan-out of user interaction events to registered listeners.
///
/// Frontends call [`emit`](Self::emit) for every interaction they observe.
/// Listeners run on the emitting thread, after the registry lock has been
/// released, so a listener may add or remove listeners itself.
#[derive(Default)]
pub struct ActivityBus {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<ListenerId, Registration>>,
}

impl std::fmt::Debug for ActivityBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityBus")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl ActivityBus {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an event to every listener registered for its kind.
    /// Returns the number of listeners notified.
    pub fn emit(&self, kind: ActivityKind) -> usize {
        let matching: Vec<ActivityListener> = self
            .listeners
            .read()
            .values()
            .filter(|r| r.kind == kind)
            .map(|r| ActivityListener::clone(&r.listener))
            .collect();

        trace!(%kind, listeners = matching.len(), "activity event");
        for listener in &matching {
            listener(kind);
        }
        matching.len()
    }

    /// Number of registered listeners, all kinds.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count_for(&self, kind: ActivityKind) -> usize {
        self.listeners
            .read()
            .values()
            .filter(|r| r.kind == kind)
            .count()
    }
}

impl ActivitySource for ActivityBus {
    fn add_listener(
        &self,
        kind: ActivityKind,
        listener: ActivityListener,
        _options: ListenerOptions,
    ) -> ListenerId {
        // Listeners are always passive here: the bus has no default action
        // a listener could cancel.
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .insert(id, Registration { kind, listener });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }
}
