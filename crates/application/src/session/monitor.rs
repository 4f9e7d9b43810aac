//! Idle session monitor.
//!
//! Listens for user interaction on an [`ActivitySource`], keeps the session's
//! `last_activity_at` current and runs one periodic health check that fires
//! the idle warning and session expiry hooks on band transitions.

use std::sync::{Arc, Weak};
use std::time::Duration;

use gatekeep_domain::{ActivityKind, IdleBand};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::SessionState;
use crate::config::MonitorConfig;
use crate::ports::{ActivitySource, Clock, ListenerId, ListenerOptions, SessionHooks};

/// Errors raised by [`SessionActivityMonitor::activate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// The periodic check needs a tokio runtime.
    #[error("session monitor must be activated from within a tokio runtime")]
    NoRuntime,
}

/// Outcome of [`SessionActivityMonitor::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Listeners were registered and the check task spawned.
    Started,
    /// The monitor was already active; nothing changed.
    AlreadyActive,
}

enum Lifecycle {
    Uninitialized,
    Active {
        listeners: Vec<ListenerId>,
        ticker: JoinHandle<()>,
    },
}

struct MonitorInner {
    lifecycle: Lifecycle,
    band: IdleBand,
}

struct MonitorShared {
    source: Arc<dyn ActivitySource>,
    session: SessionState,
    clock: Arc<dyn Clock>,
    hooks: Arc<dyn SessionHooks>,
    config: MonitorConfig,
    inner: Mutex<MonitorInner>,
}

/// Watches user activity and drives idle warning and expiry.
///
/// Activation is guarded: calling [`activate`](Self::activate) twice without
/// a [`teardown`](Self::teardown) in between registers one listener set and
/// one timer. Dropping the monitor tears it down.
pub struct SessionActivityMonitor {
    shared: Arc<MonitorShared>,
}

impl std::fmt::Debug for SessionActivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionActivityMonitor")
            .field("active", &self.is_active())
            .field("band", &self.band())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl SessionActivityMonitor {
    /// Creates an inactive monitor.
    #[must_use]
    pub fn new(
        source: Arc<dyn ActivitySource>,
        session: SessionState,
        clock: Arc<dyn Clock>,
        hooks: Arc<dyn SessionHooks>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                source,
                session,
                clock,
                hooks,
                config,
                inner: Mutex::new(MonitorInner {
                    lifecycle: Lifecycle::Uninitialized,
                    band: IdleBand::Active,
                }),
            }),
        }
    }

    /// Registers the activity listeners and starts the periodic check.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NoRuntime` when called outside a tokio runtime.
    pub fn activate(&self) -> Result<Activation, MonitorError> {
        let mut inner = self.shared.inner.lock();
        if matches!(inner.lifecycle, Lifecycle::Active { .. }) {
            debug!("session monitor already active");
            return Ok(Activation::AlreadyActive);
        }
        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let listeners = ActivityKind::ALL
            .iter()
            .map(|&watched| {
                let weak = Arc::downgrade(&self.shared);
                self.shared.source.add_listener(
                    watched,
                    Arc::new(move |kind: ActivityKind| {
                        if let Some(shared) = weak.upgrade() {
                            shared.record_activity(kind);
                        }
                    }),
                    ListenerOptions::passive(),
                )
            })
            .collect::<Vec<_>>();

        let ticker = runtime.spawn(run_ticker(
            Arc::downgrade(&self.shared),
            self.shared.config.check_interval,
        ));

        info!(
            listeners = listeners.len(),
            interval_ms = self.shared.config.check_interval.as_millis(),
            "session monitor activated"
        );
        inner.lifecycle = Lifecycle::Active { listeners, ticker };
        inner.band = IdleBand::Active;
        Ok(Activation::Started)
    }

    /// Removes every listener and stops the periodic check. No-op when inactive.
    pub fn teardown(&self) {
        let previous = {
            let mut inner = self.shared.inner.lock();
            inner.band = IdleBand::Active;
            std::mem::replace(&mut inner.lifecycle, Lifecycle::Uninitialized)
        };

        if let Lifecycle::Active { listeners, ticker } = previous {
            ticker.abort();
            for id in listeners {
                self.shared.source.remove_listener(id);
            }
            info!("session monitor torn down");
        }
    }

    /// Whether the monitor is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.shared.inner.lock().lifecycle, Lifecycle::Active { .. })
    }

    /// The idle band observed by the last check.
    #[must_use]
    pub fn band(&self) -> IdleBand {
        self.shared.inner.lock().band
    }

    /// Runs one health check now, outside the periodic schedule.
    pub fn check(&self) -> IdleBand {
        self.shared.check()
    }
}

impl Drop for SessionActivityMonitor {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_ticker(shared: Weak<MonitorShared>, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(monitor) = shared.upgrade() else {
            break;
        };
        monitor.check();
    }
}

impl MonitorShared {
    fn check(&self) -> IdleBand {
        let thresholds = self.config.thresholds;
        let idle = self.session.idle_for(self.clock.now());

        let (band, entered) = {
            let mut inner = self.inner.lock();
            let band = idle.map_or(IdleBand::Active, |idle| thresholds.classify(idle));
            let previous = std::mem::replace(&mut inner.band, band);
            (band, band != previous)
        };

        // Hooks run without the lock so they may call back into the monitor.
        if entered && let Some(idle) = idle {
            match band {
                IdleBand::Warning => {
                    let remaining = thresholds.remaining(idle);
                    info!(remaining_secs = remaining.as_secs(), "session idle warning");
                    self.hooks.on_show_idle_warning(remaining);
                }
                IdleBand::Expired => {
                    info!(idle_secs = idle.as_secs(), "session expired after inactivity");
                    self.hooks.on_session_expired();
                }
                IdleBand::Active => {}
            }
        }
        band
    }

    fn record_activity(&self, kind: ActivityKind) {
        // Listeners cloned by an in-flight emit can outlive teardown.
        if !matches!(self.inner.lock().lifecycle, Lifecycle::Active { .. }) {
            return;
        }

        let now = self.clock.now();
        let thresholds = self.config.thresholds;

        // A lapsed session cannot be revived by activity.
        if let Some(idle) = self.session.idle_for(now)
            && thresholds.classify(idle) == IdleBand::Expired
        {
            return;
        }

        let spacing = if kind.is_high_frequency() {
            self.config.activity_throttle
        } else {
            Duration::ZERO
        };
        if !self
            .session
            .record_activity(now, thresholds.expiry(), spacing)
        {
            return;
        }

        let mut inner = self.inner.lock();
        if inner.band == IdleBand::Warning {
            debug!(%kind, "activity dismissed idle warning");
            inner.band = IdleBand::Active;
        }
    }
}
