//! Single-flight access token refresh.
//!
//! The first request that observes a `401` moves the coordinator from
//! `Idle` to `Refreshing` and starts the one refresh call. Every request
//! that observes a `401` meanwhile joins the waiter queue. When the call
//! settles the queue is drained, in full, before the state returns to
//! `Idle`.

use std::sync::Arc;

use gatekeep_domain::TokenPair;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::CredentialStore;
use crate::error::NormalizedError;
use crate::ports::{Clock, Navigator, RefreshError, TokenRefresher};
use crate::session::SessionState;

type Waiter = oneshot::Sender<Result<String, NormalizedError>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

struct CoordinatorInner {
    state: Mutex<RefreshState>,
    credentials: CredentialStore,
    refresher: Arc<dyn TokenRefresher>,
    navigator: Arc<dyn Navigator>,
    session: SessionState,
    clock: Arc<dyn Clock>,
    login_path: String,
}

/// Coalesces concurrent refresh demands into one refresh call.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .field("login_path", &self.inner.login_path)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(
        credentials: CredentialStore,
        refresher: Arc<dyn TokenRefresher>,
        navigator: Arc<dyn Navigator>,
        session: SessionState,
        clock: Arc<dyn Clock>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                state: Mutex::new(RefreshState::Idle),
                credentials,
                refresher,
                navigator,
                session,
                clock,
                login_path: login_path.into(),
            }),
        }
    }

    /// Whether a refresh call is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.state.lock(), RefreshState::Refreshing { .. })
    }

    /// Waits for a fresh access token, starting a refresh if none is running.
    ///
    /// Must be called from within a tokio runtime; the refresh runs on its
    /// own task so dropping this future cannot strand other waiters.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the refresh fails. By then the
    /// credentials are cleared and the session is gone.
    pub async fn wait_for_token(&self) -> Result<String, NormalizedError> {
        let (tx, rx) = oneshot::channel();

        let leader = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    waiters.push(tx);
                    false
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing { waiters: vec![tx] };
                    true
                }
            }
        };

        if leader {
            debug!("starting token refresh");
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run().await });
        } else {
            debug!("token refresh in flight, queueing request");
        }

        rx.await
            .unwrap_or_else(|_| Err(NormalizedError::from_refresh(RefreshError::Abandoned)))
    }
}

impl CoordinatorInner {
    async fn run(self: Arc<Self>) {
        let mut guard = SettleGuard {
            inner: &self,
            settled: false,
        };

        let outcome = self.refresh_once().await;
        guard.settled = true;
        self.settle(outcome);
    }

    async fn refresh_once(&self) -> Result<TokenPair, RefreshError> {
        let current = self
            .credentials
            .read()
            .filter(|pair| !pair.refresh_token.is_empty())
            .ok_or(RefreshError::MissingRefreshToken)?;

        let grant = self.refresher.refresh(&current.refresh_token).await?;
        if grant.access_token.is_empty() {
            return Err(RefreshError::InvalidResponse(
                "empty access token".to_string(),
            ));
        }
        if let Some(csrf) = grant.csrf_token.as_deref() {
            self.credentials.write_csrf_token(csrf);
        }

        Ok(current.rotate(
            grant.access_token,
            grant.refresh_token,
            self.clock.now(),
            grant.expires_in_seconds,
        ))
    }

    fn settle(&self, outcome: Result<TokenPair, RefreshError>) {
        let result = match outcome {
            Ok(tokens) => {
                self.credentials.write(&tokens);
                info!(expires_in = tokens.expires_in_seconds, "access token refreshed");
                Ok(tokens.access_token)
            }
            Err(error) => {
                warn!(%error, "token refresh failed, ending session");
                self.credentials.clear_all();
                self.session.end();
                Err(NormalizedError::from_refresh(error))
            }
        };
        let failed = result.is_err();

        {
            let mut state = self.state.lock();
            if let RefreshState::Refreshing { waiters } = &mut *state {
                debug!(waiters = waiters.len(), "releasing queued requests");
                for waiter in waiters.drain(..) {
                    // A waiter whose request was dropped has nobody to tell.
                    let _ = waiter.send(result.clone());
                }
            }
            *state = RefreshState::Idle;
        }

        if failed && self.navigator.current_location() != self.login_path {
            self.navigator.navigate_to_login();
        }
    }
}

/// Settles the queue if the refresh task ends without reaching `settle`.
struct SettleGuard<'a> {
    inner: &'a CoordinatorInner,
    settled: bool,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.settle(Err(RefreshError::Abandoned));
        }
    }
}
