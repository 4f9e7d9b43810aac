//! Sign-in, restore, sign-out and expiry.
//!
//! The only place that creates or destroys the session record outside of
//! the refresh failure path.

use std::sync::Arc;
use std::time::Duration;

use gatekeep_domain::{
    ApiRequest, DEFAULT_EXPIRES_IN_SECONDS, HttpMethod, LoginCredentials, RequestOptions,
    SessionRecord, TokenPair, UserSummary, token_preview,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::CredentialStore;
use crate::error::NormalizedError;
use crate::pipeline::ApiClient;
use crate::ports::{Clock, Navigator};
use crate::session::SessionState;

/// Payload of a successful login.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    user: UserSummary,
    #[serde(default)]
    csrf_token: Option<String>,
}

const fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECONDS
}

/// Authentication flow bound to one client.
#[derive(Clone)]
pub struct AuthSession {
    client: ApiClient,
    credentials: CredentialStore,
    session: SessionState,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    idle_expiry: Duration,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .field("idle_expiry", &self.idle_expiry)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Creates the flow. `idle_expiry` sets the initial session deadline.
    #[must_use]
    pub fn new(
        client: ApiClient,
        credentials: CredentialStore,
        session: SessionState,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        idle_expiry: Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            session,
            navigator,
            clock,
            idle_expiry,
        }
    }

    /// The shared session state.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// The signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<UserSummary> {
        self.session.user()
    }

    /// Whether a session exists.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Exchanges credentials for a token pair and starts a session.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the login call. A rejected login
    /// never triggers a token refresh.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserSummary, NormalizedError> {
        let body = serde_json::to_value(credentials).map_err(|error| NormalizedError::encode(&error))?;
        let request = ApiRequest::new(HttpMethod::Post, &self.client.config().endpoints.login)
            .with_body(body)
            .with_options(RequestOptions::new().skip_auth_refresh());

        let response: LoginResponse = self.client.send_json(request).await?;
        let now = self.clock.now();

        self.credentials.write(&TokenPair::new(
            response.access_token,
            response.refresh_token,
            now,
            response.expires_in,
        ));
        self.credentials.write_user(&response.user);
        if let Some(csrf) = response.csrf_token.as_deref().filter(|t| !t.is_empty()) {
            self.credentials.write_csrf_token(csrf);
        }
        self.session
            .begin(SessionRecord::start(response.user.clone(), now, self.idle_expiry));

        info!(
            user = %response.user.username,
            token = %self.credentials.access_token().map(|t| token_preview(&t)).unwrap_or_default(),
            "signed in"
        );
        Ok(response.user)
    }

    /// Rebuilds the session from persisted credentials at startup.
    ///
    /// A half-written store (tokens without user or the reverse) is cleared.
    pub fn restore(&self) -> Option<UserSummary> {
        let tokens = self.credentials.access_token();
        let user = self.credentials.read_user();

        match (tokens, user) {
            (Some(_), Some(user)) => {
                self.session
                    .begin(SessionRecord::start(user.clone(), self.clock.now(), self.idle_expiry));
                info!(user = %user.username, "session restored");
                Some(user)
            }
            (None, None) => None,
            _ => {
                warn!("discarding incomplete stored credentials");
                self.credentials.clear_all();
                None
            }
        }
    }

    /// Signs out: tells the server (best effort), clears the credentials,
    /// ends the session and navigates to login.
    pub async fn logout(&self) {
        if let Some(tokens) = self.credentials.read() {
            let result = self
                .client
                .post(
                    &self.client.config().endpoints.logout,
                    Some(json!({ "refresh_token": tokens.refresh_token })),
                    RequestOptions::new().skip_auth_refresh(),
                )
                .await;
            if let Err(error) = result {
                warn!(%error, "server-side logout failed, clearing local session anyway");
            }
        }

        self.terminate();
        info!("signed out");
    }

    /// Ends the session after idle expiry. Clears before navigating.
    pub fn expire(&self) {
        info!("session expired, signing out");
        self.terminate();
    }

    fn terminate(&self) {
        self.credentials.clear_all();
        self.session.end();
        if self.navigator.current_location() != self.client.config().login_path {
            self.navigator.navigate_to_login();
        }
    }
}
