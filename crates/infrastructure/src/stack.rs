//! Wiring of the client core over concrete adapters.

use std::sync::Arc;

use gatekeep_application::ports::{
    ActivitySource, Clock, HttpTransport, KeyValueStorage, Navigator, SessionHooks, StorageError,
};
use gatekeep_application::{
    ApiClient, AuthSession, CredentialStore, MonitorConfig, RefreshCoordinator,
    SessionActivityMonitor, SessionState,
};
use tracing::info;

use crate::activity::ActivityBus;
use crate::auth::HttpTokenRefresher;
use crate::config::{ConfigError, Settings};
use crate::storage::{FileStorage, MemoryStorage};

/// Picks the credential medium the settings ask for.
///
/// # Errors
///
/// Returns `StorageError::Unavailable` when no file location can be found.
pub fn storage_from_settings(settings: &Settings) -> Result<Arc<dyn KeyValueStorage>, StorageError> {
    if settings.storage.in_memory {
        info!("credentials kept in memory only");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let storage = match &settings.storage.credentials_path {
        Some(path) => FileStorage::new(path),
        None => FileStorage::in_data_dir()?,
    };
    info!(path = %storage.path().display(), "credentials file");
    Ok(Arc::new(storage))
}

/// One fully wired client: store, session, refresh, pipeline and auth flow
/// sharing state, plus the activity bus the idle monitor listens on.
#[derive(Clone)]
pub struct ClientStack {
    /// Credential store.
    pub credentials: CredentialStore,
    /// Current session.
    pub session: SessionState,
    /// Single-flight refresh.
    pub coordinator: RefreshCoordinator,
    /// Request pipeline.
    pub client: ApiClient,
    /// Sign-in flow.
    pub auth: AuthSession,
    /// Activity events for the idle monitor.
    pub activity: Arc<ActivityBus>,
    /// Clock shared by every component.
    pub clock: Arc<dyn Clock>,
    monitor_config: MonitorConfig,
}

impl std::fmt::Debug for ClientStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStack")
            .field("client", &self.client)
            .field("auth", &self.auth)
            .field("activity", &self.activity)
            .finish_non_exhaustive()
    }
}

impl ClientStack {
    /// Wires the stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(
        settings: &Settings,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn KeyValueStorage>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let client_config = settings.client_config()?;
        let monitor_config = settings.monitor_config()?;

        let credentials = CredentialStore::new(storage);
        let session = SessionState::new();
        let refresher = Arc::new(HttpTokenRefresher::new(
            Arc::clone(&transport),
            settings.refresh_url()?,
            client_config.csrf_header.clone(),
            client_config.request_timeout,
        ));
        let coordinator = RefreshCoordinator::new(
            credentials.clone(),
            refresher,
            Arc::clone(&navigator),
            session.clone(),
            Arc::clone(&clock),
            client_config.login_path.clone(),
        );
        let client = ApiClient::new(
            client_config,
            transport,
            credentials.clone(),
            coordinator.clone(),
        );
        let auth = AuthSession::new(
            client.clone(),
            credentials.clone(),
            session.clone(),
            navigator,
            Arc::clone(&clock),
            monitor_config.thresholds.expiry(),
        );

        Ok(Self {
            credentials,
            session,
            coordinator,
            client,
            auth,
            activity: Arc::new(ActivityBus::new()),
            clock,
            monitor_config,
        })
    }

    /// Configuration the idle monitor will run with.
    #[must_use]
    pub const fn monitor_config(&self) -> &MonitorConfig {
        &self.monitor_config
    }

    /// Creates an inactive idle monitor over this stack's session and bus.
    #[must_use]
    pub fn monitor(&self, hooks: Arc<dyn SessionHooks>) -> SessionActivityMonitor {
        let source: Arc<dyn ActivitySource> = self.activity.clone();
        SessionActivityMonitor::new(
            source,
            self.session.clone(),
            Arc::clone(&self.clock),
            hooks,
            self.monitor_config,
        )
    }
}
