//! Hand-written port doubles shared by the integration suites.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeep_application::ports::{
    Clock, HttpTransport, KeyValueStorage, Navigator, OutboundRequest, RefreshError,
    RefreshGrant, StorageError, TokenRefresher, TransportError, TransportFuture,
};
use gatekeep_application::{
    ApiClient, AuthSession, ClientConfig, CredentialStore, RefreshCoordinator, SessionState,
};
use gatekeep_domain::{ApiResponse, TokenPair};
use parking_lot::Mutex;
use url::Url;

pub const BASE_URL: &str = "https://api.example.test/api";

type Handler = dyn Fn(&OutboundRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Transport answering from a closure and recording every attempt.
pub struct MockTransport {
    handler: Box<Handler>,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&OutboundRequest) -> Result<ApiResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// A backend that accepts exactly one bearer token.
    pub fn accepting(token: &'static str) -> Arc<Self> {
        Self::new(move |request| {
            if request.bearer_token() == Some(token) {
                Ok(ApiResponse::json_body(200, &serde_json::json!({"ok": true})))
            } else {
                Ok(ApiResponse::json_body(
                    401,
                    &serde_json::json!({"detail": "Token expired"}),
                ))
            }
        })
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: &OutboundRequest) -> TransportFuture<'_> {
        self.sent.lock().push(request.clone());
        let result = (self.handler)(request);
        Box::pin(async move { result })
    }
}

/// Refresher that resolves after a delay with a scripted outcome.
pub struct MockRefresher {
    outcome: Result<RefreshGrant, RefreshError>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockRefresher {
    pub fn granting(access_token: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(RefreshGrant {
                access_token: access_token.to_string(),
                refresh_token: None,
                expires_in_seconds: 900,
                csrf_token: None,
            }),
            delay,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: RefreshError, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(error),
            delay,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshGrant, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(refresh_token.to_string());
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}

#[derive(Default)]
pub struct MapStorage(Mutex<HashMap<String, String>>);

impl KeyValueStorage for MapStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.lock().remove(key);
        Ok(())
    }
}

/// Navigator with a settable location that counts redirects.
pub struct RecordingNavigator {
    location: Mutex<String>,
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn at(location: &str) -> Arc<Self> {
        Arc::new(Self {
            location: Mutex::new(location.to_string()),
            redirects: AtomicUsize::new(0),
        })
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> String {
        self.location.lock().clone()
    }

    fn navigate_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        *self.location.lock() = "/login".to_string();
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Everything wired the way the binary wires it, over doubles.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub refresher: Arc<MockRefresher>,
    pub navigator: Arc<RecordingNavigator>,
    pub credentials: CredentialStore,
    pub session: SessionState,
    pub coordinator: RefreshCoordinator,
    pub client: ApiClient,
    pub auth: AuthSession,
}

impl Harness {
    pub fn new(
        transport: Arc<MockTransport>,
        refresher: Arc<MockRefresher>,
        navigator: Arc<RecordingNavigator>,
    ) -> Self {
        let credentials = CredentialStore::new(Arc::new(MapStorage::default()));
        Self::with_credentials(transport, refresher, navigator, credentials)
    }

    pub fn with_credentials(
        transport: Arc<MockTransport>,
        refresher: Arc<MockRefresher>,
        navigator: Arc<RecordingNavigator>,
        credentials: CredentialStore,
    ) -> Self {
        let clock = Arc::new(FixedClock(Utc::now()));
        let session = SessionState::new();
        let config = ClientConfig::new(Url::parse(BASE_URL).unwrap());
        let coordinator = RefreshCoordinator::new(
            credentials.clone(),
            refresher.clone(),
            navigator.clone(),
            session.clone(),
            clock.clone(),
            config.login_path.clone(),
        );
        let client = ApiClient::new(
            config,
            transport.clone(),
            credentials.clone(),
            coordinator.clone(),
        );
        let auth = AuthSession::new(
            client.clone(),
            credentials.clone(),
            session.clone(),
            navigator.clone(),
            clock,
            Duration::from_secs(1800),
        );

        Self {
            transport,
            refresher,
            navigator,
            credentials,
            session,
            coordinator,
            client,
            auth,
        }
    }

    /// Stores a token pair as if a login had happened earlier.
    pub fn store_tokens(&self, access: &str, refresh: &str) {
        self.credentials
            .write(&TokenPair::new(access, refresh, Utc::now(), 900));
    }
}
