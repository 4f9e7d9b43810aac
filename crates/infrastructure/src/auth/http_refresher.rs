//! Token refresher calling the backend refresh endpoint.
//!
//! Talks to the transport directly rather than through the request
//! pipeline, so a rejected refresh can never re-enter the 401 path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gatekeep_application::ports::{
    HttpTransport, OutboundRequest, RefreshError, RefreshGrant, TokenRefresher,
};
use gatekeep_domain::{DEFAULT_EXPIRES_IN_SECONDS, HttpMethod};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Refresh endpoint response.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    csrf_token: Option<String>,
}

/// Error payload of a rejected refresh.
#[derive(Debug, Deserialize)]
struct RefreshErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// `TokenRefresher` posting `{"refresh_token": ...}` as JSON.
pub struct HttpTokenRefresher {
    transport: Arc<dyn HttpTransport>,
    endpoint: Url,
    csrf_header: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpTokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenRefresher")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTokenRefresher {
    /// Creates a refresher for an absolute endpoint URL.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoint: Url,
        csrf_header: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            endpoint,
            csrf_header: csrf_header.into(),
            timeout,
        }
    }

    fn rejection_message(body: &[u8], status: u16) -> String {
        serde_json::from_slice::<RefreshErrorResponse>(body)
            .ok()
            .and_then(|e| e.detail.or(e.message).or(e.error_description))
            .unwrap_or_else(|| format!("Refresh failed with status code {status}"))
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshGrant, RefreshError> {
        let body = serde_json::to_vec(&json!({ "refresh_token": refresh_token }))
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        let request = OutboundRequest {
            request_id: Uuid::now_v7(),
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
            timeout: self.timeout,
        };

        debug!(request_id = %request.request_id, url = %self.endpoint, "calling refresh endpoint");
        let response = self.transport.send(&request).await?;

        if !response.is_success() {
            let status = response.status.as_u16();
            return Err(RefreshError::Rejected {
                status,
                message: Self::rejection_message(&response.body, status),
            });
        }

        let payload: RefreshResponse = response
            .json()
            .map_err(|e| RefreshError::InvalidResponse(format!("Failed to parse refresh response: {e}")))?;

        let csrf_token = payload.csrf_token.or_else(|| {
            response
                .header(&self.csrf_header)
                .map(ToString::to_string)
        });

        Ok(RefreshGrant {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token.filter(|t| !t.is_empty()),
            expires_in_seconds: payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS),
            csrf_token,
        })
    }
}
