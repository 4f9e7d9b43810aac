//! The request pipeline.

use std::sync::Arc;
use std::time::Duration;

use gatekeep_domain::{ApiRequest, ApiResponse, HttpMethod, RequestOptions, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::RETRY_COUNT_HEADER;
use crate::auth::{CredentialStore, RefreshCoordinator};
use crate::config::ClientConfig;
use crate::error::NormalizedError;
use crate::ports::{HttpTransport, OutboundRequest};
use crate::retry::RetryPolicy;

/// Bookkeeping for one logical request across its attempts.
#[derive(Debug, Default)]
struct RequestChain {
    retry_count: u32,
    auth_retried: bool,
    replay_token: Option<String>,
}

/// Authenticated API client.
///
/// Decorates every request with the stored credentials, recovers from an
/// expired access token through the [`RefreshCoordinator`], retries transient
/// network failures and normalizes everything else into a
/// [`NormalizedError`]. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    credentials: CredentialStore,
    coordinator: RefreshCoordinator,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client with the default retry policy.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        credentials: CredentialStore,
        coordinator: RefreshCoordinator,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            credentials,
            coordinator,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn get(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(ApiRequest::new(HttpMethod::Get, path).with_options(options))
            .await
    }

    /// Sends a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn head(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(ApiRequest::new(HttpMethod::Head, path).with_options(options))
            .await
    }

    /// Sends an OPTIONS request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn options(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(ApiRequest::new(HttpMethod::Options, path).with_options(options))
            .await
    }

    /// Sends a POST request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(with_body(HttpMethod::Post, path, body, options))
            .await
    }

    /// Sends a PUT request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn put(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(with_body(HttpMethod::Put, path, body, options))
            .await
    }

    /// Sends a PATCH request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn patch(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(with_body(HttpMethod::Patch, path, body, options))
            .await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request.
    pub async fn delete(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, NormalizedError> {
        self.execute(with_body(HttpMethod::Delete, path, body, options))
            .await
    }

    /// Sends a request and decodes a successful JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure of the request, or a `Decode` error
    /// when the body does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, NormalizedError> {
        let response = self.execute(request).await?;
        response
            .json()
            .map_err(|error| NormalizedError::decode(&error, &response))
    }

    /// Runs a request through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizedError`] for every failure: an error status, a
    /// transport failure after the retry budget, a failed token refresh or a
    /// request that could not be built.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, NormalizedError> {
        let url = request
            .resolve_url(&self.config.base_url)
            .map_err(NormalizedError::invalid_request)?;
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|error| NormalizedError::encode(&error))?;
        let timeout = request
            .options
            .timeout
            .unwrap_or(self.config.request_timeout);
        let request_id = Uuid::now_v7();
        let mut chain = RequestChain::default();

        loop {
            let outbound = self.decorate(&request, &url, body.clone(), timeout, request_id, &chain);
            debug!(
                %request_id,
                method = %request.method,
                url = %url,
                retry = chain.retry_count,
                "sending request"
            );

            let error = match self.transport.send(&outbound).await {
                Ok(response) if response.is_success() => {
                    debug!(%request_id, status = %response.status, "request succeeded");
                    self.capture_csrf_token(&response);
                    return Ok(response);
                }
                Ok(response)
                    if response.status == StatusCode::UNAUTHORIZED
                        && !request.options.skip_auth_refresh
                        && !chain.auth_retried =>
                {
                    let stored = self.credentials.access_token();
                    chain.auth_retried = true;
                    if stored.is_some() && stored.as_deref() != outbound.bearer_token() {
                        // A refresh committed after this attempt was sent.
                        debug!(%request_id, "replaying with the newer stored token");
                        chain.replay_token = stored;
                        continue;
                    }

                    debug!(%request_id, "access token rejected, waiting for refresh");
                    chain.replay_token = Some(self.coordinator.wait_for_token().await?);
                    continue;
                }
                Ok(response) => {
                    debug!(%request_id, status = %response.status, "request failed");
                    return Err(NormalizedError::from_response(&response));
                }
                Err(error) => error,
            };

            if error.is_transient() && self.retry.should_retry(chain.retry_count) {
                let delay = self.retry.delay_for(chain.retry_count);
                warn!(
                    %request_id,
                    %error,
                    attempt = chain.retry_count + 1,
                    delay_ms = delay.as_millis(),
                    "transient network failure, retrying"
                );
                tokio::time::sleep(delay).await;
                chain.retry_count += 1;
                continue;
            }

            warn!(%request_id, %error, retries = chain.retry_count, "request failed without response");
            return Err(NormalizedError::from_transport(error));
        }
    }

    fn decorate(
        &self,
        request: &ApiRequest,
        url: &Url,
        body: Option<Vec<u8>>,
        timeout: Duration,
        request_id: Uuid,
        chain: &RequestChain,
    ) -> OutboundRequest {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];

        if let Some(token) = chain
            .replay_token
            .clone()
            .or_else(|| self.credentials.access_token())
        {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        if request.method.is_mutating()
            && let Some(csrf) = self.credentials.csrf_token()
        {
            headers.push((self.config.csrf_header.clone(), csrf));
        }

        headers.push((RETRY_COUNT_HEADER.to_string(), chain.retry_count.to_string()));

        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        for (name, value) in &request.options.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        OutboundRequest {
            request_id,
            method: request.method,
            url: url.clone(),
            headers,
            body,
            timeout,
        }
    }

    fn capture_csrf_token(&self, response: &ApiResponse) {
        if let Some(token) = response
            .header(&self.config.csrf_header)
            .filter(|token| !token.is_empty())
            && self.credentials.csrf_token().as_deref() != Some(token)
        {
            debug!("storing anti-forgery token from response");
            self.credentials.write_csrf_token(token);
        }
    }
}

fn with_body(
    method: HttpMethod,
    path: &str,
    body: Option<Value>,
    options: RequestOptions,
) -> ApiRequest {
    let request = ApiRequest::new(method, path).with_options(options);
    match body {
        Some(body) => request.with_body(body),
        None => request,
    }
}
