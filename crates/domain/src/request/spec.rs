//! Logical API request and per-call options

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// Per-call configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Extra headers, sent after the pipeline's own headers.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Overrides the client-wide transport timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Surface `401` as an error instead of attempting a token refresh.
    ///
    /// Set for the credential endpoints themselves (login, refresh).
    #[serde(default)]
    pub skip_auth_refresh: bool,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the transport timeout for this call.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Opts this call out of the refresh-on-401 path.
    #[must_use]
    pub const fn skip_auth_refresh(mut self) -> Self {
        self.skip_auth_refresh = true;
        self
    }
}

/// A logical API call, before the pipeline decorates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the API base URL, or an absolute http(s) URL.
    pub path: String,
    /// JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Per-call configuration.
    #[serde(default)]
    pub options: RequestOptions,
}

impl ApiRequest {
    /// Creates a request without body or options.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the per-call options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves the target URL against the API base URL.
    ///
    /// Absolute `http(s)` paths are used as-is; anything else is appended
    /// to the base, preserving the base's own path prefix.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` when the result does not parse.
    pub fn resolve_url(&self, base: &Url) -> DomainResult<Url> {
        if self.path.starts_with("http://") || self.path.starts_with("https://") {
            return Url::parse(&self.path)
                .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.path)));
        }

        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| DomainError::InvalidUrl(format!("{e}: {joined}")))
    }
}
