//! Client and monitor configuration
//!
//! All values are externally supplied constants; the infrastructure layer
//! loads them from files and the environment.

use std::time::Duration;

use gatekeep_domain::IdleThresholds;
use url::Url;

/// Default transport timeout per request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default anti-forgery header name.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-Token";

/// Default login destination.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Paths of the credential endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Exchanges credentials for a token pair.
    pub login: String,
    /// Exchanges a refresh token for a new access token.
    pub refresh: String,
    /// Invalidates the session server-side.
    pub logout: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            refresh: "/auth/refresh".to_string(),
            logout: "/auth/logout".to_string(),
        }
    }
}

/// Request pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub base_url: Url,
    /// Transport timeout applied to every request unless overridden.
    pub request_timeout: Duration,
    /// Header carrying the anti-forgery token on mutating requests.
    pub csrf_header: String,
    /// Navigation location of the login page.
    pub login_path: String,
    /// Credential endpoints.
    pub endpoints: AuthEndpoints,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            endpoints: AuthEndpoints::default(),
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Idle monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Warning and expiry thresholds.
    pub thresholds: IdleThresholds,
    /// Period of the session health check.
    pub check_interval: Duration,
    /// Minimum spacing between recorded high-frequency events.
    pub activity_throttle: Duration,
}

impl MonitorConfig {
    /// Creates a configuration with the default interval and throttle.
    #[must_use]
    pub const fn new(thresholds: IdleThresholds) -> Self {
        Self {
            thresholds,
            check_interval: Duration::from_secs(30),
            activity_throttle: Duration::from_secs(1),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(IdleThresholds::default())
    }
}
