//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. An optional configuration file (TOML, YAML or JSON, by extension)
//! 3. Environment variables prefixed with `GATEKEEP__`, nested keys
//!    separated by `__` (e.g. `GATEKEEP__MONITOR__WARNING_MS=60000`)
//!
//! Durations are configured in milliseconds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use gatekeep_application::config::{
    AuthEndpoints, ClientConfig, DEFAULT_CSRF_HEADER, DEFAULT_LOGIN_PATH, MonitorConfig,
};
use gatekeep_domain::IdleThresholds;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GATEKEEP";

/// Separator between the prefix and nested keys.
pub const ENV_SEPARATOR: &str = "__";

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A value is out of range.
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        /// Dotted configuration key.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Credential endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Login endpoint.
    pub login: String,
    /// Refresh endpoint.
    pub refresh: String,
    /// Logout endpoint.
    pub logout: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        let defaults = AuthEndpoints::default();
        Self {
            login: defaults.login,
            refresh: defaults.refresh,
            logout: defaults.logout,
        }
    }
}

/// Idle monitor settings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Idle time before the warning.
    pub warning_ms: u64,
    /// Idle time before expiry.
    pub expiry_ms: u64,
    /// Health check period.
    pub check_interval_ms: u64,
    /// Minimum spacing of recorded high-frequency events.
    pub activity_throttle_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        let defaults = MonitorConfig::default();
        Self {
            warning_ms: millis(defaults.thresholds.warning()),
            expiry_ms: millis(defaults.thresholds.expiry()),
            check_interval_ms: millis(defaults.check_interval),
            activity_throttle_ms: millis(defaults.activity_throttle),
        }
    }
}

/// Credential storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Credentials file; defaults to the user data directory.
    pub credentials_path: Option<PathBuf>,
    /// Keep credentials in memory only.
    pub in_memory: bool,
}

/// Complete client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the backend API.
    pub base_url: String,
    /// Transport timeout per request.
    pub request_timeout_ms: u64,
    /// Anti-forgery header name.
    pub csrf_header: String,
    /// Login destination.
    pub login_path: String,
    /// Credential endpoints.
    pub endpoints: EndpointSettings,
    /// Idle monitor.
    pub monitor: MonitorSettings,
    /// Credential storage.
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 30_000,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            endpoints: EndpointSettings::default(),
            monitor: MonitorSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from an optional file and the process environment.
    ///
    /// An explicitly given file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the result is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(file, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of
    /// the process environment when given.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the result is invalid.
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges and the base URL.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.monitor.check_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "monitor.check_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        self.thresholds()?;
        for (field, value) in [
            ("csrf_header", &self.csrf_header),
            ("endpoints.login", &self.endpoints.login),
            ("endpoints.refresh", &self.endpoints.refresh),
            ("endpoints.logout", &self.endpoints.logout),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` for anything but absolute http(s).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    fn thresholds(&self) -> Result<IdleThresholds, ConfigError> {
        IdleThresholds::new(
            Duration::from_millis(self.monitor.warning_ms),
            Duration::from_millis(self.monitor.expiry_ms),
        )
        .map_err(|e| ConfigError::Invalid {
            field: "monitor",
            reason: e.to_string(),
        })
    }

    /// Pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::new(self.base_url()?)
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms));
        config.csrf_header.clone_from(&self.csrf_header);
        config.login_path.clone_from(&self.login_path);
        config.endpoints = AuthEndpoints {
            login: self.endpoints.login.clone(),
            refresh: self.endpoints.refresh.clone(),
            logout: self.endpoints.logout.clone(),
        };
        Ok(config)
    }

    /// Idle monitor configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the thresholds are not ordered.
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let mut config = MonitorConfig::new(self.thresholds()?);
        config.check_interval = Duration::from_millis(self.monitor.check_interval_ms);
        config.activity_throttle = Duration::from_millis(self.monitor.activity_throttle_ms);
        Ok(config)
    }

    /// Absolute refresh endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the join fails.
    pub fn refresh_url(&self) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.base_url()?.as_str().trim_end_matches('/'),
            self.endpoints.refresh.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ConfigError::Invalid {
            field: "endpoints.refresh",
            reason: e.to_string(),
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
