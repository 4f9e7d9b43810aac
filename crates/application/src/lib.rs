//! Gatekeep Application - Ports and client core
//!
//! This crate defines the application layer with:
//! - Port traits (transport, storage, clock, navigation, activity events)
//! - The request pipeline with retry and single-flight token refresh
//! - The authentication flow and the idle session monitor
//! - Error normalization at the pipeline boundary

pub mod auth;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod retry;
pub mod session;

pub use auth::{AuthSession, CredentialStore, RefreshCoordinator};
pub use config::{AuthEndpoints, ClientConfig, MonitorConfig};
pub use error::{ErrorCause, ErrorCode, ErrorKind, NormalizedError};
pub use pipeline::{ApiClient, RETRY_COUNT_HEADER};
pub use retry::RetryPolicy;
pub use session::{Activation, MonitorError, SessionActivityMonitor, SessionState};
