//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Idle thresholds are inconsistent.
    #[error("invalid idle thresholds: {0}")]
    InvalidThresholds(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
