//! Normalized error returned by the request pipeline
//!
//! Every failure that leaves [`crate::ApiClient`] has this one shape, so
//! callers never branch on transport-specific error types.

use std::fmt;

use gatekeep_domain::{ApiResponse, DomainError, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::normalize::{extract_code, extract_message};
use crate::ports::{RefreshError, TransportError};

/// Message shown when the session could not be recovered.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Category of a normalized failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response after the retry budget was spent.
    Network,
    /// Timed out after the retry budget was spent.
    Timeout,
    /// Credentials were rejected and could not be renewed.
    Authentication,
    /// Other 4xx response.
    Client,
    /// 5xx response.
    Server,
    /// The request could not be built.
    InvalidRequest,
    /// A successful response did not have the expected shape.
    Decode,
}

impl ErrorKind {
    /// Short title for display.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Network => "Network Error",
            Self::Timeout => "Request Timeout",
            Self::Authentication => "Authentication Required",
            Self::Client => "Request Rejected",
            Self::Server => "Server Error",
            Self::InvalidRequest => "Invalid Request",
            Self::Decode => "Unexpected Response",
        }
    }
}

/// Application error code, as sent by the server or derived locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// Textual code, e.g. `"EMAIL_TAKEN"`.
    Text(String),
    /// Numeric code.
    Number(i64),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(code) => f.write_str(code),
            Self::Number(code) => write!(f, "{code}"),
        }
    }
}

/// What originally went wrong.
#[derive(Debug, Clone, Error)]
pub enum ErrorCause {
    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with an error status.
    #[error("server responded with status {0}")]
    Status(StatusCode),

    /// The access token could not be renewed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// The request was rejected before sending.
    #[error(transparent)]
    InvalidRequest(#[from] DomainError),

    /// A body could not be encoded or decoded.
    #[error("{0}")]
    Serialization(String),
}

/// The only error type that crosses the pipeline boundary.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NormalizedError {
    /// Human-readable message.
    pub message: String,
    /// Application error code, if any.
    pub code: Option<ErrorCode>,
    /// HTTP status, when a response was received.
    pub http_status: Option<u16>,
    /// Response body, kept for field-level handling.
    pub response_body: Option<serde_json::Value>,
    /// Failure category.
    pub kind: ErrorKind,
    /// Original failure.
    #[source]
    pub cause: ErrorCause,
}

impl NormalizedError {
    /// Normalizes an error status response.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        let status = response.status;
        let body = response.json_value().or_else(|| {
            let text = response.text();
            (!text.trim().is_empty()).then_some(serde_json::Value::String(text))
        });
        let transport_message = format!("Request failed with status code {}", status.as_u16());

        let kind = if status == StatusCode::UNAUTHORIZED {
            ErrorKind::Authentication
        } else if status.is_server_error() {
            ErrorKind::Server
        } else {
            ErrorKind::Client
        };

        Self {
            message: extract_message(body.as_ref(), Some(&transport_message)),
            code: body.as_ref().and_then(extract_code),
            http_status: Some(status.as_u16()),
            response_body: body,
            kind,
            cause: ErrorCause::Status(status),
        }
    }

    /// Normalizes a transport failure.
    #[must_use]
    pub fn from_transport(error: TransportError) -> Self {
        let kind = match error {
            TransportError::Timeout { .. } => ErrorKind::Timeout,
            TransportError::InvalidUrl(_) | TransportError::InvalidBody(_) => {
                ErrorKind::InvalidRequest
            }
            _ => ErrorKind::Network,
        };
        let text = error.to_string();

        Self {
            message: extract_message(None, Some(&text)),
            code: Some(ErrorCode::Text(error.code().to_string())),
            http_status: None,
            response_body: None,
            kind,
            cause: ErrorCause::Transport(error),
        }
    }

    /// Normalizes a failed token refresh. Always an authentication error.
    #[must_use]
    pub fn from_refresh(error: RefreshError) -> Self {
        let http_status = match &error {
            RefreshError::Rejected { status, .. } => Some(*status),
            _ => None,
        };

        Self {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
            code: Some(ErrorCode::Text("SESSION_EXPIRED".to_string())),
            http_status,
            response_body: None,
            kind: ErrorKind::Authentication,
            cause: ErrorCause::Refresh(error),
        }
    }

    /// A request that could not be built.
    #[must_use]
    pub fn invalid_request(error: DomainError) -> Self {
        Self {
            message: error.to_string(),
            code: Some(ErrorCode::Text("INVALID_REQUEST".to_string())),
            http_status: None,
            response_body: None,
            kind: ErrorKind::InvalidRequest,
            cause: ErrorCause::InvalidRequest(error),
        }
    }

    /// A body that could not be encoded before sending.
    #[must_use]
    pub fn encode(error: &serde_json::Error) -> Self {
        Self {
            message: format!("Could not encode request body: {error}"),
            code: Some(ErrorCode::Text("INVALID_BODY".to_string())),
            http_status: None,
            response_body: None,
            kind: ErrorKind::InvalidRequest,
            cause: ErrorCause::Serialization(error.to_string()),
        }
    }

    /// A successful response whose body did not decode.
    #[must_use]
    pub fn decode(error: &serde_json::Error, response: &ApiResponse) -> Self {
        Self {
            message: format!("Unexpected response format: {error}"),
            code: Some(ErrorCode::Text("DECODE_ERROR".to_string())),
            http_status: Some(response.status.as_u16()),
            response_body: response.json_value(),
            kind: ErrorKind::Decode,
            cause: ErrorCause::Serialization(error.to_string()),
        }
    }

    /// Whether the user has to sign in again.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication)
    }
}
