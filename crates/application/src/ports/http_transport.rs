//! HTTP transport port

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use gatekeep_domain::{ApiResponse, HttpMethod};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send + 'a>>;

/// A fully decorated request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Correlates every attempt of one logical request in logs.
    pub request_id: Uuid,
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: Url,
    /// Headers in send order.
    pub headers: Vec<(String, String)>,
    /// Encoded body.
    pub body: Option<Vec<u8>>,
    /// Transport-level timeout for this attempt.
    pub timeout: Duration,
}

impl OutboundRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The bearer token carried by this request, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

/// Failures below the HTTP layer. Status responses are never errors here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that was exceeded.
        timeout_ms: u64,
    },

    /// The connection was dropped mid-exchange.
    #[error("Connection aborted: {0}")]
    ConnectionAborted(String),

    /// The server refused the connection.
    #[error("Connection refused: {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// Target host.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// Any other connect-phase failure.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL could not be used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The body could not be sent.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure is a transient network condition worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionAborted(_)
                | Self::ConnectionRefused { .. }
                | Self::DnsError { .. }
                | Self::ConnectionFailed(_)
        )
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "TIMEOUT",
            Self::ConnectionAborted(_) => "CONNECTION_ABORTED",
            Self::ConnectionRefused { .. } => "CONNECTION_REFUSED",
            Self::DnsError { .. } => "DNS_FAILURE",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Other(_) => "TRANSPORT_ERROR",
        }
    }
}

/// Port for putting requests on the wire.
///
/// Implementations return `Ok` for every HTTP response, whatever its status,
/// and `Err` only when no response was received.
pub trait HttpTransport: Send + Sync {
    /// Sends one attempt of a request.
    fn send(&self, request: &OutboundRequest) -> TransportFuture<'_>;
}
