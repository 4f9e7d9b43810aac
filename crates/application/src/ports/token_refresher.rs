//! Token refresh port

use async_trait::async_trait;
use thiserror::Error;

use super::TransportError;

/// What the refresh endpoint hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshGrant {
    /// The new access token.
    pub access_token: String,
    /// A rotated refresh token, if the server rotates them.
    pub refresh_token: Option<String>,
    /// Lifetime of the new access token.
    pub expires_in_seconds: i64,
    /// A new anti-forgery token, if the server issued one.
    pub csrf_token: Option<String>,
}

/// Why a refresh did not produce a new access token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// Nothing to refresh with.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The server answered with a non-success status.
    #[error("refresh rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status of the refresh response.
        status: u16,
        /// Server-provided reason.
        message: String,
    },

    /// The refresh call never got a response.
    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),

    /// The refresh response could not be understood.
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The refresh task ended without settling.
    #[error("refresh was abandoned before completing")]
    Abandoned,
}

/// Exchanges a refresh token for a new access token.
///
/// Implementations must talk to the network directly, never through the
/// request pipeline, so a rejected refresh cannot re-enter the refresh path.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Performs one refresh call.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshGrant, RefreshError>;
}
