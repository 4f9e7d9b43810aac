//! Access/refresh token pair with issue metadata

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access token lifetime assumed when the server does not report one.
pub const DEFAULT_EXPIRES_IN_SECONDS: i64 = 900;

/// The credential pair shared by every outbound request.
///
/// The expiry metadata is informational only: a present access token is
/// never rejected client-side, the server's `401` is the source of truth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived credential presented as a bearer token.
    pub access_token: String,
    /// Longer-lived credential exchanged for a new access token.
    pub refresh_token: String,
    /// When the pair was issued.
    pub issued_at: DateTime<Utc>,
    /// Lifetime of the access token as reported by the server.
    pub expires_in_seconds: i64,
}

impl TokenPair {
    /// Creates a token pair with an explicit issue time.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in_seconds: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at,
            expires_in_seconds,
        }
    }

    /// Builds the pair that replaces `self` after a refresh.
    ///
    /// Servers that do not rotate refresh tokens omit it from the refresh
    /// response, in which case the current one is carried over.
    #[must_use]
    pub fn rotate(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        issued_at: DateTime<Utc>,
        expires_in_seconds: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.unwrap_or_else(|| self.refresh_token.clone()),
            issued_at,
            expires_in_seconds,
        }
    }

    /// When the access token is expected to lapse.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.expires_in_seconds)
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &token_preview(&self.access_token))
            .field("refresh_token", &token_preview(&self.refresh_token))
            .field("issued_at", &self.issued_at)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}

/// Get a preview of a token (first 8 chars + ...), safe for logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        let cut = token
            .char_indices()
            .nth(8)
            .map_or(token.len(), |(idx, _)| idx);
        format!("{}...", &token[..cut])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn test_expires_at_adds_lifetime() {
        let pair = TokenPair::new("access", "refresh", issued(), 900);
        assert_eq!(pair.expires_at(), issued() + Duration::seconds(900));
    }

    #[test]
    fn test_rotate_keeps_refresh_token_when_omitted() {
        let pair = TokenPair::new("old-access", "refresh-1", issued(), 900);
        let rotated = pair.rotate("new-access", None, issued(), 600);
        assert_eq!(rotated.access_token, "new-access");
        assert_eq!(rotated.refresh_token, "refresh-1");
        assert_eq!(rotated.expires_in_seconds, 600);

        let rotated = pair.rotate("new-access", Some("refresh-2".to_string()), issued(), 600);
        assert_eq!(rotated.refresh_token, "refresh-2");
    }

    #[test]
    fn test_authorization_header() {
        let pair = TokenPair::new("abc", "def", issued(), 60);
        assert_eq!(pair.authorization_header(), "Bearer abc");
    }

    #[test]
    fn test_debug_does_not_leak_tokens() {
        let pair = TokenPair::new("eyJhbGciOiJIUzI1NiJ9.secret", "short", issued(), 60);
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("eyJhbGci..."));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "***");
    }
}
