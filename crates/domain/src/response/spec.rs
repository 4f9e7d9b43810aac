//! HTTP response as seen by the client

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// `401 Unauthorized`.
    pub const UNAUTHORIZED: Self = Self(401);

    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a 5xx server error status.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Reason phrase for the statuses this client reports on.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        Some(match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => return None,
        })
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} {reason}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// HTTP response as returned by the transport.
///
/// Header names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers, lowercased names.
    pub headers: HashMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Wall time of the exchange.
    pub duration: Duration,
}

impl ApiResponse {
    /// Creates a response, normalizing header names.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        Self {
            status: StatusCode(status),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body,
            duration,
        }
    }

    /// Creates a response with a JSON body and no headers.
    #[must_use]
    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self::new(
            status,
            HashMap::from([("content-type".to_string(), "application/json".to_string())]),
            body.to_string().into_bytes(),
            Duration::ZERO,
        )
    }

    /// Returns true for 2xx responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body as UTF-8 text, lossy.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as an untyped JSON value, if it is JSON at all.
    #[must_use]
    pub fn json_value(&self) -> Option<serde_json::Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_helpers() {
        assert!(StatusCode(204).is_success());
        assert!(!StatusCode(404).is_success());
        assert!(StatusCode(503).is_server_error());
        assert!(!StatusCode(499).is_server_error());
        assert_eq!(StatusCode::UNAUTHORIZED.to_string(), "401 Unauthorized");
        assert_eq!(StatusCode(418).to_string(), "418");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = ApiResponse::new(
            200,
            HashMap::from([("X-CSRF-Token".to_string(), "tok".to_string())]),
            Vec::new(),
            Duration::ZERO,
        );
        assert_eq!(response.header("x-csrf-token"), Some("tok"));
        assert_eq!(response.header("X-Csrf-Token"), Some("tok"));
    }

    #[test]
    fn test_json_decoding() {
        #[derive(Deserialize)]
        struct Item {
            id: u32,
        }

        let response = ApiResponse::json_body(200, &json!({"id": 7}));
        assert_eq!(response.json::<Item>().unwrap().id, 7);
        assert_eq!(response.json_value(), Some(json!({"id": 7})));
    }

    #[test]
    fn test_non_json_body() {
        let response = ApiResponse::new(502, HashMap::new(), b"<html>".to_vec(), Duration::ZERO);
        assert_eq!(response.json_value(), None);
        assert_eq!(response.text(), "<html>");
    }
}
