//! Authenticated user types

use serde::{Deserialize, Serialize};

/// The subset of the user profile the client keeps for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Server-side identifier.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Login name.
    pub username: String,
    /// Contact email, when the server exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Role names granted to the user.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserSummary {
    /// Creates a user summary with only the mandatory fields.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
            full_name: None,
            roles: Vec::new(),
        }
    }

    /// Name to show in prompts: the full name if known, else the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// Backends disagree on numeric vs string ids; accept both.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Username/password pair submitted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    /// Login name.
    pub username: String,
    /// Password, never printed.
    pub password: String,
}

impl LoginCredentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
