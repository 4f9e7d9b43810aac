//! Persistent credential storage.
//!
//! Wraps a [`KeyValueStorage`] medium with typed accessors for the token
//! pair, the signed-in user and the anti-forgery token. The store never
//! fails: an unavailable or corrupted medium reads as empty and is logged.

use std::sync::Arc;

use gatekeep_domain::{TokenPair, UserSummary};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::ports::KeyValueStorage;

/// Key of the serialized token pair. One key keeps the pair atomic.
pub const TOKENS_KEY: &str = "gatekeep.tokens";
/// Key of the serialized user summary.
pub const USER_KEY: &str = "gatekeep.user";
/// Key of the anti-forgery token.
pub const CSRF_KEY: &str = "gatekeep.csrf_token";

/// Typed view over the credential medium.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Creates a store over the given medium.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Reads the token pair.
    #[must_use]
    pub fn read(&self) -> Option<TokenPair> {
        self.read_json(TOKENS_KEY)
    }

    /// The current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read()
            .map(|pair| pair.access_token)
            .filter(|token| !token.is_empty())
    }

    /// Replaces the token pair.
    pub fn write(&self, tokens: &TokenPair) {
        self.write_json(TOKENS_KEY, tokens);
    }

    /// Removes the token pair.
    pub fn clear(&self) {
        self.remove(TOKENS_KEY);
    }

    /// Reads the signed-in user.
    #[must_use]
    pub fn read_user(&self) -> Option<UserSummary> {
        self.read_json(USER_KEY)
    }

    /// Replaces the signed-in user.
    pub fn write_user(&self, user: &UserSummary) {
        self.write_json(USER_KEY, user);
    }

    /// Removes the signed-in user.
    pub fn clear_user(&self) {
        self.remove(USER_KEY);
    }

    /// Reads the anti-forgery token.
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        match self.storage.get(CSRF_KEY) {
            Ok(value) => value.filter(|token| !token.is_empty()),
            Err(error) => {
                warn!(key = CSRF_KEY, %error, "credential storage read failed");
                None
            }
        }
    }

    /// Replaces the anti-forgery token.
    pub fn write_csrf_token(&self, token: &str) {
        if let Err(error) = self.storage.set(CSRF_KEY, token) {
            warn!(key = CSRF_KEY, %error, "credential storage write failed");
        }
    }

    /// Removes the anti-forgery token.
    pub fn clear_csrf_token(&self) {
        self.remove(CSRF_KEY);
    }

    /// Removes everything the store owns.
    pub fn clear_all(&self) {
        self.clear();
        self.clear_user();
        self.clear_csrf_token();
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(key, %error, "credential storage read failed");
                return None;
            }
        };

        serde_json::from_str(&raw)
            .inspect_err(|error| warn!(key, %error, "discarding unreadable credential entry"))
            .ok()
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(key, %error, "credential entry could not be serialized");
                return;
            }
        };

        if let Err(error) = self.storage.set(key, &raw) {
            warn!(key, %error, "credential storage write failed");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(error) = self.storage.remove(key) {
            warn!(key, %error, "credential storage remove failed");
        }
    }
}
