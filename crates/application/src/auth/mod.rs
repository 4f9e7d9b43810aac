//! Credentials, token refresh and the sign-in flow
//!
//! This module provides:
//! - The typed credential store over a key-value medium
//! - The single-flight refresh coordinator
//! - The authentication flow that creates and destroys sessions

mod credential_store;
mod flow;
mod refresh;

pub use credential_store::{CSRF_KEY, CredentialStore, TOKENS_KEY, USER_KEY};
pub use flow::AuthSession;
pub use refresh::RefreshCoordinator;
