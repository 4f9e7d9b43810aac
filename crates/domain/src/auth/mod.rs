//! Authentication domain types

mod token;
mod user;

pub use token::{DEFAULT_EXPIRES_IN_SECONDS, TokenPair, token_preview};
pub use user::{LoginCredentials, UserSummary};
