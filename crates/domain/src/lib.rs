//! Gatekeep Domain - Core types
//!
//! This crate defines the domain model for the Gatekeep API client:
//! credentials, session records, request/response shapes and idle
//! detection thresholds. All types here are pure Rust with no I/O.

pub mod activity;
pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod session;

pub use activity::ActivityKind;
pub use auth::{
    DEFAULT_EXPIRES_IN_SECONDS, LoginCredentials, TokenPair, UserSummary, token_preview,
};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, HttpMethod, RequestOptions};
pub use response::{ApiResponse, StatusCode};
pub use session::{IdleBand, IdleThresholds, SessionRecord};
