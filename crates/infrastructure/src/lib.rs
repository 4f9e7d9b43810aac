//! Gatekeep Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, the configuration loader and the
//! wiring that assembles them into a working client.

pub mod activity;
pub mod adapters;
pub mod auth;
pub mod config;
pub mod stack;
pub mod storage;

pub use activity::ActivityBus;
pub use adapters::{ReqwestTransport, SystemClock};
pub use auth::HttpTokenRefresher;
pub use config::{ConfigError, Settings};
pub use stack::{ClientStack, storage_from_settings};
pub use storage::{FileStorage, MemoryStorage};
