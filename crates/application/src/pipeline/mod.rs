//! Request pipeline: decoration, refresh on 401, retry and normalization

mod client;
pub mod normalize;

pub use client::ApiClient;

/// Header mirroring how many transient-failure retries preceded an attempt.
pub const RETRY_COUNT_HEADER: &str = "X-Retry-Count";
