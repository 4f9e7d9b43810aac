//! Token refresh adapter

mod http_refresher;

pub use http_refresher::HttpTokenRefresher;
