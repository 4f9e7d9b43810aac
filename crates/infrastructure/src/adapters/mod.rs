//! Adapters implementing the transport and clock ports

mod reqwest_transport;
mod system_clock;

pub use reqwest_transport::{ReqwestTransport, USER_AGENT};
pub use system_clock::SystemClock;
