//! Session state and idle monitoring

mod monitor;
mod state;

pub use monitor::{Activation, MonitorError, SessionActivityMonitor};
pub use state::SessionState;
