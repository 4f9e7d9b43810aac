//! Activity event sources

mod bus;

pub use bus::ActivityBus;
