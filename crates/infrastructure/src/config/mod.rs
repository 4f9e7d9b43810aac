//! Configuration loading

mod settings;

pub use settings::{
    ConfigError, DEFAULT_BASE_URL, ENV_PREFIX, ENV_SEPARATOR, EndpointSettings, MonitorSettings,
    Settings, StorageSettings,
};
