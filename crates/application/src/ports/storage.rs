//! Key/value persistence port

use thiserror::Error;

/// Errors raised by a key/value medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium is disabled or cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored data cannot be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Synchronous string key/value medium backing the credential store.
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
