//! Key-value storage adapters for the credential store

mod file_storage;
mod memory_storage;

pub use file_storage::{DEFAULT_FILE_NAME, FileStorage, default_path};
pub use memory_storage::MemoryStorage;
