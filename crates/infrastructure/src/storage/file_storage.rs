//! File-backed key-value storage.
//!
//! All entries live in one JSON object:
//! ```json
//! {
//!   "gatekeep.csrf_token": "...",
//!   "gatekeep.tokens": "{\"access_token\":\"...\"}"
//! }
//! ```
//! Writes go to a sibling temp file that is then renamed over the original,
//! so a crash never leaves a half-written credentials file behind.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gatekeep_application::ports::{KeyValueStorage, StorageError};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// File name used when only a directory is configured.
pub const DEFAULT_FILE_NAME: &str = "credentials.json";

type Entries = BTreeMap<String, String>;

/// Persistent storage in a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Creates a storage backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Storage at `<user data dir>/gatekeep/credentials.json`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the platform has no data dir.
    pub fn in_data_dir() -> Result<Self, StorageError> {
        default_path().map(Self::new)
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::Serialization(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn load_for_update(&self) -> Result<Entries, StorageError> {
        match self.load() {
            Err(StorageError::Serialization(message)) => {
                warn!(%message, "credentials file unreadable, starting over");
                Ok(Entries::new())
            }
            other => other,
        }
    }

    fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut content = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        content.push(b'\n');

        let temp = self.temp_path();
        write_private(&temp, &content)?;
        fs::rename(&temp, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&temp);
        })?;
        debug!(path = %self.path.display(), entries = entries.len(), "credentials file written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Default credentials file location.
///
/// # Errors
///
/// Returns `StorageError::Unavailable` when the platform has no data dir.
pub fn default_path() -> Result<PathBuf, StorageError> {
    dirs::data_dir()
        .map(|dir| dir.join("gatekeep").join(DEFAULT_FILE_NAME))
        .ok_or_else(|| StorageError::Unavailable("no user data directory".to_string()))
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> io::Result<()> {
    fs::write(path, content)
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load_for_update()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().expect("Failed to create temp directory");
        let storage = FileStorage::new(dir.path().join("nested").join("creds.json"));
        assert_eq!(storage.get("anything").unwrap(), None);
        storage.remove("anything").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_set_persists_across_instances() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("nested").join("creds.json");

        let storage = FileStorage::new(&path);
        storage.set("gatekeep.csrf_token", "csrf-1").unwrap();
        storage.set("gatekeep.user", r#"{"id":"7"}"#).unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get("gatekeep.csrf_token").unwrap().as_deref(),
            Some("csrf-1")
        );
        assert_eq!(
            reopened.get("gatekeep.user").unwrap().as_deref(),
            Some(r#"{"id":"7"}"#)
        );
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn test_remove_keeps_other_entries() {
        let dir = tempdir().expect("Failed to create temp directory");
        let storage = FileStorage::new(dir.path().join("creds.json"));
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        storage.remove("a").unwrap();

        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_corrupted_file_reports_then_recovers_on_write() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("creds.json");
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("a"),
            Err(StorageError::Serialization(_))
        ));

        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("Failed to create temp directory");
        let storage = FileStorage::new(dir.path().join("creds.json"));
        storage.set("a", "1").unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let storage = FileStorage::new("/data/gatekeep/credentials.json");
        assert_eq!(
            storage.temp_path(),
            PathBuf::from("/data/gatekeep/credentials.json.tmp")
        );
    }
}
