use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::constants::{DATA_DIR_NAME, STORAGE_FILE_NAME};
use crate::error::StorageError;

/// Platform data directory for persisted reader state.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

/// Flat string key-value store backed by a single JSON file.
///
/// Every mutation rewrites the whole file. Writes are best effort: a failed
/// write is logged and the in-memory state keeps serving the session.
#[derive(Debug)]
pub struct Storage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl Storage {
    /// Opens the store under `dir`, creating the directory if needed.
    ///
    /// A missing file means a first run and yields an empty store. An
    /// unreadable file is discarded rather than aborting startup.
    pub fn open(dir: &Path) -> Storage {
        if let Err(err) = fs::create_dir_all(dir) {
            warn!("Could not create data directory {}: {}", dir.display(), err);
        }
        let path = dir.join(STORAGE_FILE_NAME);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("Discarding unreadable storage file {}: {}", path.display(), err);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        debug!("Opened storage at {} with {} keys", path.display(), entries.len());
        Storage {
            path: Some(path),
            entries,
        }
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Storage {
        Storage {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
        if let Err(err) = self.flush() {
            warn!("Storage write failed for key {}: {}", key, err);
        }
    }

    pub fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            if let Err(err) = self.flush() {
                warn!("Storage write failed removing key {}: {}", key, err);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a JSON value stored under `key`.
    ///
    /// A missing key and a malformed value are treated alike: the caller
    /// gets `None` and falls back to its default.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.entries.get(key)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("Discarding malformed value under key {}: {}", key, err);
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, raw),
            Err(err) => warn!("Could not serialize value for key {}: {}", key, err),
        }
    }

    /// Writes the current state to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, raw)?;
        Ok(())
    }
}
