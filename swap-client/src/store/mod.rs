//! Durable client-side storage.
//!
//! A small JSON key/value file standing in for the browser's local
//! storage. All persisted client state (session, booking copies, the
//! selected station) goes through [`Store`]; nothing else touches the file.

mod records;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub use records::BookingRecords;

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "swap-client-store.json";

/// Well-known storage keys.
pub mod keys {
    use crate::domain::BookingId;

    pub const SESSION: &str = "session";
    pub const CURRENT_BOOKING: &str = "booking:current";
    pub const SELECTED_STATION: &str = "station:selected";
    pub const ORPHANED_DRAFTS: &str = "orphaned-drafts";

    /// Key for the cached copy of one booking.
    pub fn booking(id: BookingId) -> String {
        format!("booking:{id}")
    }
}

/// Errors from the local store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {message}")]
    Io { message: String },

    #[error("store data error for key {key}: {message}")]
    Json { key: String, message: String },
}

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    entries: BTreeMap<String, serde_json::Value>,
}

/// JSON file-backed key/value store.
///
/// Each operation reads the file, applies the change and writes it back
/// under an async mutex, so read-modify-write sequences inside one
/// process never interleave.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Store {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Read a value. Missing keys yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.read_file()?;
        match file.entries.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| StoreError::Json {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Write a value, replacing any previous one.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Json {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.update(|entries| {
            entries.insert(key.to_string(), value);
        })
        .await
    }

    /// Delete a value. Deleting a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
        .await
    }

    /// Apply several changes in one atomic read-modify-write.
    pub async fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, serde_json::Value>),
    {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file()?;
        f(&mut file.entries);
        self.write_file(&file)
    }

    fn read_file(&self) -> Result<StoreFile, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(e) => {
                return Err(StoreError::Io {
                    message: format!("failed to read {}: {}", self.path.display(), e),
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(StoreFile::default());
        }

        serde_json::from_str(&contents).map_err(|e| StoreError::Json {
            key: "*".to_string(),
            message: format!("corrupt store file {}: {}", self.path.display(), e),
        })
    }

    fn write_file(&self, file: &StoreFile) -> Result<(), StoreError> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                message: format!("failed to create store directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(file).map_err(|e| StoreError::Json {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        // Write beside the target and rename so readers never see a torn file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Io {
            message: format!("failed to write store file: {}", e),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io {
            message: format!("failed to replace store file: {}", e),
        })?;

        Ok(())
    }
}
