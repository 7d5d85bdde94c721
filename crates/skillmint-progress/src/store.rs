//! Key/value storage for persisted progress blobs.
//!
//! This module provides:
//! - `ProgressStore`: the storage boundary (read, write, remove by key)
//! - `MemoryStore`: in-process store for tests and ephemeral sessions
//! - `FileStore`: one file per key, written atomically (temp file + rename)

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

/// File extension used by [`FileStore`].
const BLOB_EXTENSION: &str = "json";

/// Errors raised by a progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Key cannot be used as a storage name.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable string storage keyed by name.
///
/// A `write` replaces the whole value under its key; readers never observe a
/// partially written value.
pub trait ProgressStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replaces the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Validates a storage key. Any non-empty key is accepted.
fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("Empty key".to_string()));
    }
    Ok(())
}

/// Maps a key to a portable file stem.
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte,
/// including `%` and `.`, becomes `%XX`. Distinct keys map to distinct stems.
fn encode_file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key, with the key
/// escaped by [`encode_file_stem`].
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensures the store directory exists.
    pub fn ensure_dir(&self) -> StoreResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            info!("Created progress directory: {:?}", self.dir);
        }
        Ok(())
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{BLOB_EXTENSION}", encode_file_stem(key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.tmp", encode_file_stem(key)))
    }
}

impl ProgressStore for FileStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        match fs::read_to_string(self.blob_path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.ensure_dir()?;

        let temp_path = self.temp_path(key);
        let final_path = self.blob_path(key);

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }

        // Atomic rename
        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::Io(e)
        })?;

        debug!("Atomic write complete for key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => {
                debug!("Removed key: {}", key);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
