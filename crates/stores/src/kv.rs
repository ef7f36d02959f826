use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum KeyValueStoreError {
    #[error("Invalid key. key: '{0}'")]
    InvalidKey(String),

    #[error("IO error. key: '{key}', cause: {cause}")]
    IoError { key: String, cause: std::io::Error },

    #[error("Write rejected. key: '{0}'")]
    WriteRejected(String),
}

/// A durable key-value store, values are opaque bytes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueStoreError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), KeyValueStoreError>;
}

/// Stores each key as a `<key>.json` file in a directory.
#[derive(Debug)]
pub struct FileKeyValueStore {
    directory: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KeyValueStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(KeyValueStoreError::InvalidKey(key.to_string()));
        }

        Ok(self
            .directory
            .join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(cause) if cause.kind() == ErrorKind::NotFound => {
                debug!("Key not found. key: '{}', path: {}", key, path.display());
                Ok(None)
            }
            Err(cause) => Err(KeyValueStoreError::IoError {
                key: key.to_string(),
                cause,
            }),
        }
    }

    /// Writes to a temporary file first, so that a failed write never leaves a truncated document.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), KeyValueStoreError> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension("json.tmp");

        let to_io_error = |cause| KeyValueStoreError::IoError {
            key: key.to_string(),
            cause,
        };

        fs::create_dir_all(&self.directory).map_err(to_io_error)?;
        fs::write(&temp_path, value).map_err(to_io_error)?;
        fs::rename(&temp_path, &path).map_err(to_io_error)?;

        info!("Stored key. key: '{}', path: {}, bytes: {}", key, path.display(), value.len());
        Ok(())
    }
}

/// An in-memory store, writes can be rejected on demand.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    reject_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes
            .store(reject, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .keys()
            .cloned()
            .collect()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueStoreError> {
        Ok(self
            .entries
            .lock()
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), KeyValueStoreError> {
        if self
            .reject_writes
            .load(Ordering::SeqCst)
        {
            return Err(KeyValueStoreError::WriteRejected(key.to_string()));
        }

        self.entries
            .lock()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
