//! Key-value persistence backends for the collection.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Durable key-value storage holding serialized collections.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`, `None` when nothing was stored.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a backend rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", sanitize_component(key)))
    }
}

impl StorageBackend for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|err| {
            CatalogError::Storage(format!("failed to read {}: {err}", path.display()))
        })?;
        Ok(Some(content))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|err| {
            CatalogError::Storage(format!("failed to create {}: {err}", self.root.display()))
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|err| {
            CatalogError::Storage(format!("failed to write {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = value.len(), "Collection persisted");
        Ok(())
    }
}

/// Volatile backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `value` under `key`.
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.entries.lock().insert(key.to_string(), value.into());
        storage
    }

    /// Make subsequent writes fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Raw stored value for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        if *self.fail_writes.lock() {
            return Err(CatalogError::Storage(format!("write to {key} rejected")));
        }
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "collection".to_string()
    } else {
        result
    }
}
