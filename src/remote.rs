//! Off-device backup targets. Nothing in the ledger depends on one being
//! configured.

use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{StorageError, StorageResult};

/// Object-storage style interface keyed by arbitrary identifiers.
pub trait BlobStore {
    /// Stores `value` under `key` and returns where it landed.
    fn put(&mut self, key: &str, value: &Value) -> StorageResult<String>;
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;
    fn delete(&mut self, key: &str) -> StorageResult<()>;
}

fn check_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key.contains(['/', '\\'])
        || key == "."
        || key == ".."
        || key.chars().any(char::is_control);
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Blob store backed by a local (possibly synced or mounted) directory.
pub struct DirectoryBlobStore {
    root: PathBuf,
}

impl DirectoryBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl BlobStore for DirectoryBlobStore {
    fn put(&mut self, key: &str, value: &Value) -> StorageResult<String> {
        let path = self.object_path(key)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).map_err(|e| StorageError::io(path.display().to_string(), e))?;
        let location = path.display().to_string();
        info!("Uploaded {} to {}", key, location);
        Ok(location)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let path = self.object_path(key)?;
        if !path.exists() {
            info!("No data found for key: {}", key);
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| StorageError::io(path.display().to_string(), e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn delete(&mut self, key: &str) -> StorageResult<()> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Delete of missing key {}", key);
                Ok(())
            }
            Err(e) => Err(StorageError::io(path.display().to_string(), e)),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    objects: HashMap<String, Value>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, key: &str, value: &Value) -> StorageResult<String> {
        check_key(key)?;
        self.objects.insert(key.to_string(), value.clone());
        Ok(format!("memory://{key}"))
    }

    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        check_key(key)?;
        Ok(self.objects.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        self.objects.remove(key);
        Ok(())
    }
}
