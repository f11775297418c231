//! File-backed storage backend.
//!
//! Keeps every item in one JSON object file (`{"key": "value", ...}`) so the
//! store survives process restarts. Each mutation writes the whole map to a
//! sibling `.tmp` file, syncs it and renames it over the store, so a reader
//! sees either the old or the new contents, never a torn file.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{entry_size, KeyValueStorage, StorageResult};
use crate::error::StorageError;

// == File Storage ==
/// Durable backend persisting to a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    /// Path to the storage file
    path: PathBuf,
    /// Mirror of the file contents
    items: RwLock<HashMap<String, String>>,
    /// Optional byte quota
    quota_bytes: Option<usize>,
}

impl FileStorage {
    /// Opens the store at `path`, loading existing contents.
    ///
    /// A missing file is an empty store. A corrupt file is moved aside to
    /// `<name>.corrupt` and the store starts empty.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let items = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(items) => {
                    info!("Loaded {} stored items from {:?}", items.len(), path);
                    items
                }
                Err(e) => {
                    let backup = path.with_extension("corrupt");
                    warn!("Corrupt storage file {:?} moved to {:?}: {}", path, backup, e);
                    fs::rename(&path, &backup)?;
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No storage file at {:?}, starting empty", path);
                HashMap::new()
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
            quota_bytes: None,
        })
    }

    /// Opens the store with a byte quota on its contents.
    pub fn open_with_quota(path: impl AsRef<Path>, quota_bytes: usize) -> StorageResult<Self> {
        let mut storage = Self::open(path)?;
        storage.quota_bytes = Some(quota_bytes);
        Ok(storage)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &HashMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_vec(items)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write();

        if let Some(quota) = self.quota_bytes {
            let current: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| entry_size(k, v))
                .sum();
            let needed = current + entry_size(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            // Keep the mirror in step with what is on disk
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.write();
        if let Some(old) = items.remove(key) {
            if let Err(e) = self.persist(&items) {
                items.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.read().keys().cloned().collect())
    }
}
