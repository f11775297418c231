//! In-memory storage backend with optional byte quota.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{entry_size, KeyValueStorage, StorageResult};
use crate::error::StorageError;

// == Memory Storage ==
/// Non-persistent backend, mostly useful for tests and memory-only runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Creates an unlimited memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a memory backend that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes currently used by stored keys and values.
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write();

        if let Some(quota) = self.quota_bytes {
            // Replacing a key frees its old bytes first
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

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.items.read().keys().cloned().collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();

        storage.set_item("a", "1").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), Some("1".to_string()));

        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
    }

    #[test]
    fn test_remove_absent_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove_item("missing").is_ok());
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(10);

        storage.set_item("k", "12345").unwrap();
        let result = storage.set_item("other", "123456789");

        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_quota_counts_replacement_once() {
        let storage = MemoryStorage::with_quota(6);

        storage.set_item("k", "12345").unwrap();
        // Same key, same size: old bytes are released
        storage.set_item("k", "abcde").unwrap();

        assert_eq!(storage.used_bytes(), 6);
    }

    #[test]
    fn test_keys_lists_everything() {
        let storage = MemoryStorage::new();
        storage.set_item("x", "1").unwrap();
        storage.set_item("y", "2").unwrap();

        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
    }
}
