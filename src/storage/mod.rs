//! Storage Module
//!
//! Durable key-value substrate behind the cache. Values are JSON strings;
//! the cache and the session store share one backend through `SharedStorage`.

mod file;
mod memory;

use std::sync::Arc;

use crate::error::StorageError;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Result type for storage backends.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Key-Value Storage Port ==
/// String-keyed, string-valued store with finite capacity.
///
/// Writes may fail (quota, I/O). Implementations guard their own state so
/// a single backend can be shared across components.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the raw value stored for `key`, if any.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Lists every key currently stored.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Backend handle shared between the cache and the session store.
pub type SharedStorage = Arc<dyn KeyValueStorage>;

/// Bytes a key-value pair counts against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
