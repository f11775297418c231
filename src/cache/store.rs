//! Cache Store Module
//!
//! Main cache engine: an in-memory index in front of a durable key-value
//! store, with absolute-deadline TTLs and lazy eviction on read.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH};
use crate::config::{checked_namespace, Config};
use crate::error::{CacheError, Result};
use crate::storage::{MemoryStorage, SharedStorage};

// == TTL Cache ==
/// Key-value cache with per-entry expiry and durable persistence.
///
/// The in-memory index is authoritative for the lifetime of the process.
/// The durable store carries entries across restarts; failures writing to
/// it are logged and absorbed, leaving the entry memory-only.
pub struct TtlCache {
    /// In-memory index of live (or not yet reclaimed) entries
    index: HashMap<String, CacheEntry>,
    /// Durable substrate
    storage: SharedStorage,
    /// Prefix applied to every durable key this cache owns
    namespace: String,
    /// Default TTL in milliseconds for entries without explicit TTL
    default_ttl_ms: u64,
    /// Performance statistics
    stats: CacheStats,
}

impl TtlCache {
    // == Constructor ==
    /// Creates a cache over `storage`, scoped to `namespace`.
    ///
    /// # Arguments
    /// * `storage` - Durable key-value backend, possibly shared
    /// * `namespace` - Key prefix isolating this cache inside the backend;
    ///   one overlapping the session list key falls back to the default
    /// * `default_ttl_ms` - TTL used when `set` is called without one
    pub fn new(storage: SharedStorage, namespace: impl AsRef<str>, default_ttl_ms: u64) -> Self {
        Self {
            index: HashMap::new(),
            storage,
            namespace: checked_namespace(namespace.as_ref()),
            default_ttl_ms,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache from configuration over the given backend.
    pub fn from_config(config: &Config, storage: SharedStorage) -> Self {
        Self::new(storage, config.namespace.clone(), config.default_ttl_ms)
    }

    /// Creates a cache over a fresh, unlimited memory backend.
    pub fn in_memory(default_ttl_ms: u64) -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            crate::config::DEFAULT_NAMESPACE,
            default_ttl_ms,
        )
    }

    /// Durable key for a cache key.
    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        Ok(())
    }

    // == Set ==
    /// Stores a value under `key`, replacing any previous entry.
    ///
    /// The entry expires `ttl_ms` milliseconds from now (`default_ttl_ms`
    /// if None). Only contract violations are returned as errors: an empty
    /// or oversized key, a zero TTL, or a value that cannot become JSON.
    pub fn set<V>(&mut self, key: &str, value: &V, ttl_ms: Option<u64>) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        Self::validate_key(key)?;

        let ttl_ms = ttl_ms.unwrap_or(self.default_ttl_ms);
        if ttl_ms == 0 {
            return Err(CacheError::InvalidRequest(
                "TTL must be a positive number of milliseconds".to_string(),
            ));
        }

        let json = serde_json::to_value(value)?;
        let entry = CacheEntry::new(json, ttl_ms);

        self.write_durable(key, &entry);
        self.index.insert(key.to_string(), entry);
        self.stats.set_total_entries(self.index.len());

        Ok(())
    }

    /// Best-effort durable write; failures leave the entry memory-only.
    fn write_durable(&mut self, key: &str, entry: &CacheEntry) {
        let storage_key = self.storage_key(key);

        let raw = match entry.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping durable write for '{}': {}", key, e);
                self.stats.record_storage_error();
                return;
            }
        };

        if let Err(e) = self.storage.set_item(&storage_key, &raw) {
            warn!("Durable write failed for '{}', keeping entry in memory only: {}", key, e);
            self.stats.record_storage_error();
            // A stale durable copy must not resurface after a restart
            if let Err(e) = self.storage.remove_item(&storage_key) {
                debug!("Could not drop stale durable copy of '{}': {}", key, e);
            }
        }
    }

    // == Get ==
    /// Returns the value for `key` if a live entry exists.
    ///
    /// Expired entries found on the way are evicted from both the index and
    /// the durable store. Malformed stored data and values that do not
    /// decode into `V` are misses.
    pub fn get<V: DeserializeOwned>(&mut self, key: &str) -> Option<V> {
        let Some(entry) = self.lookup(key) else {
            self.stats.record_miss();
            return None;
        };

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Err(e) => {
                debug!("Cached value for '{}' does not match requested type: {}", key, e);
                self.stats.record_miss();
                None
            }
        }
    }

    /// Finds a live entry, hydrating the index from durable storage.
    fn lookup(&mut self, key: &str) -> Option<CacheEntry> {
        let now = current_timestamp_ms();

        if let Some(entry) = self.index.get(key) {
            if !entry.is_expired_at(now) {
                return Some(entry.clone());
            }
            self.evict(key);
            return None;
        }

        let raw = match self.storage.get_item(&self.storage_key(key)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Durable read failed for '{}': {}", key, e);
                self.stats.record_storage_error();
                return None;
            }
        };

        let entry = match CacheEntry::from_json(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Malformed durable entry for '{}': {}", key, e);
                return None;
            }
        };

        if entry.is_expired_at(now) {
            self.evict(key);
            return None;
        }

        self.index.insert(key.to_string(), entry.clone());
        self.stats.set_total_entries(self.index.len());
        Some(entry)
    }

    /// Drops an expired entry from both layers.
    fn evict(&mut self, key: &str) {
        debug!("Evicting expired entry '{}'", key);
        self.index.remove(key);
        if let Err(e) = self.storage.remove_item(&self.storage_key(key)) {
            warn!("Durable eviction failed for '{}': {}", key, e);
            self.stats.record_storage_error();
        }
        self.stats.record_expirations(1);
        self.stats.set_total_entries(self.index.len());
    }

    // == Get Or Insert ==
    /// Returns the cached value, or computes, stores and returns a new one.
    pub fn get_or_insert_with<V, F>(&mut self, key: &str, ttl_ms: Option<u64>, f: F) -> Result<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = f();
        self.set(key, &value, ttl_ms)?;
        Ok(value)
    }

    // == Invalidate ==
    /// Removes `key` from memory and durable storage. Absent keys are a no-op.
    pub fn invalidate(&mut self, key: &str) {
        self.index.remove(key);
        if let Err(e) = self.storage.remove_item(&self.storage_key(key)) {
            warn!("Durable invalidate failed for '{}': {}", key, e);
            self.stats.record_storage_error();
        }
        self.stats.set_total_entries(self.index.len());
    }

    // == Invalidate All ==
    /// Removes every entry this cache owns.
    ///
    /// Durable keys outside this cache's namespace are left alone.
    pub fn invalidate_all(&mut self) {
        self.index.clear();
        self.stats.set_total_entries(0);

        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Could not list durable keys for invalidation: {}", e);
                self.stats.record_storage_error();
                return;
            }
        };

        for storage_key in keys.iter().filter(|k| k.starts_with(&self.namespace)) {
            if let Err(e) = self.storage.remove_item(storage_key) {
                warn!("Durable invalidate failed for '{}': {}", storage_key, e);
                self.stats.record_storage_error();
            }
        }
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the index and durable storage.
    ///
    /// Returns the number of distinct keys removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let mut removed: HashSet<String> = self
            .index
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &removed {
            self.index.remove(key);
        }

        match self.storage.keys() {
            Ok(keys) => {
                for storage_key in keys {
                    let Some(key) = storage_key.strip_prefix(&self.namespace) else {
                        continue;
                    };
                    let expired = matches!(
                        self.storage.get_item(&storage_key),
                        Ok(Some(raw)) if CacheEntry::from_json(&raw)
                            .map(|entry| entry.is_expired_at(now))
                            .unwrap_or(false)
                    );
                    if expired || removed.contains(key) {
                        if let Err(e) = self.storage.remove_item(&storage_key) {
                            warn!("Durable sweep failed for '{}': {}", storage_key, e);
                            self.stats.record_storage_error();
                            continue;
                        }
                        removed.insert(key.to_string());
                    }
                }
            }
            Err(e) => {
                warn!("Could not list durable keys for sweep: {}", e);
                self.stats.record_storage_error();
            }
        }

        self.stats.record_expirations(removed.len());
        self.stats.set_total_entries(self.index.len());
        removed.len()
    }

    // == Inspection ==
    /// Remaining TTL of a live indexed entry, in milliseconds.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        self.index
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining_ms)
    }

    /// True if a live entry for `key` is in the in-memory index.
    pub fn contains(&self, key: &str) -> bool {
        self.ttl_remaining_ms(key).is_some()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    /// Key prefix this cache uses in durable storage.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of entries in the in-memory index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("namespace", &self.namespace)
            .field("default_ttl_ms", &self.default_ttl_ms)
            .field("entries", &self.index.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
