//! Prayer Cache - TTL cache with durable key-value persistence
//!
//! Caches prayer-request data for the client with per-entry expiry, lazy
//! eviction and write-through to a durable store, and remembers recently
//! verified email addresses.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use config::Config;
pub use error::{CacheError, StorageError};
pub use session::VerifiedSessions;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, SharedStorage};
pub use tasks::spawn_sweep_task;
