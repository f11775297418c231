//! Cache Module
//!
//! Key-value caching with absolute-deadline TTLs, lazy eviction on read and
//! write-through persistence to a durable key-value store.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
