//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::session::SESSIONS_KEY;

/// Default namespace prefixed to every durable cache key
pub const DEFAULT_NAMESPACE: &str = "prayer_cache:";

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// TTL in milliseconds for verified-email sessions
    pub session_ttl_ms: u64,
    /// Key prefix scoping this cache inside the durable store
    pub namespace: String,
    /// JSON file backing the durable store, None = memory only
    pub storage_path: Option<PathBuf>,
    /// Byte quota for the durable store, None = unlimited
    pub storage_quota_bytes: Option<usize>,
    /// Periodic sweep interval in seconds, 0 = lazy eviction only
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default entry TTL (default: 300000)
    /// - `SESSION_TTL_MS` - Verified-session TTL (default: 600000)
    /// - `CACHE_NAMESPACE` - Durable key prefix (default: "prayer_cache:")
    /// - `STORAGE_PATH` - JSON file for persistence (default: unset, memory only)
    /// - `STORAGE_QUOTA_BYTES` - Durable store quota (default: unset)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 0, disabled)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS")
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.default_ttl_ms),
            session_ttl_ms: parse_var("SESSION_TTL_MS")
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.session_ttl_ms),
            namespace: env::var("CACHE_NAMESPACE")
                .map(|ns| checked_namespace(&ns))
                .unwrap_or(defaults.namespace),
            storage_path: env::var("STORAGE_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            storage_quota_bytes: parse_var("STORAGE_QUOTA_BYTES"),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

/// Returns `namespace`, or the default if it would cover keys the cache
/// does not own.
///
/// A namespace that is empty or a prefix of the session list key would let
/// `invalidate_all` and `sweep_expired` reach the verified sessions.
pub fn checked_namespace(namespace: &str) -> String {
    if namespace.is_empty() || SESSIONS_KEY.starts_with(namespace) {
        warn!(
            "Cache namespace {:?} overlaps reserved key {:?}, using {:?}",
            namespace, SESSIONS_KEY, DEFAULT_NAMESPACE
        );
        return DEFAULT_NAMESPACE.to_string();
    }
    namespace.to_string()
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5 * 60 * 1000,
            session_ttl_ms: 10 * 60 * 1000,
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage_path: None,
            storage_quota_bytes: None,
            sweep_interval: 0,
            server_port: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.session_ttl_ms, 600_000);
        assert_eq!(config.namespace, "prayer_cache:");
        assert!(config.storage_path.is_none());
        assert!(config.storage_quota_bytes.is_none());
        assert_eq!(config.sweep_interval, 0);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_checked_namespace() {
        assert_eq!(checked_namespace("app_cache:"), "app_cache:");
        assert_eq!(checked_namespace(""), DEFAULT_NAMESPACE);
        assert_eq!(checked_namespace("verified_"), DEFAULT_NAMESPACE);
        assert_eq!(checked_namespace("verified_sessions"), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("SESSION_TTL_MS");
        env::remove_var("CACHE_NAMESPACE");
        env::remove_var("STORAGE_PATH");
        env::remove_var("STORAGE_QUOTA_BYTES");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("SERVER_PORT");

        let config = Config::from_env();
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert!(config.storage_path.is_none());
        assert_eq!(config.sweep_interval, 0);
        assert_eq!(config.server_port, 3000);
    }
}
