//! Response DTOs for the cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for the GET operation (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
    /// Milliseconds until the entry expires
    pub ttl_remaining_ms: Option<u64>,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value, ttl_remaining_ms: Option<u64>) -> Self {
        Self {
            key: key.into(),
            value,
            ttl_remaining_ms,
        }
    }
}

/// Response body for the SET operation (PUT /cache)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /cache/:key and DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The invalidated key, None when the whole cache was cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl InvalidateResponse {
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated", key),
            key: Some(key),
        }
    }

    pub fn all() -> Self {
        Self {
            message: "All cache entries invalidated".to_string(),
            key: None,
        }
    }
}

/// Response body for POST /cache/sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Number of expired entries removed
    pub removed: usize,
}

/// Response body for POST /sessions
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Normalized email
    pub email: String,
    /// Session expiration (Unix milliseconds)
    pub expires_at: u64,
}

/// Response body for GET /sessions/verified
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedResponse {
    /// Normalized email
    pub email: String,
    /// Whether a live session exists
    pub verified: bool,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub storage_errors: u64,
    /// Current number of entries in the in-memory index
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            storage_errors: stats.storage_errors,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_prayer", json!({"id": 1}), Some(1000));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_prayer"));
        assert!(json.contains("\"ttl_remaining_ms\":1000"));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_invalidate_all_omits_key() {
        let json = serde_json::to_string(&InvalidateResponse::all()).unwrap();
        assert!(!json.contains("\"key\""));

        let json = serde_json::to_string(&InvalidateResponse::key("k")).unwrap();
        assert!(json.contains("\"key\":\"k\""));
    }

    #[test]
    fn test_stats_response_from_stats() {
        let mut stats = CacheStats::new();
        stats.hits = 80;
        stats.misses = 20;
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
