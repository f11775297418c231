//! Request DTOs for the cache API
//!
//! Defines the structure of incoming HTTP request bodies and queries.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for the SET operation (PUT /cache)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl_ms`: Optional TTL in milliseconds (uses default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl_ms == Some(0) {
            return Some("TTL must be a positive number of milliseconds".to_string());
        }
        None
    }
}

/// Request body for recording a verification (POST /sessions)
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// Email address that completed verification
    pub email: String,
    /// Optional session TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

/// Query string for GET /sessions/verified
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test_prayer", "value": {"id": 1, "name": "Test Prayer"}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test_prayer");
        assert_eq!(req.value, json!({"id": 1, "name": "Test Prayer"}));
        assert!(req.ttl_ms.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl_ms": 60000}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl_ms, Some(60_000));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("test"),
            ttl_ms: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let req = SetRequest {
            key: "k".to_string(),
            value: json!("test"),
            ttl_ms: Some(0),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: json!([1, 2, 3]),
            ttl_ms: Some(60),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_verify_request_deserialize() {
        let req: VerifyRequest = serde_json::from_str(r#"{"email": "a@example.com"}"#).unwrap();
        assert_eq!(req.email, "a@example.com");
        assert!(req.ttl_ms.is_none());
    }
}
