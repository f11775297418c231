//! Verified Session Module
//!
//! Remembers which email addresses completed verification recently. All
//! sessions live as one JSON list under a single durable key and are pruned
//! when read.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::current_timestamp_ms;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::storage::SharedStorage;

/// Durable key holding the session list
pub const SESSIONS_KEY: &str = "verified_sessions";

// == Verified Session ==
/// A time-boxed "this email was verified" fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedSession {
    /// Normalized email address
    pub email: String,
    /// Verification timestamp (Unix milliseconds)
    pub verified_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl VerifiedSession {
    /// Live iff `now < expires_at`.
    pub fn is_live_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }
}

/// Trims and lower-cases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// == Verified Sessions ==
/// Store of recently verified emails over a durable backend.
pub struct VerifiedSessions {
    storage: SharedStorage,
    session_ttl_ms: u64,
}

impl VerifiedSessions {
    pub fn new(storage: SharedStorage, session_ttl_ms: u64) -> Self {
        Self {
            storage,
            session_ttl_ms,
        }
    }

    pub fn from_config(config: &Config, storage: SharedStorage) -> Self {
        Self::new(storage, config.session_ttl_ms)
    }

    /// Loads the stored list; absent or malformed data is an empty list.
    fn load(&self) -> Vec<VerifiedSession> {
        let raw = match self.storage.get_item(SESSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                debug!("Could not read verified sessions: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!("Ignoring malformed verified sessions: {}", e);
            Vec::new()
        })
    }

    /// Live sessions at the current time.
    pub fn live_sessions(&self) -> Vec<VerifiedSession> {
        let now = current_timestamp_ms();
        self.load()
            .into_iter()
            .filter(|session| session.is_live_at(now))
            .collect()
    }

    // == Is Recently Verified ==
    /// True iff a live session exists for the normalized `email`.
    ///
    /// Never writes to storage; expired sessions are only filtered out.
    pub fn is_recently_verified(&self, email: &str) -> bool {
        let email = normalize_email(email);
        if email.is_empty() {
            return false;
        }
        self.live_sessions()
            .iter()
            .any(|session| session.email == email)
    }

    // == Record Verification ==
    /// Records that `email` was verified now, for `ttl_ms` (or the default).
    ///
    /// Expired sessions and any earlier session for the same email are
    /// dropped from the persisted list.
    pub fn record_verification(&self, email: &str, ttl_ms: Option<u64>) -> Result<VerifiedSession> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(CacheError::InvalidRequest("Email cannot be empty".to_string()));
        }

        let ttl_ms = ttl_ms.unwrap_or(self.session_ttl_ms);
        if ttl_ms == 0 {
            return Err(CacheError::InvalidRequest(
                "TTL must be a positive number of milliseconds".to_string(),
            ));
        }

        let now = current_timestamp_ms();
        let session = VerifiedSession {
            email: email.clone(),
            verified_at: now,
            expires_at: now.saturating_add(ttl_ms),
        };

        let mut sessions: Vec<VerifiedSession> = self
            .load()
            .into_iter()
            .filter(|s| s.is_live_at(now) && s.email != email)
            .collect();
        sessions.push(session.clone());

        let raw = serde_json::to_string(&sessions)?;
        self.storage.set_item(SESSIONS_KEY, &raw)?;

        info!("Recorded verified session for {}", email);
        Ok(session)
    }

    /// Forgets every session.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(SESSIONS_KEY)?;
        Ok(())
    }
}
