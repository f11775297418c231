//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    GetResponse, HealthResponse, InvalidateResponse, SessionResponse, SetRequest, SetResponse,
    StatsResponse, SweepResponse, VerifiedResponse, VerifyQuery, VerifyRequest,
};
use crate::session::{normalize_email, VerifiedSessions};
use crate::storage::SharedStorage;

/// Application state shared across all handlers.
///
/// The cache sits behind a lock because reads evict; the session store
/// guards itself through its storage backend.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache
    pub cache: Arc<RwLock<TtlCache>>,
    /// Verified-email sessions
    pub sessions: Arc<VerifiedSessions>,
}

impl AppState {
    /// Creates a new AppState from a cache and session store.
    pub fn new(cache: TtlCache, sessions: VerifiedSessions) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            sessions: Arc::new(sessions),
        }
    }

    /// Creates a new AppState from configuration, sharing one backend.
    pub fn from_config(config: &Config, storage: SharedStorage) -> Self {
        let cache = TtlCache::from_config(config, storage.clone());
        let sessions = VerifiedSessions::from_config(config, storage);
        Self::new(cache, sessions)
    }
}

/// Handler for PUT /cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.set(&req.key, &req.value, req.ttl_ms)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a read may evict
    let mut cache = state.cache.write().await;
    let value: Value = cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let ttl_remaining_ms = cache.ttl_remaining_ms(&key);

    Ok(Json(GetResponse::new(key, value, ttl_remaining_ms)))
}

/// Handler for DELETE /cache/:key
///
/// Always succeeds; invalidating an absent key is a no-op.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<InvalidateResponse> {
    let mut cache = state.cache.write().await;
    cache.invalidate(&key);

    Json(InvalidateResponse::key(key))
}

/// Handler for DELETE /cache
pub async fn invalidate_all_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let mut cache = state.cache.write().await;
    cache.invalidate_all();

    Json(InvalidateResponse::all())
}

/// Handler for POST /cache/sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<SweepResponse> {
    let mut cache = state.cache.write().await;
    let removed = cache.sweep_expired();

    Json(SweepResponse { removed })
}

/// Handler for POST /sessions
pub async fn record_verification_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>> {
    let session = state.sessions.record_verification(&req.email, req.ttl_ms)?;

    Ok(Json(SessionResponse {
        email: session.email,
        expires_at: session.expires_at,
    }))
}

/// Handler for DELETE /sessions
pub async fn clear_sessions_handler(State(state): State<AppState>) -> Result<Json<InvalidateResponse>> {
    state.sessions.clear()?;

    Ok(Json(InvalidateResponse {
        message: "All verified sessions cleared".to_string(),
        key: None,
    }))
}

/// Handler for GET /sessions/verified?email=
pub async fn verified_handler(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Json<VerifiedResponse> {
    let verified = state.sessions.is_recently_verified(&query.email);

    Json(VerifiedResponse {
        email: normalize_email(&query.email),
        verified,
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
