//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_sessions_handler, get_handler, health_handler, invalidate_all_handler, invalidate_handler,
    record_verification_handler, set_handler, stats_handler, sweep_handler, verified_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin, the client runs in a browser
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(set_handler).delete(invalidate_all_handler))
        .route("/cache/sweep", post(sweep_handler))
        .route("/cache/:key", get(get_handler).delete(invalidate_handler))
        .route(
            "/sessions",
            post(record_verification_handler).delete(clear_sessions_handler),
        )
        .route("/sessions/verified", get(verified_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
