//! Prayer Cache - TTL cache with durable key-value persistence
//!
//! Serves the cache and verified-session store over HTTP for a local client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prayer_cache::api::create_router;
use prayer_cache::{spawn_sweep_task, AppState, Config, FileStorage, MemoryStorage, SharedStorage};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the durable store (file or memory)
/// 4. Create cache and session store over it
/// 5. Start the expiry sweep task when configured
/// 6. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prayer_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prayer Cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}ms, session_ttl={}ms, namespace={}, port={}, sweep_interval={}s",
        config.default_ttl_ms,
        config.session_ttl_ms,
        config.namespace,
        config.server_port,
        config.sweep_interval
    );

    let storage = open_storage(&config)?;
    let state = AppState::from_config(&config, storage);
    info!("Cache initialized");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sweep_handle = if config.sweep_interval > 0 {
        Some(spawn_sweep_task(
            state.cache.clone(),
            Duration::from_secs(config.sweep_interval),
            shutdown_tx.subscribe(),
        ))
    } else {
        info!("Expiry sweep disabled, relying on lazy eviction");
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    drop(shutdown_tx);
    if let Some(handle) = sweep_handle {
        if let Err(e) = handle.await {
            warn!("Sweep task ended abnormally: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Opens the configured durable store.
fn open_storage(config: &Config) -> anyhow::Result<SharedStorage> {
    let storage: SharedStorage = match (&config.storage_path, config.storage_quota_bytes) {
        (Some(path), Some(quota)) => Arc::new(
            FileStorage::open_with_quota(path, quota)
                .with_context(|| format!("failed to open storage at {:?}", path))?,
        ),
        (Some(path), None) => Arc::new(
            FileStorage::open(path)
                .with_context(|| format!("failed to open storage at {:?}", path))?,
        ),
        (None, Some(quota)) => Arc::new(MemoryStorage::with_quota(quota)),
        (None, None) => Arc::new(MemoryStorage::new()),
    };

    match &config.storage_path {
        Some(path) => info!("Using file storage at {:?}", path),
        None => warn!("STORAGE_PATH not set, cache will not survive restarts"),
    }

    Ok(storage)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
