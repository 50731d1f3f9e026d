//! Prefix Cache - HTTP service over the prefix-indexed cache
//!
//! Serves put/get/delete/all over JSON, backed by Redis when `REDIS_URL` is
//! set and by the in-memory store otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prefix_cache::api::create_router;
use prefix_cache::store::{Backend, MemoryBackend, RedisBackend};
use prefix_cache::{spawn_expiry_task, AppState, ServerConfig};

/// Main entry point for the prefix cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis, or create the in-memory store and its expiry task
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prefix_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting prefix cache server");

    let config = ServerConfig::from_env();
    info!(
        "Configuration loaded: namespace={}, ttl={}ms, writes={:?}, port={}",
        config.namespace, config.ttl_ms, config.writes, config.server_port
    );

    let (backend, expiry_handle): (Arc<dyn Backend>, Option<JoinHandle<()>>) =
        match &config.redis_url {
            Some(url) => {
                let backend = RedisBackend::new(url)
                    .await
                    .with_context(|| format!("failed to connect to Redis at {}", url))?;
                info!("Connected to Redis");
                (Arc::new(backend), None)
            }
            None => {
                let backend = MemoryBackend::new();
                let handle = spawn_expiry_task(backend.store(), config.expiry_interval);
                info!("Using in-memory store");
                (Arc::new(backend), Some(handle))
            }
        };

    let state = AppState::from_config(&config, backend);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(expiry_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the expiry task.
async fn shutdown_signal(expiry_handle: Option<JoinHandle<()>>) {
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

    if let Some(handle) = expiry_handle {
        handle.abort();
        warn!("Expiry task aborted");
    }
}
