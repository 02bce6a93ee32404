//! Chain Cache diagnostics server
//!
//! Hosts the master cache set and exposes its statistics over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chain_cache::api::create_router;
use chain_cache::{spawn_stats_task, AppState, CacheDomain, Config, MasterCacheSet};

/// Main entry point for the cache diagnostics server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the master cache set
/// 4. Start the background stats reporter
/// 5. Serve the diagnostics router until SIGINT/SIGTERM
/// 6. Close the master cache set
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chain_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Chain Cache diagnostics server");

    let config = Config::from_env();
    for domain in CacheDomain::ALL {
        info!(
            cache = %domain,
            tier = %config.cache.tier(domain),
            capacity = config.cache.capacity(domain),
            "cache configured"
        );
    }
    info!(
        "Configuration loaded: port={}, stats_interval={}s",
        config.server_port, config.stats_interval
    );

    let master = Arc::new(MasterCacheSet::new(&config.cache));
    let state = AppState::new(master.clone());

    let stats_handle = (config.stats_interval > 0)
        .then(|| spawn_stats_task(master.clone(), config.stats_interval));

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stats_handle))
        .await
        .context("server error")?;

    master.log_stats();
    master.close();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the stats reporter.
async fn shutdown_signal(stats_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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

    if let Some(handle) = stats_handle {
        handle.abort();
        warn!("Stats reporter aborted");
    }
}
