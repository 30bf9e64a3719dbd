//! Offline Agent host
//!
//! Serves a single-page app through the agent: pages talk to this server,
//! the agent answers from its cache generations or fetches upstream.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_agent::api::{create_router, AppState};
use offline_agent::cache::MemoryCacheStorage;
use offline_agent::config::{AgentConfig, HostConfig, SHUTDOWN_GRACE};
use offline_agent::fetch::{FetchConfig, HttpFetcher};
use offline_agent::tasks::RevalidationQueue;
use offline_agent::Agent;

/// Main entry point for the Offline Agent host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load host configuration from environment variables
/// 3. Build storage, fetcher and agent
/// 4. Run install, then activate (the agent skips waiting)
/// 5. Serve until SIGINT/SIGTERM, then wait out or abort background refreshes
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_agent=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Agent host");

    let host = HostConfig::from_env();
    info!(
        "Host configuration loaded: port={}, upstream={}, public={}",
        host.server_port, host.upstream_origin, host.public_origin
    );

    let config = AgentConfig::new(host.public_origin.clone());
    info!(
        "Agent {} with {} core assets",
        config.version_tag,
        config.core_assets.len()
    );

    let storage = Arc::new(MemoryCacheStorage::new());
    let fetcher = Arc::new(
        HttpFetcher::new(FetchConfig::default())?
            .with_origin_rewrite(host.public_origin.clone(), host.upstream_origin.clone()),
    );
    let agent = Arc::new(Agent::new(config, storage.clone(), fetcher.clone())?);

    let installed = agent.on_install().await.context("install failed")?;
    if !installed.failed.is_empty() {
        warn!("Core assets not cached: {:?}", installed.failed);
    }
    let activated = agent.on_activate().await.context("activation failed")?;
    info!(
        "Agent active, retained generations: {:?}",
        activated.retained
    );

    let revalidations = agent.revalidations().clone();
    let app = create_router(AppState::new(agent, storage, fetcher));

    let addr = SocketAddr::from(([0, 0, 0, 0], host.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(revalidations))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, gives in-flight revalidations `SHUTDOWN_GRACE` to finish
/// writing and aborts the rest.
async fn shutdown_signal(revalidations: RevalidationQueue) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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

    let pending = revalidations.pending();
    if pending > 0 {
        info!("Waiting for {} revalidations", pending);
    }
    revalidations.shutdown(SHUTDOWN_GRACE).await;
}
