//! Credential Service
//!
//! Issues short-lived access tokens and single-use refresh tokens:
//! 1. Authenticates users against the configured `[[users]]` table
//! 2. Serves login / refresh / logout / me on the public listener
//! 3. Serves revocation and store inspection on the admin listener
//! 4. Purges expired refresh records in the background

mod admin;
mod auth;
mod config;
mod error;
mod metrics;
mod routes;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use credential_manager::CredentialManager;
use refresh_store::{MemoryRefreshStore, RefreshStore, spawn_sweep_task};
use token_auth::Signer;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::admin::{AdminState, build_admin_router};
use crate::auth::StaticAuthenticator;
use crate::config::Config;
use crate::routes::{AppState, build_router};

/// Time allowed for in-flight requests after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, LOG_LEVEL then RUST_LOG then info
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting credential-service");
    let started_at = Instant::now();

    // Install before any metric is emitted
    let prometheus_handle = metrics::install_recorder()?;

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        admin_addr = %config.server.admin_addr,
        refresh_ttl_days = config.jwt.refresh_token_ttl_days,
        users = config.users.len(),
        "configuration loaded"
    );

    let secret = config
        .jwt
        .secret
        .as_ref()
        .context("signing secret was not resolved")?;
    let signer = Signer::new(
        secret,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
        config.jwt.access_ttl(),
    );

    let store: Arc<dyn RefreshStore> = Arc::new(MemoryRefreshStore::new());
    let manager = Arc::new(CredentialManager::new(
        signer,
        store.clone(),
        config.jwt.refresh_ttl(),
    ));

    let signer = manager.signer();
    info!(
        issuer = signer.issuer(),
        audience = signer.audience(),
        access_ttl_secs = signer.ttl().as_secs(),
        "access token signer ready"
    );

    let authenticator = StaticAuthenticator::new(&config.users);
    if authenticator.user_count() == 0 {
        warn!("no users configured, every login will be rejected");
    }

    let sweep_handle = spawn_sweep_task(store, config.store.sweep_interval());

    let app = build_router(
        AppState {
            manager: manager.clone(),
            authenticator: Arc::new(authenticator),
            prometheus: prometheus_handle,
            started_at,
        },
        config.server.max_connections,
    );
    let admin_app = build_admin_router(AdminState::new(manager));

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;
    let admin_listener = TcpListener::bind(config.server.admin_addr)
        .await
        .with_context(|| format!("failed to bind admin to {}", config.server.admin_addr))?;

    info!(
        addr = %config.server.listen_addr,
        admin_addr = %config.server.admin_addr,
        "accepting requests"
    );

    // Both listeners drain on the same signal. The drain timeout starts when
    // the signal fires, not when the servers start.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let mut public_rx = shutdown_rx.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = public_rx.wait_for(|stop| *stop).await;
            })
            .await
    });

    let mut admin_rx = shutdown_rx;
    let admin_handle = tokio::spawn(async move {
        axum::serve(admin_listener, admin_app)
            .with_graceful_shutdown(async move {
                let _ = admin_rx.wait_for(|stop| *stop).await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    sweep_handle.abort();

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        let (public, admin) = tokio::join!(server_handle, admin_handle);
        for (name, result) in [("public", public), ("admin", admin)] {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(listener = name, error = %e, "server error during shutdown"),
                Err(e) => error!(listener = name, error = %e, "server task panicked"),
            }
        }
    })
    .await;

    match drained {
        Ok(()) => info!("all in-flight requests drained"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
