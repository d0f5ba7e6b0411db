// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! NK Dashboard API Server
//!
//! Links NK Logbook accounts and serves their rowing sessions, strokes and
//! devices to the dashboard frontend.

use nk_dashboard::{
    config::{Config, RuntimeMode},
    db,
    server::Server,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment; bad config halts startup
    let config = Config::from_env()?;

    init_logging(config.mode);
    tracing::info!(port = config.port, mode = ?config.mode, "Starting NK Dashboard API");

    let store = db::connect(&config.database_url).await?;
    store.ping().await?;
    tracing::info!("Credential store connected");

    let state = Arc::new(AppState::new(config.clone(), store));
    state
        .rate_limiter
        .clone()
        .spawn_cleanup_task(Duration::from_secs(60));
    spawn_login_sweep(state.clone(), Duration::from_secs(60));

    let app = nk_dashboard::routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = Server::bind(addr, app).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping server");
    server.stop().await?;

    Ok(())
}

/// Initialize logging: JSON in production, human-readable otherwise.
fn init_logging(mode: RuntimeMode) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("nk_dashboard=debug,info"));

    let registry = tracing_subscriber::registry().with(filter);

    if mode.is_production() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}

/// Drop expired login attempts even when nobody starts or completes a login.
fn spawn_login_sweep(state: Arc<AppState>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            state.handshake.sweep_expired();
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
