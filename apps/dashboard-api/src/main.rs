//! # DealerNet Dashboard API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dashboard API Server                             │
//! │                                                                         │
//! │  Dashboard ───► HTTP (8080) ───► Services ───► SQLite documents         │
//! │                                                      │                  │
//! │                                          change feed ▼                  │
//! │                              MetricsRecomputer / ForecastScheduler      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dealernet_api::recompute::MetricsRecomputer;
use dealernet_api::routes::build_router;
use dealernet_api::scheduler::ForecastScheduler;
use dealernet_api::{ApiConfig, AppState};
use dealernet_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting DealerNet dashboard API...");

    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        forecast_enabled = config.forecast_enabled,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.database_max_connections),
    )
    .await?;
    info!("Database ready");

    let recomputer = MetricsRecomputer::new(db.clone(), config.recompute_coalesce()).start();
    let scheduler = config
        .forecast_enabled
        .then(|| ForecastScheduler::new(db.clone()).start());

    let state = Arc::new(AppState::new(db.clone(), config.clone()));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = recomputer.shutdown().await {
        warn!(error = %e, "Recomputer already stopped");
    }
    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Forecast scheduler already stopped");
        }
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
