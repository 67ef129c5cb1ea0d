//! Serve command - runs the HTTP server

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{AppState, create_router, with_cors, with_metrics};
use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::observability::init_metrics;

/// Run the HTTP server until SIGINT or SIGTERM
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    };
    init_logging(&config.logging);

    let state = crate::create_app_state(&config).await?;
    let sweeper = spawn_session_sweeper(&state, config.auth.purge_interval_secs);

    let metrics = init_metrics(&config.metrics);
    let app = build_app(state, &config, metrics);

    let addr = build_socket_addr(&config)?;
    info!("Starting auth gateway on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!("Server shutdown complete");

    Ok(())
}

fn build_app(
    state: AppState,
    config: &AppConfig,
    metrics: Option<crate::infrastructure::observability::PrometheusMetrics>,
) -> Router {
    let router = with_cors(create_router(state), &config.server.cors_origins);
    with_metrics(router, metrics, &config.metrics.path)
}

/// Periodically delete expired refresh tokens. An interval of 0 disables it.
fn spawn_session_sweeper(state: &AppState, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Refresh token sweeper disabled");
        return None;
    }

    let tokens = state.sessions.tokens().clone();

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            match tokens.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired refresh tokens"),
                Err(e) => warn!(error = %e, "Refresh token purge failed"),
            }
        }
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;

    #[test]
    fn test_build_socket_addr() {
        let addr = build_socket_addr(&AppConfig::default()).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_host() {
        let mut config = AppConfig::default();
        config.server.host = "not-an-ip".to_string();

        assert!(build_socket_addr(&config).is_err());
    }

    #[tokio::test]
    async fn test_sweeper_disabled_at_zero() {
        assert!(spawn_session_sweeper(&test_state(), 0).is_none());
    }

    #[tokio::test]
    async fn test_sweeper_runs_until_aborted() {
        let handle = spawn_session_sweeper(&test_state(), 3600).unwrap();
        handle.abort();

        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
