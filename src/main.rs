use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use tokio::signal;
use tracing::{error, info, warn};

use customer_api::api::create_router_with_timeout;
use customer_api::app::AppState;
use customer_api::config::AppConfig;
use customer_api::infra::{PostgresClient, init_metrics_handle, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    let metrics = if config.metrics_enabled {
        let handle = init_metrics_handle();
        if handle.is_none() {
            warn!("Prometheus recorder could not be installed, /metrics disabled");
        }
        handle
    } else {
        None
    };

    let db = Arc::new(
        PostgresClient::new(config.database_url.expose_secret(), config.database.clone())
            .await
            .context("failed to connect to PostgreSQL")?,
    );

    if config.run_migrations {
        db.run_migrations()
            .await
            .context("failed to run database migrations")?;
    }

    let state = AppState::with_probe_timeout(db.clone(), db, config.health_probe_timeout)
        .with_metrics(metrics);

    let router = create_router_with_timeout(Arc::new(state), config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received terminate signal, shutting down..."),
    }
}
