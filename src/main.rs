// Main entry point - Dependency injection, export loop and health endpoints
mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::export_service::PanelExporter;
use crate::application::scheduler::ExportScheduler;
use crate::infrastructure::config::{load_dashboards, load_exporter_config};
use crate::infrastructure::grafana_client::GrafanaClient;
use crate::infrastructure::kafka_rest_publisher::KafkaRestPublisher;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{export_status, health_check, is_alive, is_ready};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration; invalid dashboards abort startup
    let config = load_exporter_config().context("failed to load exporter configuration")?;
    let dashboards = load_dashboards(&config.export.dashboards_file)?;
    let time_zone = config.grafana.time_zone()?;
    for dashboard in &dashboards {
        if dashboard.is_empty() {
            tracing::warn!(dashboard = dashboard.id(), "dashboard has no panels");
        } else {
            tracing::info!(dashboard = dashboard.id(), panels = dashboard.len(), "loaded dashboard");
        }
    }

    // Adapters (infrastructure layer)
    let renderer = Arc::new(
        GrafanaClient::new(&config.grafana.base_url, config.grafana.request_timeout())
            .context("failed to build grafana client")?,
    );
    let publisher = Arc::new(
        KafkaRestPublisher::new(&config.kafka).context("failed to build kafka publisher")?,
    );

    // Export loop (application layer)
    let exporter = PanelExporter::new(renderer, publisher, dashboards, time_zone)
        .with_max_concurrent_fetches(config.export.max_concurrent_fetches);
    let scheduler = ExportScheduler::new(Arc::new(exporter), config.export.period());
    let state = Arc::new(AppState {
        scheduler: scheduler.subscribe(),
    });

    let export_task = scheduler.spawn();

    // Presentation layer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/isalive", get(is_alive))
        .route("/isready", get(is_ready))
        .route("/status", get(export_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "starting grafana-image-exporter");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if export_task.shutdown(config.server.shutdown_grace()).await {
        tracing::info!("shutdown complete");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}
