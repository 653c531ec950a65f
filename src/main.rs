// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::ChartService;
use crate::application::dataset_repository::DatasetRepository;
use crate::infrastructure::config::{load_charts_config, load_server_config};
use crate::infrastructure::file_repository::FileDatasetRepository;
use crate::infrastructure::http_repository::HttpDatasetRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{chart_tooltip, health_check, list_charts, render_chart};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let server_config = load_server_config()?;
    let charts_config = load_charts_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn DatasetRepository> = match server_config.datasets.base_url {
        Some(base_url) => {
            tracing::info!("Reading datasets from {}", base_url);
            Arc::new(HttpDatasetRepository::new(base_url))
        }
        None => {
            tracing::info!("Reading datasets from directory {}", server_config.datasets.directory);
            Arc::new(FileDatasetRepository::new(server_config.datasets.directory))
        }
    };

    // Datasets are fetched once here; failed charts answer 503 until restart
    let chart_service = ChartService::load(repository, charts_config).await;

    let state = Arc::new(AppState { chart_service });

    // Build router (presentation layer)
    // Compression is negotiated per response in http_response, so no CompressionLayer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/charts", get(list_charts))
        .route("/charts/:id", get(render_chart))
        .route("/charts/:id/tooltip", get(chart_tooltip))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = server_config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", server_config.server.bind))?;
    tracing::info!("Starting thermochart service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
