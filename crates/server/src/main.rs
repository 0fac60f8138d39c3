//! Cost dashboard server
//!
//! Serves the rightsizing recommendation views of one data directory over
//! HTTP, alongside health and Prometheus metrics endpoints.

use anyhow::Result;
use dashboard_lib::{
    cache::DatasetCache,
    catalog::DataCatalog,
    observability::{DashboardMetrics, StructuredLogger},
};
use dashboard_server::{api, config};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ServerConfig::load()?;
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        cache_ttl_secs = config.cache_ttl_secs,
        "Server configured"
    );

    let metrics = DashboardMetrics::new();
    let logger = StructuredLogger::new(&config.instance);
    logger.log_startup(SERVER_VERSION, &config.data_dir.display().to_string());

    let cache = Arc::new(DatasetCache::with_observability(
        config.cache_ttl(),
        metrics.clone(),
        logger.clone(),
    ));
    let catalog = DataCatalog::new(&config.data_dir, cache);

    // Warm the cache; unavailable domains are retried on request
    let health = catalog.refresh_all();
    let available = health
        .domains
        .values()
        .filter(|h| h.status.is_available())
        .count();
    if available == 0 {
        warn!(data_dir = %config.data_dir.display(), "No domain data available yet");
    } else {
        info!(available, total = health.domains.len(), "Initial data load complete");
    }

    let app_state = Arc::new(api::AppState::new(catalog, metrics, logger.clone()));

    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    tokio::select! {
        result = api_handle => {
            result??;
            logger.log_shutdown("API server exited");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    Ok(())
}
