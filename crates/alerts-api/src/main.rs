//! Alerts API server.
//!
//! Serves per-zone weather alerts from a cache that is refreshed in the
//! background and persisted to disk between restarts.

mod config;
mod error;
mod refresher;
mod routes;
mod state;

use std::sync::Arc;

use alert_cache::{AlertCache, AreaFetcher, FileStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        areas = config.areas.len(),
        cache_path = %config.cache_path.display(),
        parser = cap_parser::version(),
        "Starting alerts API"
    );
    if config.api_key.is_none() {
        warn!("AEMET_API_KEY is not set, refreshes will be rejected");
    }

    // Build the cache and restore the last persisted snapshot
    let fetcher = AreaFetcher::from_config(config.fetch_config())?;
    let cache = Arc::new(AlertCache::new(
        Arc::new(fetcher),
        Arc::new(FileStore::new(&config.cache_path)),
        config.cache_config(),
    ));
    cache.load_from_store().await;

    match config.refresh_interval {
        Some(period) => {
            refresher::spawn(cache.clone(), period);
        }
        None => info!("Background refresh disabled"),
    }

    // Build router
    let app = routes::router().with_state(AppState::new(cache));

    // Start server
    info!(addr = %config.addr, "Alerts API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
