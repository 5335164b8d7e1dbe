use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

mod analytics;
mod api;
mod classifier;
mod config;
mod db;
mod engine;
mod error;
mod league;
mod service;

use api::AppState;
use config::{Command, Config};
use db::Database;
use league::{LeagueCache, LeagueSource, StoreSource};
use service::PredictionService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open match store
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    if let Some(Command::Import { league, file }) = &config.command {
        db::import::import_file(&db, league, file)?;
        return Ok(());
    }

    let source: Arc<dyn LeagueSource> = Arc::new(StoreSource::new(db, &config.models_dir));
    match source.list_leagues().await {
        Ok(leagues) => info!("Match store holds {} league(s): {:?}", leagues.len(), leagues),
        Err(e) => warn!("Could not list stored leagues: {}", e),
    }

    let cache = LeagueCache::new(source, config.cache_capacity);
    let warm = config.warm();
    if !warm.is_empty() {
        cache.warm(&warm).await;
    }

    let state = AppState {
        service: PredictionService::new(cache, config.current_season.clone()),
        allowed_leagues: config.leagues(),
    };
    let cors = api::cors_layer(&config.cors_origin)?;
    let app = api::router(state, cors);

    let addr = config.socket_addr()?;
    info!(
        "Prediction API listening on http://{} (current season {})",
        addr, config.current_season
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
