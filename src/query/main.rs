//! Query server for population estimates.
//!
//! Serves `GET /population?place=<name>&radius=<km>` over a store filled by
//! the `ingest` binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geopop::{Config, PopulationEstimate, PopulationService, PopulationStore, SledStore};

mod population;
use population::{ApiError, PopulationQueryParams};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Population-within-radius query server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    listen: String,

    /// Store directory written by the ingest binary
    #[arg(long, default_value = "geopop.db")]
    db: PathBuf,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    service: PopulationService,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    info!("Geopop Query Server");
    info!(
        "Precision {}, max radius {} km, broad classes {:?}",
        config.index.precision, config.index.max_radius_km, config.index.broad_feature_classes
    );

    let store = SledStore::open(&args.db).context("Failed to open store")?;
    store.ping().context("Store is not reachable")?;
    info!("Opened store with {} keys", store.len());

    let state = Arc::new(AppState {
        service: PopulationService::new(Arc::new(store), config.index),
    });

    let app = build_router(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/population", get(population_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let healthy = state.service.health_check();

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        store: healthy,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: bool,
}

/// Population within a radius of a named place
async fn population_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopulationQueryParams>,
) -> Result<Json<PopulationEstimate>, ApiError> {
    let (place, radius_km) = params.parse()?;

    // cover generation is CPU bound for large radii
    let service = state.service.clone();
    let estimate = tokio::task::spawn_blocking(move || service.estimate(&place, radius_km))
        .await
        .map_err(|e| {
            tracing::error!("Population task failed: {}", e);
            ApiError::Internal(e.to_string())
        })??;

    Ok(Json(estimate))
}
