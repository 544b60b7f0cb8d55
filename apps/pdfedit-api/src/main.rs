//! PDF Edit API Server
//!
//! Provides REST endpoints for:
//! - Embedded font extraction
//! - Text replacement with web font matching
//! - Health checks

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod error;
mod font_selection;
mod handlers;
mod models;
mod state;

use config::Config;
use state::AppState;

const DEFAULT_LOG_FILTER: &str =
    "pdfedit_api=info,webfont_cache=info,pdfedit_core=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();

    info!("Initializing PDF Edit API...");
    let state = Arc::new(AppState::new(&config)?);
    let app = build_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Starting PDF Edit API on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

pub(crate) fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/extract-fonts", post(handlers::extract_fonts))
        .route("/api/edit-pdf", post(handlers::edit_pdf))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
