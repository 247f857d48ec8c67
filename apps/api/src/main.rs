mod config;
mod embedder;
mod errors;
mod pipeline;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedder::build_embedder;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::LocalDocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (malformed values abort startup)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // The remote backend owns a blocking HTTP client, which must not be
    // created on a runtime worker thread.
    let embedding = config.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || build_embedder(&embedding)).await??;
    info!(
        "Embedder initialized (backend: {}, {} dims)",
        embedder.name(),
        embedder.dims()
    );

    let pipeline = Pipeline::new(PipelineConfig::default(), embedder);
    let store = LocalDocumentStore::new(&config.upload_dir).await?;

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        store: Arc::new(store),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once a frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
