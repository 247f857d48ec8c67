pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume pipeline
        .route("/api/v1/resumes/ingest", post(handlers::handle_ingest))
        .route("/api/v1/resumes/sections", post(handlers::handle_segment))
        .route("/api/v1/resumes/skills", post(handlers::handle_skills))
        .route("/api/v1/resumes/complete", post(handlers::handle_complete))
        .route("/api/v1/resumes/score", post(handlers::handle_score))
        // Stored uploads
        .route("/api/v1/uploads/:id", get(handlers::handle_download))
        .route(
            "/api/v1/uploads/:id/sections",
            get(handlers::handle_upload_sections),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
