//! HTTP API server.
//!
//! Exposes the voice pipeline and the task store over REST:
//!
//! ```text
//! GET    /health                 liveness check
//! POST   /api/voice/parse        transcript -> structured draft
//! POST   /api/voice/transcribe   audio upload -> transcript + draft
//! GET    /api/tasks              list (filters or full-text search)
//! POST   /api/tasks              create
//! GET    /api/tasks/:id          fetch one
//! PUT    /api/tasks/:id          partial update
//! DELETE /api/tasks/:id          delete
//! ```
//!
//! All error responses share the `{"error": "..."}` envelope from
//! [`error::ApiError`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::store::TaskStore;
use crate::voice::VoicePipeline;

pub mod error;
mod tasks_api;
mod voice_api;

pub use error::ApiError;

/// Request body cap. Audio uploads run to 10MB, plus multipart framing.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub pipeline: Arc<VoicePipeline>,
}

/// Builds the API router. Separate from [`serve`] so tests can drive it
/// in-process.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/tasks",
            get(tasks_api::list_tasks).post(tasks_api::create_task),
        )
        .route(
            "/api/tasks/:id",
            get(tasks_api::get_task)
                .put(tasks_api::update_task)
                .delete(tasks_api::delete_task),
        )
        .route("/api/voice/parse", post(voice_api::parse_transcript))
        .route("/api/voice/transcribe", post(voice_api::transcribe_audio))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Starts the Axum HTTP server and blocks until it exits.
#[instrument(skip(state))]
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    info!("voxtask API listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
