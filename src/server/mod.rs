mod ask;
mod config;
mod documents;
mod error;
mod sessions;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

use crate::models::{ModelDescriptor, MODELS};
use crate::session::Session;
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let upload_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/models", get(list_models))
        .route("/api/local/health", get(local_health))
        .route("/api/sessions", post(sessions::create))
        .route("/api/sessions/{id}", delete(sessions::remove))
        .route("/api/sessions/{id}/reset", post(sessions::reset))
        .route("/api/sessions/{id}/history", get(sessions::history))
        .route("/api/sessions/{id}/config", get(config::show).put(config::update))
        .route(
            "/api/sessions/{id}/documents",
            get(documents::list).post(documents::upload),
        )
        .route(
            "/api/sessions/{id}/documents/{doc_id}",
            delete(documents::remove),
        )
        .route(
            "/api/sessions/{id}/documents/{doc_id}/activate",
            post(documents::activate),
        )
        .route(
            "/api/sessions/{id}/documents/{doc_id}/search",
            get(documents::search),
        )
        .route("/api/sessions/{id}/ask", post(ask::ask))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {bind_addr}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("PDF assistant listening on http://{}", addr);
    let reaper = state.sessions.spawn_reaper(state.session_ttl);
    let served = axum::serve(listener, app_router(state))
        .await
        .context("server error");
    reaper.abort();
    served
}

/// Resolve a session id or answer 404.
pub(crate) async fn session(state: &AppState, id: &str) -> Result<Arc<Mutex<Session>>, ApiError> {
    state.sessions.get(id).await.ok_or(ApiError::SessionNotFound)
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../../ui/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": "pdf-assistant"}))
}

#[derive(Serialize)]
struct ModelStatus {
    #[serde(flatten)]
    descriptor: &'static ModelDescriptor,
    available: bool,
}

async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelStatus>> {
    Json(
        MODELS
            .iter()
            .map(|descriptor| ModelStatus {
                descriptor,
                available: state.llm.is_configured(descriptor.model),
            })
            .collect(),
    )
}

async fn local_health(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.llm.local_health().await;
    Json(json!({"healthy": healthy}))
}
