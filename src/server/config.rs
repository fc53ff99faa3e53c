use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use super::{session, ApiError};
use crate::state::{AppState, ConfigPatch, PipelineConfig};

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PipelineConfig>, ApiError> {
    let session = session(&state, &id).await?;
    let config = session.lock().await.config.clone();
    Ok(Json(config))
}

/// Patch the pipeline config. Chunking changes apply to later uploads only.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<PipelineConfig>, ApiError> {
    let session = session(&state, &id).await?;
    let mut session = session.lock().await;
    session.config.apply(&patch)?;
    info!(session = %id, config = ?session.config, "config updated");
    Ok(Json(session.config.clone()))
}
