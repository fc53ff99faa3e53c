use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{session, ApiError};
use crate::session::{HistoryEntry, HistoryStats};
use crate::state::{AppState, PipelineConfig};

const DEFAULT_HISTORY: usize = 5;
const MAX_HISTORY: usize = 50;

#[derive(Serialize)]
pub struct Created {
    session_id: String,
    config: PipelineConfig,
}

pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<Created>) {
    let session_id = state.sessions.create(state.defaults.clone()).await;
    (
        StatusCode::CREATED,
        Json(Created {
            session_id,
            config: state.defaults,
        }),
    )
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryStats>, ApiError> {
    let session = session(&state, &id).await?;
    let mut session = session.lock().await;
    session.reset();
    Ok(Json(session.stats()))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
    stats: HistoryStats,
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<History>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).min(MAX_HISTORY);
    let session = session(&state, &id).await?;
    let session = session.lock().await;

    Ok(Json(History {
        entries: session.recent_history(limit).into_iter().cloned().collect(),
        stats: session.stats(),
    }))
}
