use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use super::{session, ApiError};
use crate::qa::{AskRequest, QaResponse};
use crate::state::AppState;

/// Answer a question against the session's active document.
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QaResponse>, ApiError> {
    let session = session(&state, &id).await?;
    // held for the whole question so one session answers one at a time
    let mut session = session.lock().await;

    info!(session = %id, mode = ?request.mode, question = %request.question, "question received");
    let response = state.qa.ask(&mut session, request).await?;
    Ok(Json(response))
}
