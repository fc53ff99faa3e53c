use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::{session, ApiError};
use crate::docs::ingest::ingest_pdf;
use crate::docs::types::{DocExcerpt, DocMeta};
use crate::state::AppState;

const DEFAULT_SEARCH_RESULTS: usize = 5;
const MAX_SEARCH_RESULTS: usize = 20;

pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DocMeta>>, ApiError> {
    let session = session(&state, &id).await?;
    let docs = session.lock().await.documents.list();
    Ok(Json(docs))
}

#[derive(Deserialize)]
pub struct UploadQuery {
    name: Option<String>,
}

/// Upload a PDF as the raw request body.
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<DocMeta>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("request body is empty".to_string()));
    }
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "document.pdf".to_string());

    let session = session(&state, &id).await?;
    // extraction and embedding run without the session lock held
    let (config, generation) = {
        let session = session.lock().await;
        (session.config.clone(), session.generation())
    };

    info!(session = %id, name = %name, bytes = body.len(), "ingestion started");
    let doc = ingest_pdf(&state.llm, body.to_vec(), &name, &config).await?;

    if !state.sessions.contains(&id).await {
        return Err(ApiError::SessionNotFound);
    }
    let mut session = session.lock().await;
    let meta = session
        .admit_document(generation, doc)
        .map(|doc| doc.meta(true))
        .ok_or_else(|| ApiError::Conflict("session was reset during upload".to_string()))?;
    Ok((StatusCode::CREATED, Json(meta)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let session = session(&state, &id).await?;
    let removed = session.lock().await.documents.remove(&doc_id);
    match removed {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::DocumentNotFound),
    }
}

pub async fn activate(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(String, String)>,
) -> Result<Json<DocMeta>, ApiError> {
    let session = session(&state, &id).await?;
    let mut session = session.lock().await;
    let doc = session
        .documents
        .activate(&doc_id)
        .ok_or(ApiError::DocumentNotFound)?;
    Ok(Json(doc.meta(true)))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

pub async fn search(
    State(state): State<AppState>,
    Path((id, doc_id)): Path<(String, String)>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DocExcerpt>>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest("query is empty".to_string()));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_RESULTS)
        .clamp(1, MAX_SEARCH_RESULTS);

    let session = session(&state, &id).await?;
    let session = session.lock().await;
    let hits = session
        .documents
        .search(&doc_id, &query.q, limit)
        .ok_or(ApiError::DocumentNotFound)?;
    Ok(Json(hits))
}
