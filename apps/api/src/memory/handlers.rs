use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DocumentResponse {
    pub document: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ReplaceRequest {
    pub document: String,
}

#[derive(Serialize)]
pub struct SectionResponse {
    pub section: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct AppendRequest {
    pub text: String,
}

/// GET /api/v1/memory
pub async fn handle_read(
    State(state): State<AppState>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = state.memory.read().await?;
    let updated_at = state.memory.updated_at().await?;
    Ok(Json(DocumentResponse {
        document,
        updated_at,
    }))
}

/// PUT /api/v1/memory
pub async fn handle_replace(
    State(state): State<AppState>,
    Json(req): Json<ReplaceRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    state.memory.replace(&req.document).await?;
    let updated_at = state.memory.updated_at().await?;
    Ok(Json(DocumentResponse {
        document: req.document,
        updated_at,
    }))
}

/// GET /api/v1/memory/:section
pub async fn handle_read_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<SectionResponse>, AppError> {
    let content = state.memory.read_section(&section).await?;
    Ok(Json(SectionResponse { section, content }))
}

/// POST /api/v1/memory/:section
pub async fn handle_append(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(req): Json<AppendRequest>,
) -> Result<Json<SectionResponse>, AppError> {
    state.memory.append_entry(&section, &req.text).await?;
    let content = state.memory.read_section(&section).await?;
    Ok(Json(SectionResponse { section, content }))
}
