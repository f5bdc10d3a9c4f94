use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::commentary::CommentResult;
use crate::errors::AppError;
use crate::models::Persona;
use crate::personas::PersonaInput;
use crate::selection::SelectionContext;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SavedResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Deserialize, Default)]
pub struct SelectRequest {
    #[serde(default)]
    pub strategy_id: Option<String>,
}

/// `content_id` is 0 when nothing was eligible.
#[derive(Serialize)]
pub struct SelectResponse {
    pub content_id: i64,
    pub context: Option<SelectionContext>,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunResponse {
    Commented { comment: CommentResult },
    NoEligibleContent,
}

/// GET /api/v1/personas
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<Persona>>, AppError> {
    Ok(Json(state.registry.list().await?))
}

/// POST /api/v1/personas
pub async fn handle_save(
    State(state): State<AppState>,
    Json(input): Json<PersonaInput>,
) -> Result<Json<SavedResponse>, AppError> {
    let id = state.registry.save(input).await?;
    Ok(Json(SavedResponse { id }))
}

/// GET /api/v1/personas/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Persona>, AppError> {
    state
        .registry
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("persona '{id}'")))
}

/// DELETE /api/v1/personas/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    if !state.registry.delete(&id).await? {
        return Err(AppError::NotFound(format!("persona '{id}'")));
    }
    Ok(Json(DeletedResponse { id, deleted: true }))
}

/// POST /api/v1/personas/:id/select
pub async fn handle_select(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<SelectRequest>>,
) -> Result<Json<SelectResponse>, AppError> {
    let persona = state
        .registry
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("persona '{id}'")))?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let selection = state
        .selector
        .select(&persona, req.strategy_id.as_deref())
        .await?;
    Ok(Json(match selection {
        Some(s) => SelectResponse {
            content_id: s.content_id,
            context: Some(s.context),
        },
        None => SelectResponse {
            content_id: 0,
            context: None,
        },
    }))
}

/// POST /api/v1/personas/:id/run
pub async fn handle_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>, AppError> {
    Ok(Json(match state.scheduler.run_cycle(&id).await? {
        Some(comment) => RunResponse::Commented { comment },
        None => RunResponse::NoEligibleContent,
    }))
}
