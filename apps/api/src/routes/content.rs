use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::current_context::CurrentContext;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/context
pub async fn handle_current_context(
    State(state): State<AppState>,
) -> Result<Json<CurrentContext>, AppError> {
    let ctx = CurrentContext::load(state.host.as_ref(), &state.personas, &state.memory).await?;
    Ok(Json(ctx))
}

/// DELETE /api/v1/posts/:id
pub async fn handle_trash_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.host.trash_post(id).await? {
        return Err(AppError::NotFound(format!("post {id}")));
    }
    Ok(Json(json!({ "id": id, "status": "trash" })))
}
