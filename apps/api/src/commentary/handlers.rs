use axum::{extract::State, Json};
use serde::Deserialize;

use crate::commentary::CommentResult;
use crate::errors::AppError;
use crate::selection::SelectionContext;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommentRequest {
    pub content_id: i64,
    pub persona_id: String,
    #[serde(default)]
    pub parent_id: i64,
    #[serde(default)]
    pub context: Option<SelectionContext>,
}

/// POST /api/v1/comments
pub async fn handle_comment(
    State(state): State<AppState>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<CommentResult>, AppError> {
    let result = state
        .commenter
        .comment(req.content_id, &req.persona_id, req.parent_id, req.context)
        .await?;
    Ok(Json(result))
}
