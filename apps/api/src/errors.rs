use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::commentary::CommentError;
use crate::memory::MemoryError;
use crate::personas::PersonaError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Persona(#[from] PersonaError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Comment(#[from] CommentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Persona(e) => match e {
                PersonaError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
                _ => (StatusCode::BAD_REQUEST, e.code()),
            },
            AppError::Memory(e) => match e {
                MemoryError::UnknownSection(_) => (StatusCode::NOT_FOUND, e.code()),
                MemoryError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
            },
            AppError::Comment(e) => {
                let status = match e {
                    CommentError::PersonaNotFound(_)
                    | CommentError::ContentNotFound(_)
                    | CommentError::AuthorNotFound(_)
                    | CommentError::ParentNotFound(_) => StatusCode::NOT_FOUND,
                    CommentError::CommentBlocked(_) => StatusCode::CONFLICT,
                    CommentError::GenerationFailed(_) | CommentError::EmptyComment => {
                        StatusCode::BAD_GATEWAY
                    }
                    CommentError::InsertFailed(_)
                    | CommentError::MemoryWriteFailed { .. }
                    | CommentError::Host(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        // Core failures are reported verbatim; only opaque internals are masked.
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::error!("{code}: {other}");
                }
                other.to_string()
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::Comment(CommentError::MemoryWriteFailed { comment_id, .. }) = &self {
            error["comment_id"] = json!(comment_id);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let blocked = AppError::from(CommentError::CommentBlocked("quiet hours".to_string()));
        assert_eq!(blocked.parts(), (StatusCode::CONFLICT, "comment_blocked"));

        let missing = AppError::from(CommentError::ParentNotFound(4));
        assert_eq!(missing.parts(), (StatusCode::NOT_FOUND, "parent_not_found"));

        let invalid = AppError::from(PersonaError::MissingName);
        assert_eq!(invalid.parts(), (StatusCode::BAD_REQUEST, "missing_name"));

        let section = AppError::from(MemoryError::UnknownSection("diary".to_string()));
        assert_eq!(section.parts(), (StatusCode::NOT_FOUND, "unknown_section"));
    }

    #[tokio::test]
    async fn test_memory_write_failure_keeps_comment_id() {
        let err = AppError::from(CommentError::MemoryWriteFailed {
            comment_id: 42,
            message: "disk full".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "memory_write_failed");
        assert_eq!(body["error"]["comment_id"], 42, "Comment id survives");
        assert!(body["error"]["message"].as_str().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_other_errors_carry_no_comment_id() {
        let response = AppError::from(CommentError::EmptyComment).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "empty_comment");
        assert!(body["error"].get("comment_id").is_none());
    }
}
