pub mod content;
pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::commentary::handlers as comments;
use crate::memory::handlers as memory;
use crate::personas::handlers as personas;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Personas
        .route(
            "/api/v1/personas",
            get(personas::handle_list).post(personas::handle_save),
        )
        .route(
            "/api/v1/personas/:id",
            get(personas::handle_get).delete(personas::handle_delete),
        )
        .route("/api/v1/personas/:id/select", post(personas::handle_select))
        .route("/api/v1/personas/:id/run", post(personas::handle_run))
        // Commentary
        .route("/api/v1/comments", post(comments::handle_comment))
        // Memory
        .route(
            "/api/v1/memory",
            get(memory::handle_read).put(memory::handle_replace),
        )
        .route(
            "/api/v1/memory/:section",
            get(memory::handle_read_section).post(memory::handle_append),
        )
        // Site
        .route("/api/v1/context", get(content::handle_current_context))
        .route("/api/v1/posts/:id", delete(content::handle_trash_post))
        .with_state(state)
}
