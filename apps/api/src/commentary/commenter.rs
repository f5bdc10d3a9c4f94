//! Commenter: one persona comment on one post, end to end.
//!
//! Flow: resolve persona → post → author → safety gate → context →
//!       system instruction → parent → user prompt → generate → insert →
//!       memory update → result.
//!
//! Every step either succeeds or ends the cycle with one named failure.
//! Nothing is retried, and nothing is written before the insert step.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::commentary::prompts::{
    abridge, build_system_instruction, build_user_prompt, PromptInput, EXCERPT_CHAR_LIMIT,
};
use crate::hooks::{GateDecision, Hooks, SafetyCheck};
use crate::host::ContentHost;
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::memory::{MemoryDocument, MemoryLog, COMMENTARY_LOG, RECENT_ACTIVITY};
use crate::models::{Comment, NewComment, Persona, Post, PostStatus};
use crate::personas::PersonaStore;
use crate::selection::strategy::DIRECT_STRATEGY_ID;
use crate::selection::{SelectionContext, StrategySelector};

/// Output budget for a comment or a reply.
pub const MAX_OUTPUT_TOKENS: u32 = 1500;
/// How many existing comments are shown to the model.
pub const RECENT_COMMENT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("persona '{0}' not found")]
    PersonaNotFound(String),

    #[error("post {0} not found or not published")]
    ContentNotFound(i64),

    #[error("author identity {0} not found")]
    AuthorNotFound(i64),

    #[error("comment blocked: {0}")]
    CommentBlocked(String),

    #[error("parent comment {0} not found on this post")]
    ParentNotFound(i64),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("generated comment was empty")]
    EmptyComment,

    #[error("comment insert failed: {0}")]
    InsertFailed(String),

    #[error("comment {comment_id} was posted but the memory update failed: {message}")]
    MemoryWriteFailed { comment_id: i64, message: String },

    #[error("host error: {0}")]
    Host(String),
}

impl CommentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PersonaNotFound(_) => "persona_not_found",
            Self::ContentNotFound(_) => "content_not_found",
            Self::AuthorNotFound(_) => "author_not_found",
            Self::CommentBlocked(_) => "comment_blocked",
            Self::ParentNotFound(_) => "parent_not_found",
            Self::GenerationFailed(_) => "generation_failed",
            Self::EmptyComment => "empty_comment",
            Self::InsertFailed(_) => "insert_failed",
            Self::MemoryWriteFailed { .. } => "memory_write_failed",
            Self::Host(_) => "host_error",
        }
    }

    fn host(err: impl std::fmt::Display) -> Self {
        Self::Host(err.to_string())
    }
}

/// A comment the host accepted.
#[derive(Debug, Clone, Serialize)]
pub struct CommentResult {
    pub comment_id: i64,
    pub content_text: String,
    pub target_content_id: i64,
    pub author_display_name: String,
}

#[derive(Clone)]
pub struct Commenter {
    personas: PersonaStore,
    host: Arc<dyn ContentHost>,
    memory: MemoryLog,
    generator: Arc<dyn TextGenerator>,
    hooks: Arc<Hooks>,
    selector: StrategySelector,
}

impl Commenter {
    pub fn new(
        personas: PersonaStore,
        host: Arc<dyn ContentHost>,
        memory: MemoryLog,
        generator: Arc<dyn TextGenerator>,
        hooks: Arc<Hooks>,
        selector: StrategySelector,
    ) -> Self {
        Self {
            personas,
            host,
            memory,
            generator,
            hooks,
            selector,
        }
    }

    /// Generates and posts one comment as `persona_id` on `content_id`.
    ///
    /// `parent_id > 0` makes it a reply. A missing or empty `context` marks a
    /// direct call; its context is built through the same enrichers the
    /// selector uses.
    pub async fn comment(
        &self,
        content_id: i64,
        persona_id: &str,
        parent_id: i64,
        context: Option<SelectionContext>,
    ) -> Result<CommentResult, CommentError> {
        let persona = self
            .personas
            .get(persona_id)
            .await
            .map_err(CommentError::host)?
            .ok_or_else(|| CommentError::PersonaNotFound(persona_id.to_string()))?;

        let post = self
            .host
            .get_post(content_id, Some(PostStatus::Publish))
            .await
            .map_err(CommentError::host)?
            .ok_or(CommentError::ContentNotFound(content_id))?;

        let author = self
            .host
            .get_identity(persona.author_identity)
            .await
            .map_err(CommentError::host)?
            .ok_or(CommentError::AuthorNotFound(persona.author_identity))?;

        let check = SafetyCheck {
            persona: &persona,
            post: &post,
            author: &author,
            parent_id,
        };
        if let GateDecision::Block(reason) = self.hooks.check_safety(&check) {
            info!("Comment by {} on post {} blocked: {reason}", persona.id, post.id);
            return Err(CommentError::CommentBlocked(reason));
        }

        let context = match context {
            Some(ctx) if !ctx.is_empty() => ctx,
            _ => self.selector.build_context(
                SelectionContext::new(DIRECT_STRATEGY_ID, ""),
                &post,
                &persona,
            ),
        };

        let system = self.system_instruction(&persona).await?;
        let parent = self.resolve_parent(&post, parent_id).await?;

        let comments = self
            .host
            .recent_comments(post.id, RECENT_COMMENT_LIMIT)
            .await
            .map_err(CommentError::host)?;
        let prompt = build_user_prompt(&PromptInput {
            post: &post,
            context: &context,
            comments: &comments,
            parent: parent.as_ref(),
            now: Utc::now(),
        });

        let generated = self
            .generator
            .generate(GenerationRequest {
                prompt: &prompt,
                system: &system,
                provider: &persona.provider,
                max_tokens: MAX_OUTPUT_TOKENS,
            })
            .await
            .map_err(|e| CommentError::GenerationFailed(e.to_string()))?;

        let text = generated.trim().to_string();
        if text.is_empty() {
            return Err(CommentError::EmptyComment);
        }

        let comment_id = self
            .host
            .insert_comment(NewComment {
                post_id: post.id,
                author: author.clone(),
                content: text.clone(),
                parent_id: parent.as_ref().map_or(0, |p| p.id),
                approved: true,
            })
            .await
            .map_err(|e| CommentError::InsertFailed(e.to_string()))?;

        info!(
            "Persona {} posted comment {comment_id} on post {}",
            persona.id, post.id
        );

        self.remember(&persona, &post, parent.as_ref(), &text)
            .await
            .map_err(|e| CommentError::MemoryWriteFailed {
                comment_id,
                message: e.to_string(),
            })?;

        Ok(CommentResult {
            comment_id,
            content_text: text,
            target_content_id: post.id,
            author_display_name: author.display_name,
        })
    }

    async fn system_instruction(&self, persona: &Persona) -> Result<String, CommentError> {
        let memory = self.memory.read().await.map_err(CommentError::host)?;
        let has_memory = MemoryDocument::parse(&memory).has_content();
        Ok(build_system_instruction(
            persona,
            has_memory.then_some(memory.as_str()),
        ))
    }

    async fn resolve_parent(
        &self,
        post: &Post,
        parent_id: i64,
    ) -> Result<Option<Comment>, CommentError> {
        if parent_id <= 0 {
            return Ok(None);
        }
        let parent = self
            .host
            .get_comment(parent_id)
            .await
            .map_err(CommentError::host)?
            .filter(|c| c.post_id == post.id)
            .ok_or(CommentError::ParentNotFound(parent_id))?;
        Ok(Some(parent))
    }

    async fn remember(
        &self,
        persona: &Persona,
        post: &Post,
        parent: Option<&Comment>,
        text: &str,
    ) -> Result<(), crate::memory::MemoryError> {
        let excerpt = abridge(text, EXCERPT_CHAR_LIMIT);
        let (activity, log) = match parent {
            Some(parent) => (
                format!(
                    "{} replied to {} on \"{}\" (post #{}).",
                    persona.name, parent.author_name, post.title, post.id
                ),
                format!(
                    "Post #{} \"{}\", reply to {}: {excerpt}",
                    post.id, post.title, parent.author_name
                ),
            ),
            None => (
                format!(
                    "{} commented on \"{}\" (post #{}).",
                    persona.name, post.title, post.id
                ),
                format!("Post #{} \"{}\": {excerpt}", post.id, post.title),
            ),
        };

        self.memory.append_entry(RECENT_ACTIVITY, &activity).await?;
        self.memory.append_entry(COMMENTARY_LOG, &log).await
    }
}
