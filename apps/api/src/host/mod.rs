//! Collaborator seams: the content host and its key-value option store.
//!
//! The core never touches storage directly. Posts, comments and identities
//! are reached through [`ContentHost`]; persona records and the memory
//! document through [`OptionStore`], which is atomic per key and nothing more.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Comment, Identity, NewComment, Post, PostStatus, SiteInfo};
use crate::selection::SealedPostQuery;

#[cfg(test)]
pub mod in_memory;
pub mod postgres;

pub use postgres::PgHost;

#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Resolves a post by id, optionally requiring a status.
    async fn get_post(&self, id: i64, status: Option<PostStatus>) -> anyhow::Result<Option<Post>>;

    /// Runs a post query. Only queries that went through the exclusion stage are accepted.
    async fn query_posts(&self, query: &SealedPostQuery) -> anyhow::Result<Vec<Post>>;

    /// Ids of every post `identity` has commented on.
    async fn commented_post_ids(&self, identity: i64) -> anyhow::Result<Vec<i64>>;

    async fn get_identity(&self, id: i64) -> anyhow::Result<Option<Identity>>;

    async fn get_comment(&self, id: i64) -> anyhow::Result<Option<Comment>>;

    /// The `limit` most recent approved comments on a post, oldest first.
    async fn recent_comments(&self, post_id: i64, limit: usize) -> anyhow::Result<Vec<Comment>>;

    /// Inserts a comment and returns its id.
    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<i64>;

    /// Moves a post to the trash. Used by adjacent tooling, never by the commentary core.
    async fn trash_post(&self, id: i64) -> anyhow::Result<bool>;

    async fn site_info(&self) -> anyhow::Result<SiteInfo>;
}

/// Key-value store, atomic per key.
#[async_trait]
pub trait OptionStore: Send + Sync {
    async fn get_option(&self, name: &str) -> anyhow::Result<Option<Value>>;
    async fn set_option(&self, name: &str, value: Value) -> anyhow::Result<()>;
    async fn delete_option(&self, name: &str) -> anyhow::Result<()>;
}
