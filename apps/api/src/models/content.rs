use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary article type; the only type the selector ever queries.
pub const ARTICLE_TYPE: &str = "post";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    Draft,
    Trash,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Trash => "trash",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "publish" => Some(Self::Publish),
            "draft" => Some(Self::Draft),
            "trash" => Some(Self::Trash),
            _ => None,
        }
    }
}

/// A content item owned by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub post_type: String,
    pub status: PostStatus,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub published_at: DateTime<Utc>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Option<i64>,
    pub author_name: String,
    pub content: String,
    pub approved: bool,
    /// 0 for a top-level comment.
    pub parent_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Comment to be written by the host under `author`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author: Identity,
    pub content: String,
    pub parent_id: i64,
    pub approved: bool,
}

/// A host identity (user account) that can own comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostOrder {
    #[default]
    Newest,
    Oldest,
    Random,
}

/// Filter/sort parameters understood by the host's post query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub post_type: String,
    pub status: PostStatus,
    pub limit: usize,
    pub published_after: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub order: PostOrder,
    pub exclude: Vec<i64>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            post_type: ARTICLE_TYPE.to_string(),
            status: PostStatus::Publish,
            limit: 1,
            published_after: None,
            category: None,
            order: PostOrder::Newest,
            exclude: Vec::new(),
        }
    }
}
