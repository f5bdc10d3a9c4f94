use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::host::{ContentHost, OptionStore};
use crate::models::{Comment, Identity, NewComment, Post, PostOrder, PostStatus, SiteInfo};
use crate::selection::SealedPostQuery;

/// PostgreSQL-backed content host and option store.
#[derive(Clone)]
pub struct PgHost {
    pool: PgPool,
    site: SiteInfo,
}

impl PgHost {
    pub fn new(pool: PgPool, site: SiteInfo) -> Self {
        Self { pool, site }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    post_type: String,
    status: String,
    title: String,
    content: String,
    author_id: i64,
    published_at: DateTime<Utc>,
    categories: Vec<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let status = PostStatus::parse(&row.status)
            .with_context(|| format!("post {} has unknown status '{}'", row.id, row.status))?;
        Ok(Post {
            id: row.id,
            post_type: row.post_type,
            status,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            published_at: row.published_at,
            categories: row.categories,
        })
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: Option<i64>,
    author_name: String,
    content: String,
    approved: bool,
    parent_id: i64,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            author_name: row.author_name,
            content: row.content,
            approved: row.approved,
            parent_id: row.parent_id,
            created_at: row.created_at,
        }
    }
}

const POST_COLUMNS: &str =
    "id, post_type, status, title, content, author_id, published_at, categories";
const COMMENT_COLUMNS: &str =
    "id, post_id, author_id, author_name, content, approved, parent_id, created_at";

#[async_trait]
impl ContentHost for PgHost {
    async fn get_post(&self, id: i64, status: Option<PostStatus>) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE id = $1 AND ($2::TEXT IS NULL OR status = $2::TEXT)"
        ))
        .bind(id)
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Post::try_from).transpose()
    }

    async fn query_posts(&self, query: &SealedPostQuery) -> anyhow::Result<Vec<Post>> {
        let query = query.query();
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE post_type = "));
        builder.push_bind(query.post_type.clone());
        builder.push(" AND status = ").push_bind(query.status.as_str());

        if let Some(after) = query.published_after {
            builder.push(" AND published_at >= ").push_bind(after);
        }
        if let Some(category) = &query.category {
            builder.push(" AND ").push_bind(category.clone()).push(" = ANY(categories)");
        }
        if !query.exclude.is_empty() {
            builder
                .push(" AND NOT (id = ANY(")
                .push_bind(query.exclude.clone())
                .push("))");
        }

        builder.push(match query.order {
            PostOrder::Newest => " ORDER BY published_at DESC",
            PostOrder::Oldest => " ORDER BY published_at ASC",
            PostOrder::Random => " ORDER BY random()",
        });
        builder.push(" LIMIT ").push_bind(query.limit as i64);

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Post::try_from).collect()
    }

    async fn commented_post_ids(&self, identity: i64) -> anyhow::Result<Vec<i64>> {
        Ok(sqlx::query_scalar(
            "SELECT DISTINCT post_id FROM comments WHERE author_id = $1",
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_identity(&self, id: i64) -> anyhow::Result<Option<Identity>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, display_name FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, display_name)| Identity { id, display_name }))
    }

    async fn get_comment(&self, id: i64) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Comment::from))
    }

    async fn recent_comments(&self, post_id: i64, limit: usize) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT * FROM (
                SELECT {COMMENT_COLUMNS} FROM comments
                WHERE post_id = $1 AND approved
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(post_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> anyhow::Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (post_id, author_id, author_name, content, approved, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author.id)
        .bind(&comment.author.display_name)
        .bind(&comment.content)
        .bind(comment.approved)
        .bind(comment.parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn trash_post(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE posts SET status = 'trash' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn site_info(&self) -> anyhow::Result<SiteInfo> {
        Ok(self.site.clone())
    }
}

#[async_trait]
impl OptionStore for PgHost {
    async fn get_option(&self, name: &str) -> anyhow::Result<Option<Value>> {
        Ok(sqlx::query_scalar("SELECT value FROM options WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_option(&self, name: &str, value: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO options (name, value) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_option(&self, name: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM options WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
