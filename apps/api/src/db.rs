use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS options (
        name  TEXT PRIMARY KEY,
        value JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id           BIGSERIAL PRIMARY KEY,
        display_name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id           BIGSERIAL PRIMARY KEY,
        post_type    TEXT NOT NULL DEFAULT 'post',
        status       TEXT NOT NULL DEFAULT 'draft',
        title        TEXT NOT NULL,
        content      TEXT NOT NULL DEFAULT '',
        author_id    BIGINT NOT NULL REFERENCES users(id),
        published_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        categories   TEXT[] NOT NULL DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id          BIGSERIAL PRIMARY KEY,
        post_id     BIGINT NOT NULL REFERENCES posts(id),
        author_id   BIGINT REFERENCES users(id),
        author_name TEXT NOT NULL,
        content     TEXT NOT NULL,
        approved    BOOLEAN NOT NULL DEFAULT FALSE,
        parent_id   BIGINT NOT NULL DEFAULT 0,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS comments_post_idx ON comments (post_id, created_at)",
    "CREATE INDEX IF NOT EXISTS comments_author_idx ON comments (author_id)",
];

/// Creates the option store and content tables when they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
