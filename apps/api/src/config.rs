use anyhow::{Context, Result};

use crate::models::SiteInfo;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Provider keys are optional; a provider without a key reports itself unconfigured.
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub site: SiteInfo,
    /// Post ids no persona may comment on.
    pub comment_blocklist: Vec<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            site: SiteInfo {
                name: std::env::var("SITE_NAME").unwrap_or_else(|_| "My Site".to_string()),
                description: optional_env("SITE_DESCRIPTION").unwrap_or_default(),
                url: std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost".to_string()),
            },
            comment_blocklist: parse_id_list(optional_env("COMMENT_BLOCKLIST").as_deref())
                .context("COMMENT_BLOCKLIST must be a comma-separated list of post ids")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_id_list(value: Option<&str>) -> Result<Vec<i64>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().with_context(|| format!("invalid post id '{s}'")))
        .collect()
}
