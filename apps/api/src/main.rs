mod commentary;
mod config;
mod current_context;
mod db;
mod errors;
mod hooks;
mod host;
mod llm_client;
mod memory;
mod models;
mod personas;
mod routes;
mod scheduler;
mod selection;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commentary::Commenter;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::hooks::{post_blocklist, Hooks};
use crate::host::{ContentHost, OptionStore, PgHost};
use crate::llm_client::LlmClient;
use crate::memory::MemoryLog;
use crate::personas::{migrate_legacy_persona, PersonaRegistry, PersonaStore, ProviderAllowList};
use crate::routes::build_router;
use crate::scheduler::{run_dispatch, Scheduler, TokioTriggers};
use crate::selection::StrategySelector;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Commentator API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    let pg = Arc::new(PgHost::new(db, config.site.clone()));
    let host: Arc<dyn ContentHost> = pg.clone();
    let options: Arc<dyn OptionStore> = pg;

    // Extension points
    let mut hooks = Hooks::new();
    if !config.comment_blocklist.is_empty() {
        info!("Blocking comments on posts {:?}", config.comment_blocklist);
        hooks.register_safety_gate(post_blocklist(config.comment_blocklist.clone()));
    }
    let hooks = Arc::new(hooks);

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(
        config.anthropic_api_key.clone(),
        config.openai_api_key.clone(),
    ));
    info!(
        "LLM client initialized (anthropic: {}, openai: {})",
        config.anthropic_api_key.is_some(),
        config.openai_api_key.is_some()
    );

    // Core components
    let personas = PersonaStore::new(options.clone());
    let memory = MemoryLog::new(options);
    let selector = StrategySelector::new(host.clone(), hooks.clone());
    let commenter = Commenter::new(
        personas.clone(),
        host.clone(),
        memory.clone(),
        llm,
        hooks,
        selector.clone(),
    );

    let (triggers, fired) = TokioTriggers::new();
    let scheduler = Arc::new(Scheduler::new(
        personas.clone(),
        Arc::new(triggers),
        selector.clone(),
        commenter.clone(),
    ));
    let registry = Arc::new(PersonaRegistry::new(
        personas.clone(),
        host.clone(),
        scheduler.clone(),
        ProviderAllowList::default(),
    ));

    if std::env::args().nth(1).as_deref() == Some("uninstall") {
        scheduler.unschedule(None).await?;
        memory.purge().await?;
        info!("Removed schedules and the memory document");
        return Ok(());
    }

    // One-shot upgrade, then restore every enabled schedule
    migrate_legacy_persona(&registry).await?;
    scheduler.reschedule_all().await?;
    tokio::spawn(run_dispatch(scheduler.clone(), fired));

    // Build app state
    let state = AppState {
        host,
        personas,
        registry,
        memory,
        selector,
        commenter,
        scheduler: scheduler.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Deactivation clears every installed trigger
    scheduler.unschedule(None).await?;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
