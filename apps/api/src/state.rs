use std::sync::Arc;

use crate::commentary::Commenter;
use crate::host::ContentHost;
use crate::memory::MemoryLog;
use crate::personas::{PersonaRegistry, PersonaStore};
use crate::scheduler::Scheduler;
use crate::selection::StrategySelector;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<dyn ContentHost>,
    pub personas: PersonaStore,
    pub registry: Arc<PersonaRegistry>,
    pub memory: MemoryLog,
    pub selector: StrategySelector,
    pub commenter: Commenter,
    pub scheduler: Arc<Scheduler>,
}
