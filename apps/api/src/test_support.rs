//! Shared fixtures: a fully wired core over the in-memory host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::commentary::Commenter;
use crate::hooks::Hooks;
use crate::host::in_memory::InMemoryHost;
use crate::host::{ContentHost, OptionStore};
use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};
use crate::memory::MemoryLog;
use crate::models::CronFrequency;
use crate::personas::{PersonaInput, PersonaRegistry, PersonaStore, ProviderAllowList};
use crate::scheduler::{Scheduler, TriggerHost};
use crate::selection::StrategySelector;

/// Identity every harness persona comments as.
pub const AUTHOR_ID: i64 = 7;
pub const SECOND_AUTHOR_ID: i64 = 8;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub system: String,
    pub provider: String,
    pub max_tokens: u32,
}

struct Script {
    reply: Result<String, String>,
    calls: Vec<RecordedCall>,
}

/// Text generator that records every request and answers from a script.
pub struct ScriptedGenerator {
    script: Mutex<Script>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                reply: Ok("A thoughtful comment.".to_string()),
                calls: Vec::new(),
            }),
        }
    }

    pub fn respond(&self, text: &str) {
        self.script.lock().unwrap().reply = Ok(text.to_string());
    }

    pub fn fail(&self, message: &str) {
        self.script.lock().unwrap().reply = Err(message.to_string());
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.script.lock().unwrap().calls.last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(RecordedCall {
            prompt: request.prompt.to_string(),
            system: request.system.to_string(),
            provider: request.provider.to_string(),
            max_tokens: request.max_tokens,
        });
        script.reply.clone().map_err(|message| LlmError::Api {
            status: 500,
            message,
        })
    }
}

/// Trigger facility that only records what is installed.
#[derive(Default)]
pub struct RecordingTriggers {
    installed: Mutex<HashMap<String, CronFrequency>>,
}

impl RecordingTriggers {
    /// Installed triggers sorted by key.
    pub fn installed(&self) -> Vec<(String, CronFrequency)> {
        let mut all: Vec<_> = self
            .installed
            .lock()
            .unwrap()
            .iter()
            .map(|(k, f)| (k.clone(), *f))
            .collect();
        all.sort();
        all
    }
}

impl TriggerHost for RecordingTriggers {
    fn schedule(&self, key: &str, frequency: CronFrequency) {
        self.installed
            .lock()
            .unwrap()
            .insert(key.to_string(), frequency);
    }

    fn clear(&self, key: &str) {
        self.installed.lock().unwrap().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.installed.lock().unwrap().keys().cloned().collect()
    }
}

pub struct Harness {
    pub host: Arc<InMemoryHost>,
    pub generator: Arc<ScriptedGenerator>,
    pub triggers: Arc<RecordingTriggers>,
    pub personas: PersonaStore,
    pub memory: MemoryLog,
    pub selector: StrategySelector,
    pub commenter: Commenter,
    pub scheduler: Arc<Scheduler>,
    pub registry: PersonaRegistry,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_hooks(Hooks::new())
    }

    pub fn with_hooks(hooks: Hooks) -> Self {
        let host = Arc::new(InMemoryHost::new());
        host.add_identity(AUTHOR_ID, "Claude Bot");
        host.add_identity(SECOND_AUTHOR_ID, "Second Bot");

        let content: Arc<dyn ContentHost> = host.clone();
        let options: Arc<dyn OptionStore> = host.clone();
        let hooks = Arc::new(hooks);
        let generator = Arc::new(ScriptedGenerator::new());
        let triggers = Arc::new(RecordingTriggers::default());

        let personas = PersonaStore::new(options.clone());
        let memory = MemoryLog::new(options);
        let selector = StrategySelector::new(content.clone(), hooks.clone());
        let commenter = Commenter::new(
            personas.clone(),
            content.clone(),
            memory.clone(),
            generator.clone(),
            hooks,
            selector.clone(),
        );
        let scheduler = Arc::new(Scheduler::new(
            personas.clone(),
            triggers.clone(),
            selector.clone(),
            commenter.clone(),
        ));
        let registry = PersonaRegistry::new(
            personas.clone(),
            content,
            scheduler.clone(),
            ProviderAllowList::default(),
        );

        Self {
            host,
            generator,
            triggers,
            personas,
            memory,
            selector,
            commenter,
            scheduler,
            registry,
        }
    }

    /// Saves a persona bound to [`AUTHOR_ID`] and returns its id.
    pub async fn persona(&self, name: &str) -> String {
        self.registry
            .save(PersonaInput {
                name: name.to_string(),
                definition: "You are a sharp critic.".to_string(),
                author_identity: AUTHOR_ID,
                provider: "anthropic".to_string(),
                ..PersonaInput::default()
            })
            .await
            .unwrap()
    }
}
