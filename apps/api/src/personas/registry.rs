use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::host::ContentHost;
use crate::llm_client::{PROVIDER_ANTHROPIC, PROVIDER_OPENAI};
use crate::models::{CronFrequency, Persona};
use crate::personas::store::PersonaStore;
use crate::scheduler::Scheduler;

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("name is required")]
    MissingName,

    #[error("definition is required")]
    MissingDefinition,

    #[error("author identity {0} does not exist")]
    AuthorNotFound(i64),

    #[error("provider '{0}' is not allowed")]
    InvalidProvider(String),

    #[error("persona storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl PersonaError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingDefinition => "missing_definition",
            Self::AuthorNotFound(_) => "author_not_found",
            Self::InvalidProvider(_) => "invalid_provider",
            Self::Storage(_) => "storage",
        }
    }
}

/// Provider ids a persona may be bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAllowList(Vec<String>);

impl ProviderAllowList {
    pub fn new(providers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(providers.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.0.iter().any(|p| p == provider)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

impl Default for ProviderAllowList {
    fn default() -> Self {
        Self::new([PROVIDER_ANTHROPIC, PROVIDER_OPENAI])
    }
}

/// Payload for [`PersonaRegistry::save`].
/// Missing fields fail validation rather than deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonaInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub author_identity: i64,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub cron_enabled: bool,
    #[serde(default)]
    pub cron_frequency: Option<String>,
}

pub struct PersonaRegistry {
    personas: PersonaStore,
    host: Arc<dyn ContentHost>,
    scheduler: Arc<Scheduler>,
    providers: ProviderAllowList,
}

impl PersonaRegistry {
    pub fn new(
        personas: PersonaStore,
        host: Arc<dyn ContentHost>,
        scheduler: Arc<Scheduler>,
        providers: ProviderAllowList,
    ) -> Self {
        Self {
            personas,
            host,
            scheduler,
            providers,
        }
    }

    pub fn providers(&self) -> &ProviderAllowList {
        &self.providers
    }

    pub(crate) fn store(&self) -> &PersonaStore {
        &self.personas
    }

    pub(crate) fn host(&self) -> &dyn ContentHost {
        self.host.as_ref()
    }

    pub async fn list(&self) -> Result<Vec<Persona>, PersonaError> {
        Ok(self.personas.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Persona>, PersonaError> {
        Ok(self.personas.get(id).await?)
    }

    /// Validates and upserts a persona, then reinstalls its schedule. Returns the id.
    ///
    /// An `id` matching an existing record updates it in place; anything else
    /// creates a new record with an id derived from the name.
    pub async fn save(&self, input: PersonaInput) -> Result<String, PersonaError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(PersonaError::MissingName);
        }
        let definition = input.definition.trim().to_string();
        if definition.is_empty() {
            return Err(PersonaError::MissingDefinition);
        }
        if self.host.get_identity(input.author_identity).await?.is_none() {
            return Err(PersonaError::AuthorNotFound(input.author_identity));
        }
        let provider = input.provider.trim().to_lowercase();
        if !self.providers.contains(&provider) {
            return Err(PersonaError::InvalidProvider(input.provider));
        }

        let mut personas = self.personas.list().await?;
        let existing = input
            .id
            .as_deref()
            .and_then(|id| personas.iter().position(|p| p.id == id));

        let id = match existing {
            Some(index) => personas[index].id.clone(),
            None => {
                let ids: Vec<&str> = personas.iter().map(|p| p.id.as_str()).collect();
                generate_id(&name, &ids)
            }
        };

        let persona = Persona {
            id: id.clone(),
            name,
            definition,
            author_identity: input.author_identity,
            provider,
            cron_enabled: input.cron_enabled,
            cron_frequency: CronFrequency::parse_or_default(input.cron_frequency.as_deref()),
        };

        match existing {
            Some(index) => personas[index] = persona,
            None => personas.push(persona),
        }
        self.personas.write(&personas).await?;
        info!(
            "{} persona {id}",
            if existing.is_some() { "Updated" } else { "Created" }
        );

        self.scheduler.reschedule(&id).await?;
        Ok(id)
    }

    /// Removes a persona and its schedule. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool, PersonaError> {
        let mut personas = self.personas.list().await?;
        let before = personas.len();
        personas.retain(|p| p.id != id);
        let found = personas.len() != before;

        if found {
            self.personas.write(&personas).await?;
            info!("Deleted persona {id}");
        }
        self.scheduler.unschedule(Some(id)).await?;
        Ok(found)
    }
}

/// Lowercase slug of `name`, suffixed `-2`, `-3`, … until it is not in `taken`.
pub fn generate_id(name: &str, taken: &[&str]) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let base = if slug.is_empty() { "persona" } else { slug };

    if !taken.contains(&base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(&candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
