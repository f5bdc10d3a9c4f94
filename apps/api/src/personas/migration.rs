use serde::Deserialize;
use tracing::{info, warn};

use crate::host::{ContentHost, OptionStore};
use crate::personas::registry::{PersonaError, PersonaInput, PersonaRegistry};

const LEGACY_KEY: &str = "persona_legacy";

/// The single-persona setting that predates the persona collection.
#[derive(Debug, Deserialize)]
struct LegacyPersona {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    author_identity: i64,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    cron_enabled: bool,
    #[serde(default)]
    cron_frequency: Option<String>,
}

/// One-shot upgrade of the legacy setting into a persona record.
///
/// Runs only when the collection is empty and the legacy value exists. On
/// success the legacy value is removed, so a second run is a no-op. Invalid
/// legacy data is logged and left in place. Returns the new persona id.
pub async fn migrate_legacy_persona(
    registry: &PersonaRegistry,
) -> Result<Option<String>, PersonaError> {
    if !registry.list().await?.is_empty() {
        return Ok(None);
    }
    let options = registry.store().options();
    let Some(value) = options.get_option(LEGACY_KEY).await? else {
        return Ok(None);
    };

    let legacy: LegacyPersona = match serde_json::from_value(value) {
        Ok(legacy) => legacy,
        Err(e) => {
            warn!("Skipping legacy persona migration, stored value is malformed: {e}");
            return Ok(None);
        }
    };

    let name = match legacy.name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => registry
            .host()
            .get_identity(legacy.author_identity)
            .await?
            .map(|identity| identity.display_name)
            .unwrap_or_default(),
    };
    let provider = legacy
        .provider
        .filter(|p| !p.trim().is_empty())
        .or_else(|| registry.providers().first().map(str::to_string))
        .unwrap_or_default();

    let input = PersonaInput {
        id: None,
        name,
        definition: legacy.definition,
        author_identity: legacy.author_identity,
        provider,
        cron_enabled: legacy.cron_enabled,
        cron_frequency: legacy.cron_frequency,
    };

    let id = match registry.save(input).await {
        Ok(id) => id,
        Err(PersonaError::Storage(e)) => return Err(PersonaError::Storage(e)),
        Err(e) => {
            warn!("Skipping legacy persona migration: {e}");
            return Ok(None);
        }
    };

    options.delete_option(LEGACY_KEY).await?;
    info!("Migrated legacy persona to {id}");
    Ok(Some(id))
}
