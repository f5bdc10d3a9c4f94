use std::sync::Arc;

use anyhow::Context;

use crate::host::OptionStore;
use crate::models::Persona;

const PERSONAS_KEY: &str = "personas";

/// Raw persistence for the persona collection: one ordered list under one key.
///
/// Read-only consumers (commenter, scheduler) hold this directly; writes go
/// through the registry so validation and rescheduling always run.
#[derive(Clone)]
pub struct PersonaStore {
    store: Arc<dyn OptionStore>,
}

impl PersonaStore {
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<Persona>> {
        match self.store.get_option(PERSONAS_KEY).await? {
            Some(value) => serde_json::from_value(value).context("stored personas are malformed"),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(&self, id: &str) -> anyhow::Result<Option<Persona>> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    pub(crate) async fn write(&self, personas: &[Persona]) -> anyhow::Result<()> {
        self.store
            .set_option(PERSONAS_KEY, serde_json::to_value(personas)?)
            .await
    }

    pub(crate) fn options(&self) -> &Arc<dyn OptionStore> {
        &self.store
    }
}
