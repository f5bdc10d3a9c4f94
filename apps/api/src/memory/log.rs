use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::host::OptionStore;
use crate::memory::document::{format_entry, MemoryDocument, SectionDef};
use crate::memory::{default_sections, MAX_ENTRIES_PER_SECTION};

const MEMORY_KEY: &str = "memory";
const UPDATED_AT_KEY: &str = "memory_updated_at";

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("unknown memory section '{0}'")]
    UnknownSection(String),

    #[error("memory storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl MemoryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownSection(_) => "unknown_section",
            Self::Storage(_) => "storage",
        }
    }
}

/// Shared memory document backed by the option store.
#[derive(Clone)]
pub struct MemoryLog {
    store: Arc<dyn OptionStore>,
    sections: Arc<[SectionDef]>,
    max_entries: usize,
}

impl MemoryLog {
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self::with_sections(store, default_sections(), MAX_ENTRIES_PER_SECTION)
    }

    pub fn with_sections(
        store: Arc<dyn OptionStore>,
        sections: Vec<SectionDef>,
        max_entries: usize,
    ) -> Self {
        Self {
            store,
            sections: sections.into(),
            max_entries,
        }
    }

    pub fn sections(&self) -> &[SectionDef] {
        &self.sections
    }

    /// Returns the full document, writing the empty template on first access.
    pub async fn read(&self) -> Result<String, MemoryError> {
        if let Some(Value::String(doc)) = self.store.get_option(MEMORY_KEY).await? {
            return Ok(doc);
        }

        let template = MemoryDocument::template(&self.sections);
        self.replace(&template).await?;
        info!("Initialized empty memory document");
        Ok(template)
    }

    /// Body of one section; empty for an unknown key or an empty section.
    pub async fn read_section(&self, key: &str) -> Result<String, MemoryError> {
        let Some(def) = self.section(key) else {
            return Ok(String::new());
        };
        let doc = MemoryDocument::parse(&self.read().await?);
        Ok(doc.body(def).unwrap_or_default().to_string())
    }

    pub async fn replace(&self, document: &str) -> Result<(), MemoryError> {
        self.store
            .set_option(MEMORY_KEY, Value::String(document.to_string()))
            .await?;
        self.store
            .set_option(UPDATED_AT_KEY, Value::String(Utc::now().to_rfc3339()))
            .await?;
        Ok(())
    }

    /// Appends `- [YYYY-MM-DD] text` to a section, evicting the oldest entries past the limit.
    pub async fn append_entry(&self, key: &str, text: &str) -> Result<(), MemoryError> {
        let def = self
            .section(key)
            .ok_or_else(|| MemoryError::UnknownSection(key.to_string()))?;

        let doc = MemoryDocument::parse(&self.read().await?);
        let entry = format_entry(Utc::now().date_naive(), text);
        let updated = doc.render_with_entry(&self.sections, def, &entry, self.max_entries);
        self.replace(&updated).await
    }

    /// Time of the last mutation, if the document was ever written.
    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>, MemoryError> {
        let value = self.store.get_option(UPDATED_AT_KEY).await?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Removes the document entirely. Only used on uninstall.
    pub async fn purge(&self) -> Result<(), MemoryError> {
        self.store.delete_option(MEMORY_KEY).await?;
        self.store.delete_option(UPDATED_AT_KEY).await?;
        Ok(())
    }

    fn section(&self, key: &str) -> Option<&SectionDef> {
        self.sections.iter().find(|d| d.key == key)
    }
}
