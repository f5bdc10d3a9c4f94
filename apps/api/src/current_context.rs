//! Read-only composite used to prime generation outside the comment pipeline.

use serde::Serialize;

use crate::host::ContentHost;
use crate::memory::MemoryLog;
use crate::models::SiteInfo;
use crate::personas::PersonaStore;

#[derive(Debug, Clone, Serialize)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentContext {
    pub site: SiteInfo,
    pub personas: Vec<PersonaSummary>,
    pub memory: String,
}

impl CurrentContext {
    pub async fn load(
        host: &dyn ContentHost,
        personas: &PersonaStore,
        memory: &MemoryLog,
    ) -> anyhow::Result<Self> {
        let site = host.site_info().await?;
        let personas = personas
            .list()
            .await?
            .into_iter()
            .map(|p| PersonaSummary {
                id: p.id,
                name: p.name,
                definition: p.definition,
            })
            .collect();
        let memory = memory.read().await?;

        Ok(Self {
            site,
            personas,
            memory,
        })
    }

    /// Markdown rendering for use as a system-instruction preamble.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Site: {}\n", self.site.name);
        if !self.site.description.is_empty() {
            out.push_str(&format!("\n{}\n", self.site.description));
        }
        out.push_str(&format!("\nURL: {}\n", self.site.url));

        if !self.personas.is_empty() {
            out.push_str("\n# Personas\n");
            for p in &self.personas {
                out.push_str(&format!("\n## {} ({})\n\n{}\n", p.name, p.id, p.definition));
            }
        }

        out.push('\n');
        out.push_str(self.memory.trim_end());
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NOTES;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn test_composite_carries_site_personas_and_memory() {
        let h = Harness::new();
        h.persona("Critic").await;
        h.memory.append_entry(NOTES, "Keep it kind").await.unwrap();

        let ctx = CurrentContext::load(&*h.host, &h.personas, &h.memory)
            .await
            .unwrap();

        assert_eq!(ctx.site.name, "Test Site");
        assert_eq!(ctx.personas.len(), 1);
        assert_eq!(ctx.personas[0].id, "critic");
        assert_eq!(ctx.personas[0].definition, "You are a sharp critic.");
        assert!(ctx.memory.contains("Keep it kind"));

        let md = ctx.to_markdown();
        assert!(md.starts_with("# Site: Test Site\n\nJust another site\n"));
        assert!(md.contains("## Critic (critic)\n\nYou are a sharp critic."));
        assert!(md.contains("# Memory"));
    }
}
