use chrono::NaiveDate;

/// Title line written at the top of every serialized document.
pub const DOCUMENT_TITLE: &str = "# Memory";
const HEADING_MARKER: &str = "## ";
const BULLET_MARKER: &str = "- ";

/// A fixed section: stable key used by callers, heading title used in the markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDef {
    pub key: String,
    pub title: String,
}

impl SectionDef {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    title: String,
    body: String,
}

/// A memory document split into its `## ` sections.
///
/// Text before the first heading is not kept. Each body runs to the next
/// heading or the end of the document and is stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    sections: Vec<Section>,
}

impl MemoryDocument {
    pub fn parse(text: &str) -> Self {
        let mut sections = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some(title) = line.strip_prefix(HEADING_MARKER) {
                if let Some((title, body)) = current.take() {
                    sections.push(Section {
                        title,
                        body: body.join("\n").trim().to_string(),
                    });
                }
                current = Some((title.trim().to_string(), Vec::new()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }
        if let Some((title, body)) = current {
            sections.push(Section {
                title,
                body: body.join("\n").trim().to_string(),
            });
        }

        Self { sections }
    }

    /// The empty document for a section set.
    pub fn template(defs: &[SectionDef]) -> String {
        render(defs.iter().map(|d| (d.title.as_str(), "")))
    }

    /// Body of a fixed section, or `None` if the document has no such heading.
    pub fn body(&self, def: &SectionDef) -> Option<&str> {
        self.find(def).map(|s| s.body.as_str())
    }

    /// True when any section, fixed or not, has a non-empty body.
    pub fn has_content(&self) -> bool {
        self.sections.iter().any(|s| !s.body.is_empty())
    }

    /// Bullet entries of a fixed section, oldest first.
    pub fn entries(&self, def: &SectionDef) -> Vec<String> {
        self.body(def)
            .map(|body| {
                body.lines()
                    .map(str::trim)
                    .filter(|line| line.starts_with(BULLET_MARKER))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serializes the document with one entry appended to `target`.
    ///
    /// The target section keeps only its bullet lines, capped at `max_entries`
    /// by dropping the oldest. Other fixed sections keep their bodies. Fixed
    /// sections come first in `defs` order, then any other sections verbatim.
    pub fn render_with_entry(
        &self,
        defs: &[SectionDef],
        target: &SectionDef,
        entry: &str,
        max_entries: usize,
    ) -> String {
        let mut entries = self.entries(target);
        entries.push(entry.to_string());
        let overflow = entries.len().saturating_sub(max_entries);
        let target_body = entries[overflow..].join("\n");

        let fixed = defs.iter().map(|def| {
            let body = if def == target {
                target_body.clone()
            } else {
                self.body(def).unwrap_or_default().to_string()
            };
            (def.title.clone(), body)
        });

        let extra = self
            .sections
            .iter()
            .filter(|s| !defs.iter().any(|d| titles_match(&d.title, &s.title)))
            .map(|s| (s.title.clone(), s.body.clone()));

        let all: Vec<(String, String)> = fixed.chain(extra).collect();
        render(all.iter().map(|(t, b)| (t.as_str(), b.as_str())))
    }

    fn find(&self, def: &SectionDef) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| titles_match(&def.title, &s.title))
    }
}

/// Formats one dated bullet. Line breaks in `text` are folded into spaces.
pub fn format_entry(date: NaiveDate, text: &str) -> String {
    let text = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{BULLET_MARKER}[{}] {text}", date.format("%Y-%m-%d"))
}

fn titles_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn render<'a>(sections: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut parts = vec![DOCUMENT_TITLE.to_string()];
    for (title, body) in sections {
        if body.is_empty() {
            parts.push(format!("{HEADING_MARKER}{title}"));
        } else {
            parts.push(format!("{HEADING_MARKER}{title}\n\n{body}"));
        }
    }
    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{default_sections, COMMENTARY_LOG, NOTES, RECENT_ACTIVITY};

    fn def(key: &str) -> SectionDef {
        default_sections()
            .into_iter()
            .find(|d| d.key == key)
            .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_template_lists_sections_in_order() {
        let template = MemoryDocument::template(&default_sections());
        assert_eq!(
            template,
            "# Memory\n\n## Recent Activity\n\n## Ongoing Topics\n\n## Commentary Log\n\n## Notes\n"
        );
        assert!(!MemoryDocument::parse(&template).has_content());
    }

    #[test]
    fn test_preamble_is_discarded_and_bodies_trimmed() {
        let doc = MemoryDocument::parse("stray intro\n## Notes\n\n  keep this  \n\n");
        assert_eq!(doc.body(&def(NOTES)), Some("keep this"));
        assert_eq!(doc.body(&def(RECENT_ACTIVITY)), None);
    }

    #[test]
    fn test_format_entry_folds_newlines() {
        assert_eq!(
            format_entry(date(), "first line\n\n  second line "),
            "- [2024-03-09] first line second line"
        );
    }

    #[test]
    fn test_append_discards_non_bullet_text_in_target_only() {
        let text = "# Memory\n\n## Recent Activity\n\n\
                    some prose\n- [2024-01-01] old\n\n## Notes\n\nfree-form note";
        let doc = MemoryDocument::parse(text);
        let out = doc.render_with_entry(
            &default_sections(),
            &def(RECENT_ACTIVITY),
            "- [2024-03-09] new",
            20,
        );
        assert!(!out.contains("some prose"), "Prose in target section is dropped");
        assert!(out.contains("- [2024-01-01] old\n- [2024-03-09] new"));
        assert!(out.contains("## Notes\n\nfree-form note"), "Other sections untouched");
    }

    #[test]
    fn test_append_keeps_custom_sections_after_fixed_ones() {
        let text = "## Scratchpad\n\nideas\n\n## Notes\n\nn";
        let doc = MemoryDocument::parse(text);
        let out = doc.render_with_entry(&default_sections(), &def(COMMENTARY_LOG), "- x", 20);
        let notes_at = out.find("## Notes").unwrap();
        let scratch_at = out.find("## Scratchpad\n\nideas").unwrap();
        assert!(scratch_at > notes_at, "Custom section must follow the fixed ones");
    }

    #[test]
    fn test_append_drops_oldest_beyond_limit() {
        let mut text = MemoryDocument::template(&default_sections());
        for i in 1..=5 {
            let doc = MemoryDocument::parse(&text);
            text = doc.render_with_entry(&default_sections(), &def(NOTES), &format!("- {i}"), 3);
        }
        let entries = MemoryDocument::parse(&text).entries(&def(NOTES));
        assert_eq!(entries, vec!["- 3", "- 4", "- 5"]);
    }

    #[test]
    fn test_heading_match_is_case_insensitive() {
        let doc = MemoryDocument::parse("## recent activity\n- [2024-01-01] a");
        assert_eq!(doc.entries(&def(RECENT_ACTIVITY)).len(), 1);
    }
}
