use crate::host::ContentHost;
use crate::models::{Persona, PostQuery};

/// A post query that has passed the duplicate-comment exclusion.
///
/// The field is private and [`exclude_commented`] is the only constructor,
/// so every query a host runs for the selector carries the exclusion, no
/// matter what the customizers did before it.
#[derive(Debug, Clone)]
pub struct SealedPostQuery(PostQuery);

impl SealedPostQuery {
    pub fn query(&self) -> &PostQuery {
        &self.0
    }
}

/// Final selection stage: excludes every post the persona's bound identity
/// has already commented on.
///
/// Keyed by identity, not persona: two personas sharing one identity share
/// one exclusion set.
pub async fn exclude_commented(
    host: &dyn ContentHost,
    mut query: PostQuery,
    persona: &Persona,
) -> anyhow::Result<SealedPostQuery> {
    let commented = host.commented_post_ids(persona.author_identity).await?;
    for id in commented {
        if !query.exclude.contains(&id) {
            query.exclude.push(id);
        }
    }
    Ok(SealedPostQuery(query))
}
