use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::hooks::Hooks;
use crate::host::ContentHost;
use crate::models::{Persona, Post};
use crate::selection::exclusion::exclude_commented;
use crate::selection::strategy::{pick_weighted, total_weight, SelectionContext, Strategy};

/// A chosen post and the reason it was chosen.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub content_id: i64,
    pub context: SelectionContext,
}

/// Stateless selector over host content. Safe to share across concurrent persona cycles.
#[derive(Clone)]
pub struct StrategySelector {
    host: Arc<dyn ContentHost>,
    hooks: Arc<Hooks>,
    default_strategy: Strategy,
}

impl StrategySelector {
    pub fn new(host: Arc<dyn ContentHost>, hooks: Arc<Hooks>) -> Self {
        Self::with_default_strategy(host, hooks, Strategy::default_strategy())
    }

    pub fn with_default_strategy(
        host: Arc<dyn ContentHost>,
        hooks: Arc<Hooks>,
        default_strategy: Strategy,
    ) -> Self {
        Self {
            host,
            hooks,
            default_strategy,
        }
    }

    /// The current strategy set: the default plus whatever providers contribute.
    pub fn strategies(&self) -> Vec<Strategy> {
        self.hooks.strategies(self.default_strategy.clone())
    }

    /// Chooses one eligible post for `persona`.
    ///
    /// `Ok(None)` means nothing to comment on: no strategies, an unknown
    /// `strategy_id`, or an empty query result. None of these are errors.
    pub async fn select(
        &self,
        persona: &Persona,
        strategy_id: Option<&str>,
    ) -> anyhow::Result<Option<Selection>> {
        let strategies = self.strategies();
        let Some(strategy) = choose_strategy(&strategies, strategy_id) else {
            return Ok(None);
        };
        debug!("Persona {} using strategy {}", persona.id, strategy.id);

        let mut query = strategy.to_query();
        self.hooks.customize_query(&mut query, strategy, persona);
        let sealed = exclude_commented(self.host.as_ref(), query, persona).await?;

        let Some(post) = self.host.query_posts(&sealed).await?.into_iter().next() else {
            return Ok(None);
        };

        let context = self.build_context(
            SelectionContext::new(strategy.id.clone(), strategy.hint.clone()),
            &post,
            persona,
        );
        Ok(Some(Selection {
            content_id: post.id,
            context,
        }))
    }

    /// Runs the context enrichers over `base`. Shared by selector-driven and direct comments.
    pub fn build_context(
        &self,
        mut base: SelectionContext,
        post: &Post,
        persona: &Persona,
    ) -> SelectionContext {
        self.hooks.enrich_context(&mut base, post, persona);
        base
    }
}

fn choose_strategy<'a>(
    strategies: &'a [Strategy],
    strategy_id: Option<&str>,
) -> Option<&'a Strategy> {
    if strategies.is_empty() {
        return None;
    }
    match strategy_id {
        Some(id) => strategies.iter().find(|s| s.id == id),
        None => {
            let draw = rand::rng().random_range(1..=total_weight(strategies));
            pick_weighted(strategies, draw)
        }
    }
}
