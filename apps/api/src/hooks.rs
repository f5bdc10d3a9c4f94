//! Extension points, each a list of handlers invoked in registration order.
//!
//! - strategy provider: gets `&mut Vec<Strategy>` seeded with the default.
//!   May append, edit or remove. Later providers see earlier edits.
//! - query customizer: gets `&mut PostQuery`, the chosen strategy and the
//!   persona. May change any field. The duplicate-comment exclusion is applied
//!   after all of them.
//! - context enricher: gets `&mut SelectionContext`, the post and the persona.
//!   May push notes or override the hint. Last write wins.
//! - safety gate: gets a [`SafetyCheck`] and returns a [`GateDecision`]. The
//!   first `Block` stops evaluation.

use std::sync::Arc;

use crate::models::{Identity, Persona, Post, PostQuery};
use crate::selection::{SelectionContext, Strategy};

pub type StrategyProvider = Arc<dyn Fn(&mut Vec<Strategy>) + Send + Sync>;
pub type QueryCustomizer = Arc<dyn Fn(&mut PostQuery, &Strategy, &Persona) + Send + Sync>;
pub type ContextEnricher = Arc<dyn Fn(&mut SelectionContext, &Post, &Persona) + Send + Sync>;
pub type SafetyGate = Arc<dyn Fn(&SafetyCheck<'_>) -> GateDecision + Send + Sync>;

/// Everything a safety gate may inspect before a comment is generated.
#[derive(Debug, Clone, Copy)]
pub struct SafetyCheck<'a> {
    pub persona: &'a Persona,
    pub post: &'a Post,
    pub author: &'a Identity,
    pub parent_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Block(String),
}

#[derive(Clone, Default)]
pub struct Hooks {
    strategy_providers: Vec<StrategyProvider>,
    query_customizers: Vec<QueryCustomizer>,
    context_enrichers: Vec<ContextEnricher>,
    safety_gates: Vec<SafetyGate>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_strategy_provider(
        &mut self,
        provider: impl Fn(&mut Vec<Strategy>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.strategy_providers.push(Arc::new(provider));
        self
    }

    pub fn register_query_customizer(
        &mut self,
        customizer: impl Fn(&mut PostQuery, &Strategy, &Persona) + Send + Sync + 'static,
    ) -> &mut Self {
        self.query_customizers.push(Arc::new(customizer));
        self
    }

    pub fn register_context_enricher(
        &mut self,
        enricher: impl Fn(&mut SelectionContext, &Post, &Persona) + Send + Sync + 'static,
    ) -> &mut Self {
        self.context_enrichers.push(Arc::new(enricher));
        self
    }

    pub fn register_safety_gate(
        &mut self,
        gate: impl Fn(&SafetyCheck<'_>) -> GateDecision + Send + Sync + 'static,
    ) -> &mut Self {
        self.safety_gates.push(Arc::new(gate));
        self
    }

    pub fn strategies(&self, default: Strategy) -> Vec<Strategy> {
        let mut strategies = vec![default];
        for provider in &self.strategy_providers {
            provider(&mut strategies);
        }
        strategies
    }

    pub fn customize_query(&self, query: &mut PostQuery, strategy: &Strategy, persona: &Persona) {
        for customizer in &self.query_customizers {
            customizer(query, strategy, persona);
        }
    }

    pub fn enrich_context(&self, context: &mut SelectionContext, post: &Post, persona: &Persona) {
        for enricher in &self.context_enrichers {
            enricher(context, post, persona);
        }
    }

    pub fn check_safety(&self, check: &SafetyCheck<'_>) -> GateDecision {
        self.safety_gates
            .iter()
            .map(|gate| gate(check))
            .find(|decision| matches!(decision, GateDecision::Block(_)))
            .unwrap_or(GateDecision::Allow)
    }
}

/// Safety gate that vetoes any comment on the listed post ids.
pub fn post_blocklist(
    blocked: Vec<i64>,
) -> impl Fn(&SafetyCheck<'_>) -> GateDecision + Send + Sync {
    move |check: &SafetyCheck<'_>| {
        if blocked.contains(&check.post.id) {
            GateDecision::Block(format!("post {} is on the block list", check.post.id))
        } else {
            GateDecision::Allow
        }
    }
}
