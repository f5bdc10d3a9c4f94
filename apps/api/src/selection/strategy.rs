use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PostOrder, PostQuery};

/// Id used for the context of a comment requested directly, without a selector pass.
pub const DIRECT_STRATEGY_ID: &str = "direct";

/// A named, weighted policy for choosing the next post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub label: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
    #[serde(default)]
    pub selection_spec: SelectionSpec,
    /// Told to the model as the reason this post was picked.
    #[serde(default)]
    pub hint: String,
}

fn default_weight() -> i64 {
    1
}

/// Filter/sort parameters translated into a host post query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSpec {
    /// Only posts published within this many days.
    pub within_days: Option<i64>,
    pub category: Option<String>,
    #[serde(default)]
    pub order: PostOrder,
}

impl Strategy {
    /// Built-in strategy: a random post from the last 30 days.
    pub fn default_strategy() -> Self {
        Self {
            id: "random_recent".to_string(),
            label: "Random recent post".to_string(),
            weight: 1,
            selection_spec: SelectionSpec {
                within_days: Some(30),
                category: None,
                order: PostOrder::Random,
            },
            hint: "Picked at random from posts published in the last 30 days.".to_string(),
        }
    }

    /// Weight used for probability; anything below 1 counts as 1.
    pub fn effective_weight(&self) -> u64 {
        self.weight.max(1) as u64
    }

    /// Base query for this strategy: published articles, one result.
    pub fn to_query(&self) -> PostQuery {
        PostQuery {
            published_after: self
                .selection_spec
                .within_days
                .map(|days| Utc::now() - Duration::days(days)),
            category: self.selection_spec.category.clone(),
            order: self.selection_spec.order,
            ..PostQuery::default()
        }
    }
}

/// Why a post was chosen. Ephemeral; folded into the prompt and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionContext {
    #[serde(default)]
    pub strategy_id: String,
    #[serde(default)]
    pub strategy_hint: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl SelectionContext {
    pub fn new(strategy_id: impl Into<String>, strategy_hint: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            strategy_hint: strategy_hint.into(),
            notes: Vec::new(),
        }
    }

    /// A context carrying nothing, e.g. `{}` from a direct caller.
    pub fn is_empty(&self) -> bool {
        self.strategy_id.is_empty() && self.strategy_hint.is_empty() && self.notes.is_empty()
    }
}

/// Picks the first strategy whose cumulative weight reaches `draw`.
///
/// `draw` is expected in `1..=total_weight`; a larger draw yields the last strategy.
pub fn pick_weighted(strategies: &[Strategy], draw: u64) -> Option<&Strategy> {
    let mut cumulative = 0u64;
    for strategy in strategies {
        cumulative = cumulative.saturating_add(strategy.effective_weight());
        if cumulative >= draw {
            return Some(strategy);
        }
    }
    strategies.last()
}

pub fn total_weight(strategies: &[Strategy]) -> u64 {
    strategies
        .iter()
        .map(Strategy::effective_weight)
        .fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{content::ARTICLE_TYPE, PostStatus};

    fn strategy(id: &str, weight: i64) -> Strategy {
        Strategy {
            id: id.to_string(),
            label: id.to_string(),
            weight,
            selection_spec: SelectionSpec::default(),
            hint: String::new(),
        }
    }

    #[test]
    fn test_non_positive_weight_counts_as_one() {
        assert_eq!(strategy("a", 0).effective_weight(), 1);
        assert_eq!(strategy("b", -5).effective_weight(), 1);
        assert_eq!(strategy("c", 7).effective_weight(), 7);
    }

    #[test]
    fn test_pick_weighted_walks_cumulative_weight() {
        let strategies = vec![strategy("a", 2), strategy("b", 0), strategy("c", 3)];
        assert_eq!(total_weight(&strategies), 6);
        assert_eq!(pick_weighted(&strategies, 1).unwrap().id, "a");
        assert_eq!(pick_weighted(&strategies, 2).unwrap().id, "a");
        assert_eq!(pick_weighted(&strategies, 3).unwrap().id, "b", "Zero weight still reachable");
        assert_eq!(pick_weighted(&strategies, 4).unwrap().id, "c");
        assert_eq!(pick_weighted(&strategies, 6).unwrap().id, "c");
    }

    #[test]
    fn test_huge_weights_saturate_instead_of_overflowing() {
        let strategies = vec![strategy("a", i64::MAX), strategy("b", i64::MAX), strategy("c", 5)];
        assert_eq!(total_weight(&strategies), u64::MAX);
        assert_eq!(pick_weighted(&strategies, 1).unwrap().id, "a");
        assert_eq!(pick_weighted(&strategies, u64::MAX - 1).unwrap().id, "b");
        assert_eq!(pick_weighted(&strategies, u64::MAX).unwrap().id, "c");
    }

    #[test]
    fn test_pick_weighted_empty() {
        assert!(pick_weighted(&[], 1).is_none());
    }

    #[test]
    fn test_default_strategy_query_forces_published_single_article() {
        let query = Strategy::default_strategy().to_query();
        assert_eq!(query.post_type, ARTICLE_TYPE);
        assert_eq!(query.status, PostStatus::Publish);
        assert_eq!(query.limit, 1);
        assert_eq!(query.order, PostOrder::Random);
        assert!(query.published_after.is_some());
        assert!(query.exclude.is_empty());
    }

    #[test]
    fn test_empty_context_detection() {
        let ctx: SelectionContext = serde_json::from_str("{}").unwrap();
        assert!(ctx.is_empty());
        assert!(!SelectionContext::new("direct", "").is_empty());
    }
}
