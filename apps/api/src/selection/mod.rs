//! Strategy Selector: picks the next post a persona should comment on.
//!
//! Flow: strategies (default + providers) → weighted pick → query from the
//! strategy's spec → query customizers → duplicate-comment exclusion (sealed,
//! always last) → host query → selection context → context enrichers.

pub mod exclusion;
pub mod selector;
pub mod strategy;

pub use exclusion::SealedPostQuery;
pub use selector::{Selection, StrategySelector};
pub use strategy::{SelectionContext, SelectionSpec, Strategy};
