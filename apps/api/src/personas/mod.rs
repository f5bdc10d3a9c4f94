//! Persona Registry: CRUD over persona records, id generation, and the
//! one-shot upgrade from the legacy single-persona setting.

pub mod handlers;
pub mod migration;
pub mod registry;
pub mod store;

pub use migration::migrate_legacy_persona;
pub use registry::{generate_id, PersonaError, PersonaInput, PersonaRegistry, ProviderAllowList};
pub use store::PersonaStore;
