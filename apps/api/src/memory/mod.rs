//! Memory Log: one shared markdown document, partitioned into a fixed,
//! ordered set of sections, each holding a bounded list of dated bullets.
//!
//! Every mutation is a full read-modify-write of the document under one
//! option key. Two personas appending at the same instant can lose an
//! update (last write wins); nothing here fences that.

pub mod document;
pub mod handlers;
pub mod log;

pub use document::{MemoryDocument, SectionDef};
pub use log::{MemoryError, MemoryLog};

/// Oldest entries beyond this count are dropped on append.
pub const MAX_ENTRIES_PER_SECTION: usize = 20;

pub const RECENT_ACTIVITY: &str = "recent_activity";
pub const ONGOING_TOPICS: &str = "ongoing_topics";
pub const COMMENTARY_LOG: &str = "commentary_log";
pub const NOTES: &str = "notes";

/// The standard section set, in document order.
pub fn default_sections() -> Vec<SectionDef> {
    vec![
        SectionDef::new(RECENT_ACTIVITY, "Recent Activity"),
        SectionDef::new(ONGOING_TOPICS, "Ongoing Topics"),
        SectionDef::new(COMMENTARY_LOG, "Commentary Log"),
        SectionDef::new(NOTES, "Notes"),
    ]
}
