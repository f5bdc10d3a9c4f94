pub mod content;
pub mod persona;

pub use content::{Comment, Identity, NewComment, Post, PostOrder, PostQuery, PostStatus, SiteInfo};
pub use persona::{CronFrequency, Persona};
