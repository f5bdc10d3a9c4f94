//! Commenter: prompt assembly, generation and posting of persona comments.

pub mod commenter;
pub mod handlers;
pub mod prompts;

pub use commenter::{CommentError, CommentResult, Commenter};
