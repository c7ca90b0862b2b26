//! Document title sanitizing, page numbering and conflict-free targets.

mod decision;
mod resolver;
mod sanitizer;

pub use decision::NamingDecision;
pub use resolver::{ConflictResolver, MAX_CONFLICT_ATTEMPTS};
pub use sanitizer::{sanitize_title, FALLBACK_TITLE, MAX_TITLE_BYTES, MAX_TITLE_CHARS};
