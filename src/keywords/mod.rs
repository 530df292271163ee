//! Keyword extraction for notes
//!
//! Candidates are derived from note content on every read and are never
//! written back; only the user's confirmed `userKeywords` are persisted.

mod extractor;

pub use extractor::{collect_user_keywords, extract_keywords, DEFAULT_LIMIT, STOP_WORDS};
