//! Flashcard and spaced repetition system
//!
//! This module provides:
//! - Flashcard model and card list operations
//! - The review transition (binary SM-2 variant with manual override)
//! - Review sessions: due queue, session-scoped reviewed set, completion

pub mod algorithm;
mod deck;
pub mod models;
pub mod session;

pub use algorithm::{format_interval, parse_override, review, DEFAULT_PRESETS};
pub use deck::{add_card, all_tags, delete_card, find_card, parse_tags, TagInput};
pub use models::*;
pub use session::{ReviewOutcome, ReviewSession};
