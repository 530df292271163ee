//! Concept maps built from note keywords
//!
//! This module provides:
//! - Map, node and edge models in the renderer's JSON shape
//! - Keyword promotion and node-to-note lookup
//! - Edge labelling and cascading node deletion
//! - Debounced autosave with a save-status indicator

pub mod autosave;
pub mod graph;
mod models;

pub use autosave::{AutosaveSettings, Autosaver, MapWriter, SaveStatus};
pub use graph::{
    add_text_node, connect, delete_edge, delete_node, find_note_for_label, find_note_for_node,
    promote_keywords, prune_dangling, set_edge_label, update_node_text, NodeLookup,
};
pub use models::*;
