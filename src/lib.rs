//! Notes, concept maps, spaced-repetition flashcards and a gratitude journal,
//! persisted as JSON blobs in a local directory or on a WebDAV server.

pub mod auth;
pub mod concept_map;
pub mod config;
pub mod flashcards;
pub mod gratitude;
pub mod keywords;
pub mod notes;
pub mod ocr;
pub mod storage;
pub mod streaks;
