//! Data models for notes

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default value for `created_at` when deserializing notes that lack the field
fn default_created_at() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// A free-text note with the keywords the user confirmed for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Confirmed keywords, unique and in insertion order.
    /// These are the join keys the concept map uses.
    #[serde(default, alias = "keywords")]
    pub user_keywords: Vec<String>,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content: String::new(),
            user_keywords: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Builder method to add content
    pub fn with_content(mut self, content: String) -> Self {
        self.content = content;
        self
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.user_keywords.iter().any(|k| k == keyword)
    }

    /// Add a confirmed keyword. Matching is exact and case-sensitive.
    ///
    /// Returns `false` if the keyword was already present.
    pub fn add_user_keyword(&mut self, keyword: &str) -> bool {
        if self.has_keyword(keyword) {
            return false;
        }
        self.user_keywords.push(keyword.to_string());
        true
    }

    /// Drop duplicate keywords, keeping the first occurrence of each.
    ///
    /// Returns the number of entries removed.
    pub fn dedup_keywords(&mut self) -> usize {
        let before = self.user_keywords.len();
        let mut seen = HashSet::new();
        self.user_keywords.retain(|k| seen.insert(k.clone()));
        before - self.user_keywords.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keyword_is_case_sensitive_and_unique() {
        let mut note = Note::new("n".to_string());
        assert!(note.add_user_keyword("Rust"));
        assert!(!note.add_user_keyword("Rust"));
        assert!(note.add_user_keyword("rust"));
        assert_eq!(note.user_keywords, vec!["Rust", "rust"]);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut note = Note::new("n".to_string());
        note.user_keywords = vec!["a".into(), "b".into(), "a".into(), "c".into(), "b".into()];
        assert_eq!(note.dedup_keywords(), 2);
        assert_eq!(note.user_keywords, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_deserialize_legacy_keywords_field() {
        let note: Note = serde_json::from_str(r#"{"id":"1","title":"t","keywords":["x"]}"#).unwrap();
        assert_eq!(note.user_keywords, vec!["x"]);
        assert_eq!(note.content, "");
        assert_eq!(note.created_at, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_serialize_camel_case() {
        let note = Note::new("t".to_string());
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("userKeywords").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
