//! Validation of persisted blobs
//!
//! Whatever shape a blob has on disk, the rest of the crate only sees the
//! canonical records. Non-conforming data is replaced by an empty or
//! default value and a warning is logged; it never becomes an error.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::concept_map::{prune_dangling, ConceptMap, Edge, Node};
use crate::flashcards::Flashcard;
use crate::notes::Note;
use crate::streaks::StreakRecord;

fn parse_json(name: &str, bytes: &[u8]) -> Option<Value> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("store: {} is not valid JSON, using default: {}", name, e);
            None
        }
    }
}

/// Decode each element of an array on its own, skipping the bad ones
fn decode_elements<T: DeserializeOwned>(name: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("store: dropping malformed record {} in {}: {}", i, name, e);
                None
            }
        })
        .collect()
}

/// Decode a list blob. A single object is accepted as a one-element list.
pub fn decode_list<T: DeserializeOwned>(name: &str, bytes: Option<&[u8]>) -> Vec<T> {
    let Some(value) = bytes.and_then(|b| parse_json(name, b)) else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => decode_elements(name, items),
        Value::Object(_) => {
            log::warn!("store: {} holds a single object, wrapping it in a list", name);
            decode_elements(name, vec![value])
        }
        Value::Null => Vec::new(),
        other => {
            log::warn!("store: {} is not a list ({}), using []", name, kind(&other));
            Vec::new()
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn decode_notes(bytes: Option<&[u8]>) -> Vec<Note> {
    let mut notes: Vec<Note> = decode_list("notes.json", bytes);
    for note in &mut notes {
        let removed = note.dedup_keywords();
        if removed > 0 {
            log::warn!(
                "store: note {} had {} duplicate keyword(s), dropped",
                note.id,
                removed
            );
        }
    }
    notes
}

pub fn decode_flashcards(bytes: Option<&[u8]>) -> Vec<Flashcard> {
    let mut cards: Vec<Flashcard> = decode_list("flashcards.json", bytes);
    for card in &mut cards {
        if card.enforce_floors() {
            log::warn!(
                "store: card {} had scheduling values below the floor, raised",
                card.id
            );
        }
    }
    cards
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn collect_date(record: &mut StreakRecord, raw: &str, source: &str) {
    match parse_date(raw) {
        Some(date) => {
            record.history.insert(date);
        }
        None => log::warn!("store: ignoring unparseable streak date '{}' in {}", raw, source),
    }
}

/// Decode the review streak from any of its encodings.
///
/// Accepted forms:
/// - `{"history": ["2025-01-01", ...]}`
/// - `{"lastDate": "...", "count": n, "history": [...]}`
/// - `{"reviewStreakCount": n, "lastReviewDate": "..."}`
/// - `{"2025-01-01": true, ...}`
pub fn decode_streak(bytes: Option<&[u8]>) -> StreakRecord {
    let name = "reviewStreak.json";
    let mut record = StreakRecord::default();
    let Some(value) = bytes.and_then(|b| parse_json(name, b)) else {
        return record;
    };
    let Value::Object(fields) = value else {
        log::warn!("store: {} is not an object, starting a new streak", name);
        return record;
    };

    let structured = ["history", "lastDate", "count", "lastReviewDate", "reviewStreakCount"]
        .iter()
        .any(|k| fields.contains_key(*k));

    if structured {
        match fields.get("history") {
            Some(Value::Array(days)) => {
                for day in days {
                    match day.as_str() {
                        Some(raw) => collect_date(&mut record, raw, name),
                        None => log::warn!("store: ignoring non-string streak entry in {}", name),
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => log::warn!("store: streak history is a {}, ignored", kind(other)),
        }
        for key in ["lastDate", "lastReviewDate"] {
            if let Some(raw) = fields.get(key).and_then(Value::as_str) {
                collect_date(&mut record, raw, name);
            }
        }
    } else {
        for (key, marked) in &fields {
            if marked.as_bool() == Some(true) {
                collect_date(&mut record, key, name);
            }
        }
    }
    record
}

/// Decode a concept map blob stored under `id`.
///
/// Broken nodes or edges are dropped one by one, duplicate node ids keep
/// their first occurrence, edges are pruned to existing endpoints and the
/// two edge label fields are reconciled.
pub fn decode_map(id: &str, bytes: Option<&[u8]>) -> ConceptMap {
    let name = format!("map {}", id);
    let mut map = ConceptMap {
        id: id.to_string(),
        title: String::new(),
        nodes: Vec::new(),
        edges: Vec::new(),
        created_at: None,
    };
    let Some(value) = bytes.and_then(|b| parse_json(&name, b)) else {
        return map;
    };
    let Value::Object(mut fields) = value else {
        log::warn!("store: {} is not an object, using an empty map", name);
        return map;
    };

    if let Some(title) = fields.get("title").and_then(Value::as_str) {
        map.title = title.to_string();
    }
    map.created_at = fields
        .get("createdAt")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());

    let nodes = match fields.remove("nodes") {
        Some(Value::Array(items)) => decode_elements::<Node>(&name, items),
        _ => Vec::new(),
    };
    let mut seen = HashSet::new();
    for node in nodes {
        if seen.insert(node.id.clone()) {
            map.nodes.push(node);
        } else {
            log::warn!("store: {} repeats node id {}, dropped", name, node.id);
        }
    }

    map.edges = match fields.remove("edges") {
        Some(Value::Array(items)) => decode_elements::<Edge>(&name, items),
        _ => Vec::new(),
    };
    for edge in &mut map.edges {
        // Older renderers only wrote the top-level label
        let label = if edge.data.label.is_empty() {
            edge.label.clone()
        } else {
            edge.data.label.clone()
        };
        edge.set_label(&label);
    }

    let pruned = prune_dangling(&mut map);
    if pruned > 0 {
        log::warn!("store: {} had {} dangling edge(s), removed", name, pruned);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(json: &str) -> Option<&[u8]> {
        Some(json.as_bytes())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lists_default_and_skip_bad_records() {
        assert!(decode_notes(None).is_empty());
        assert!(decode_notes(some("not json")).is_empty());
        assert!(decode_notes(some("42")).is_empty());

        let notes = decode_notes(some(
            r#"[{"id":"n1","title":"ok","userKeywords":["a","a","b"]},{"title":"no id"}]"#,
        ));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_keywords, vec!["a", "b"]);

        let single = decode_notes(some(r#"{"id":"n2","title":"lonely"}"#));
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].content, "");
    }

    #[test]
    fn test_flashcards_floored_on_load() {
        let cards = decode_flashcards(some(
            r#"[{"id":"c1","question":"q","answer":"a","easeFactor":0.5,"intervalDays":0}]"#,
        ));
        assert_eq!(cards[0].ease_factor, 1.3);
        assert_eq!(cards[0].interval_days, 1);
    }

    #[test]
    fn test_streak_encodings() {
        let canonical = decode_streak(some(r#"{"history":["2025-01-01","2025-01-02"]}"#));
        assert_eq!(canonical.history.len(), 2);

        let legacy = decode_streak(some(
            r#"{"lastDate":"2025-01-03","count":3,"history":["2025-01-01","2025-01-02"]}"#,
        ));
        assert!(legacy.contains(date(2025, 1, 3)));
        assert_eq!(legacy.history.len(), 3);

        let map = decode_streak(some(r#"{"2025-02-01":true,"2025-02-02":true,"oops":true,"2025-02-03":false}"#));
        assert_eq!(
            map.history.iter().copied().collect::<Vec<_>>(),
            vec![date(2025, 2, 1), date(2025, 2, 2)]
        );

        let counter = decode_streak(some(r#"{"reviewStreakCount":0,"lastReviewDate":null}"#));
        assert!(counter.is_empty());

        assert!(decode_streak(some("[1,2]")).is_empty());
        assert!(decode_streak(None).is_empty());
    }

    #[test]
    fn test_map_normalisation() {
        let map = decode_map(
            "m1",
            some(
                r#"{
                "title": "Cells",
                "nodes": [
                    {"id": "a", "position": {"x": 1, "y": 2}, "data": {"label": "cell"}},
                    {"id": "a", "data": {"label": "dup"}},
                    {"id": "b", "data": {"label": "wall"}},
                    {"position": {"x": 0, "y": 0}}
                ],
                "edges": [
                    {"id": "e1", "source": "a", "target": "b", "label": "has"},
                    {"id": "e2", "source": "a", "target": "gone", "data": {"label": "x"}}
                ]
            }"#,
            ),
        );
        assert_eq!(map.id, "m1");
        assert_eq!(map.title, "Cells");
        assert_eq!(map.nodes.len(), 2);
        assert_eq!(map.nodes[0].label(), "cell");
        assert_eq!(map.edges.len(), 1);
        assert_eq!(map.edges[0].data.label, "has");
        assert_eq!(map.edges[0].label, "has");
    }

    #[test]
    fn test_map_default_shape() {
        let map = decode_map("m2", some("[]"));
        assert_eq!(map.id, "m2");
        assert!(map.nodes.is_empty() && map.edges.is_empty());

        let map = decode_map("m3", some(r#"{"title":"t","nodes":"nope"}"#));
        assert_eq!(map.title, "t");
        assert!(map.nodes.is_empty());
    }
}
