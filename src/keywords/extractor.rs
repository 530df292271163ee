//! Frequency-based keyword extraction.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::notes::Note;

/// Number of candidates offered when the caller does not ask for a limit
pub const DEFAULT_LIMIT: usize = 5;

/// Words that never qualify as keywords
pub const STOP_WORDS: &[&str] = &[
    "the", "is", "in", "at", "which", "on", "a", "an", "of", "and", "to", "it", "for", "by",
    "with", "as", "are", "this", "that", "be", "from", "or", "has", "was", "have", "but", "not",
    "we", "can",
];

/// Whole ASCII words of at least three lowercase letters.
fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?-u:\b)[a-z]{3,}(?-u:\b)").expect("static keyword pattern"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Extract up to `limit` keywords from free text.
///
/// Tokens are counted after lower-casing; the result is ordered by
/// descending frequency, ties keeping the order in which the words first
/// appeared. Empty input yields an empty list.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() || limit == 0 {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let stop = stop_words();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for m in word_pattern().find_iter(&lowered) {
        let word = m.as_str();
        if stop.contains(word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // `sort_by` is stable, so equal counts keep first-seen order
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));

    order
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Every distinct confirmed keyword across `notes`, in first-seen order.
pub fn collect_user_keywords<'a, I>(notes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for note in notes {
        for keyword in &note.user_keywords {
            if seen.insert(keyword.as_str()) {
                keywords.push(keyword.clone());
            }
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_then_first_occurrence() {
        let keywords = extract_keywords("The cat sat on the mat and the cat ran", 2);
        assert_eq!(keywords, vec!["cat", "sat"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("", 5).is_empty());
        assert!(extract_keywords("anything here", 0).is_empty());
    }

    #[test]
    fn test_short_words_digits_and_stop_words_dropped() {
        let keywords = extract_keywords("An ox is 42 and THE Rust rust RUST compiler 2024", 10);
        assert_eq!(keywords, vec!["rust", "compiler"]);
    }

    #[test]
    fn test_single_occurrence_still_qualifies() {
        let keywords = extract_keywords("graphs nodes", 5);
        assert_eq!(keywords, vec!["graphs", "nodes"]);
    }

    #[test]
    fn test_mixed_alphanumeric_is_not_a_word() {
        // No word boundary between letters and digits
        assert!(extract_keywords("abc123 x1yz", 5).is_empty());
    }

    #[test]
    fn test_output_properties() {
        let text = "Spaced repetition: review, review, REVIEW! Memory memory the of an ab abc. \
                    Flashcards help memory; spaced practice helps recall.";
        for limit in 0..8 {
            let keywords = extract_keywords(text, limit);
            assert!(keywords.len() <= limit);
            let unique: HashSet<_> = keywords.iter().collect();
            assert_eq!(unique.len(), keywords.len());
            for k in &keywords {
                assert!(k.len() >= 3);
                assert_eq!(k, &k.to_lowercase());
                assert!(!STOP_WORDS.contains(&k.as_str()));
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "alpha beta gamma beta alpha delta";
        assert_eq!(extract_keywords(text, 3), extract_keywords(text, 3));
        assert_eq!(extract_keywords(text, 3), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_collect_user_keywords() {
        let mut a = Note::new("a".to_string());
        a.user_keywords = vec!["alpha".to_string(), "beta".to_string()];
        let mut b = Note::new("b".to_string());
        b.user_keywords = vec!["beta".to_string(), "gamma".to_string()];

        assert_eq!(collect_user_keywords([&a, &b]), vec!["alpha", "beta", "gamma"]);
    }
}
