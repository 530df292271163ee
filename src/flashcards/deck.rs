//! Card list operations and tag entry

use std::collections::BTreeSet;

use super::models::Flashcard;

/// Add a card at the head of the list
pub fn add_card(cards: &mut Vec<Flashcard>, card: Flashcard) {
    cards.insert(0, card);
}

pub fn find_card<'a>(cards: &'a [Flashcard], id: &str) -> Option<&'a Flashcard> {
    cards.iter().find(|c| c.id == id)
}

pub fn delete_card(cards: &mut Vec<Flashcard>, id: &str) -> Option<Flashcard> {
    let pos = cards.iter().position(|c| c.id == id)?;
    Some(cards.remove(pos))
}

/// All tags in use, sorted
pub fn all_tags(cards: &[Flashcard]) -> Vec<String> {
    cards
        .iter()
        .flat_map(|c| c.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Split a comma-separated tag string
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags = TagInput::default();
    for part in input.split(',') {
        tags.set_text(part);
        tags.commit();
    }
    tags.into_tags()
}

/// Incremental tag entry for the card form.
///
/// `Enter` or `,` commits the typed text as a tag; `Backspace` on an empty
/// input removes the last tag.
#[derive(Debug, Clone, Default)]
pub struct TagInput {
    text: String,
    tags: Vec<String>,
}

impl TagInput {
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn into_tags(self) -> Vec<String> {
        self.tags
    }

    fn commit(&mut self) -> bool {
        let tag = self.text.trim().to_string();
        self.text.clear();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Returns `true` if the key changed the tag list
    pub fn handle_key(&mut self, key: &str) -> bool {
        match key {
            "Enter" | "," => self.commit(),
            "Backspace" if self.text.is_empty() => self.tags.pop().is_some(),
            _ => false,
        }
    }
}
