//! Editing session for a single note.
//!
//! The editor is the only path that writes `userKeywords`: pressing the
//! keyword key while body text is selected, or while an extracted
//! candidate is selected, confirms that text as a keyword.

use std::ops::Range;

use crate::keywords::extract_keywords;

use super::models::Note;

/// Key that confirms the current selection as a keyword
pub const KEYWORD_KEY: &str = "Enter";

/// What happened when a key was pressed in the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordOutcome {
    /// The keyword was appended to the note
    Added(String),
    /// The note already had this keyword
    AlreadyPresent(String),
    /// The keyword key was pressed with nothing selected
    NothingSelected,
    /// Not the keyword key
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    None,
    /// Byte range into the note content
    Text(Range<usize>),
    /// An extracted candidate chip
    Candidate(String),
}

pub struct NoteEditor {
    note: Note,
    selection: Selection,
    dirty: bool,
}

impl NoteEditor {
    pub fn new(note: Note) -> Self {
        Self {
            note,
            selection: Selection::None,
            dirty: false,
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn into_note(self) -> Note {
        self.note
    }

    /// Whether the note changed since the editor was opened
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_title(&mut self, title: String) {
        if self.note.title != title {
            self.note.title = title;
            self.dirty = true;
        }
    }

    /// Replace the body. Any text selection refers to the old body and is cleared.
    pub fn set_content(&mut self, content: String) {
        if self.note.content != content {
            self.note.content = content;
            self.dirty = true;
            if matches!(self.selection, Selection::Text(_)) {
                self.selection = Selection::None;
            }
        }
    }

    /// Keywords extracted from the body that the note does not have yet
    pub fn candidates(&self, limit: usize) -> Vec<String> {
        extract_keywords(&self.note.content, limit)
            .into_iter()
            .filter(|k| !self.note.has_keyword(k))
            .collect()
    }

    /// Select a byte range of the body.
    ///
    /// Returns `false` and leaves the selection unchanged if the range is
    /// out of bounds or does not fall on character boundaries.
    pub fn select_text(&mut self, range: Range<usize>) -> bool {
        if self.note.content.get(range.clone()).is_none() {
            return false;
        }
        self.selection = Selection::Text(range);
        true
    }

    /// Select the first occurrence of `needle` in the body
    pub fn select_first(&mut self, needle: &str) -> bool {
        match self.note.content.find(needle) {
            Some(start) if !needle.is_empty() => self.select_text(start..start + needle.len()),
            _ => false,
        }
    }

    pub fn select_candidate(&mut self, keyword: &str) {
        self.selection = Selection::Candidate(keyword.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_text(&self) -> Option<&str> {
        match &self.selection {
            Selection::None => None,
            Selection::Text(range) => self.note.content.get(range.clone()),
            Selection::Candidate(keyword) => Some(keyword.as_str()),
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: &str) -> KeywordOutcome {
        if key != KEYWORD_KEY {
            return KeywordOutcome::Ignored;
        }

        let keyword = match self.selected_text().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => return KeywordOutcome::NothingSelected,
        };

        self.selection = Selection::None;

        if self.note.add_user_keyword(&keyword) {
            self.dirty = true;
            log::debug!("note {}: added keyword '{}'", self.note.id, keyword);
            KeywordOutcome::Added(keyword)
        } else {
            KeywordOutcome::AlreadyPresent(keyword)
        }
    }
}
