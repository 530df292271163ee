//! Operations on the note list as stored in `notes.json`.
//!
//! New notes are prepended, matching the order the list is displayed in.

use super::models::Note;

/// Create an empty note at the head of the list
pub fn create_note(notes: &mut Vec<Note>, title: String, content: String) -> Note {
    let note = Note::new(title).with_content(content);
    notes.insert(0, note.clone());
    note
}

/// Create a note seeded with a single confirmed keyword
pub fn create_note_for_keyword(notes: &mut Vec<Note>, keyword: &str) -> Note {
    let mut note = Note::new(format!("Note for {}", keyword));
    note.add_user_keyword(keyword);
    notes.insert(0, note.clone());
    note
}

pub fn find_note<'a>(notes: &'a [Note], id: &str) -> Option<&'a Note> {
    notes.iter().find(|n| n.id == id)
}

/// Replace the note with the same id. Returns `false` if no such note exists.
pub fn update_note(notes: &mut [Note], note: Note) -> bool {
    match notes.iter_mut().find(|n| n.id == note.id) {
        Some(slot) => {
            *slot = note;
            true
        }
        None => false,
    }
}

pub fn delete_note(notes: &mut Vec<Note>, id: &str) -> Option<Note> {
    let pos = notes.iter().position(|n| n.id == id)?;
    Some(notes.remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_prepends() {
        let mut notes = Vec::new();
        let first = create_note(&mut notes, "first".into(), String::new());
        let second = create_note(&mut notes, "second".into(), "body".into());
        assert_eq!(notes[0].id, second.id);
        assert_eq!(notes[1].id, first.id);
        assert_eq!(notes[0].content, "body");
    }

    #[test]
    fn test_create_for_keyword() {
        let mut notes = Vec::new();
        let note = create_note_for_keyword(&mut notes, "entropy");
        assert_eq!(note.title, "Note for entropy");
        assert_eq!(note.user_keywords, vec!["entropy"]);
        assert!(note.content.is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let mut notes = Vec::new();
        let mut note = create_note(&mut notes, "a".into(), String::new());
        note.title = "renamed".into();
        assert!(update_note(&mut notes, note.clone()));
        assert_eq!(find_note(&notes, &note.id).unwrap().title, "renamed");

        assert!(delete_note(&mut notes, &note.id).is_some());
        assert!(delete_note(&mut notes, &note.id).is_none());
        assert!(!update_note(&mut notes, note));
    }
}
