//! Notes and the keyword confirmation flow

mod editor;
mod list;
mod models;

pub use editor::{KeywordOutcome, NoteEditor, KEYWORD_KEY};
pub use list::{create_note, create_note_for_keyword, delete_note, find_note, update_note};
pub use models::Note;
