//! Daily gratitude journal

mod journal;
mod models;

pub use journal::{
    add_entry, delete_entry, edit_entry, entry_for_date, journal_streak, upsert_entry,
};
pub use models::GratitudeEntry;
