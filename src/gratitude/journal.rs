//! Journal operations
//!
//! Entries are kept newest first. Editing replaces title and description
//! only; the id, date and creation time of an entry never change.

use chrono::NaiveDate;

use super::models::GratitudeEntry;
use crate::streaks::{self, StreakRecord, StreakStats};

/// Add an entry dated `today` at the head of the list.
///
/// A blank title is rejected.
pub fn add_entry(
    entries: &mut Vec<GratitudeEntry>,
    today: NaiveDate,
    title: &str,
    description: &str,
) -> Option<GratitudeEntry> {
    if title.trim().is_empty() {
        return None;
    }
    let entry = GratitudeEntry::new(today, title.to_string(), description.to_string());
    entries.insert(0, entry.clone());
    Some(entry)
}

/// Replace the entry with the same id, or prepend `entry` if it is new
pub fn upsert_entry(entries: &mut Vec<GratitudeEntry>, entry: GratitudeEntry) {
    match entries.iter_mut().find(|e| e.id == entry.id) {
        Some(existing) => {
            existing.title = entry.title;
            existing.description = entry.description;
        }
        None => entries.insert(0, entry),
    }
}

/// Edit the title and/or description of an existing entry
pub fn edit_entry(
    entries: &mut [GratitudeEntry],
    id: &str,
    title: Option<&str>,
    description: Option<&str>,
) -> Option<GratitudeEntry> {
    let entry = entries.iter_mut().find(|e| e.id == id)?;
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        entry.title = title.to_string();
    }
    if let Some(description) = description {
        entry.description = description.to_string();
    }
    Some(entry.clone())
}

pub fn delete_entry(entries: &mut Vec<GratitudeEntry>, id: &str) -> Option<GratitudeEntry> {
    let pos = entries.iter().position(|e| e.id == id)?;
    Some(entries.remove(pos))
}

/// First entry written on `date`
pub fn entry_for_date(entries: &[GratitudeEntry], date: NaiveDate) -> Option<&GratitudeEntry> {
    entries.iter().find(|e| e.date == date)
}

/// Streak over the days that have at least one entry
pub fn journal_streak(entries: &[GratitudeEntry], today: NaiveDate) -> StreakStats {
    let record = StreakRecord::from_dates(entries.iter().map(|e| e.date));
    streaks::stats(&record, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_prepends_and_rejects_blank() {
        let mut entries = Vec::new();
        assert!(add_entry(&mut entries, date(2025, 1, 1), "  ", "x").is_none());
        add_entry(&mut entries, date(2025, 1, 1), "coffee", "").unwrap();
        add_entry(&mut entries, date(2025, 1, 2), "sunshine", "warm").unwrap();
        assert_eq!(entries[0].title, "sunshine");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut entries = Vec::new();
        let original = add_entry(&mut entries, date(2025, 1, 1), "coffee", "").unwrap();

        let edited = edit_entry(&mut entries, &original.id, Some("tea"), Some("green")).unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.date, original.date);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.title, "tea");
        assert_eq!(edited.description, "green");

        let mut replacement = GratitudeEntry::new(date(2030, 1, 1), "friends".into(), "".into());
        replacement.id = original.id.clone();
        upsert_entry(&mut entries, replacement);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "friends");
        assert_eq!(entries[0].date, date(2025, 1, 1));

        assert!(edit_entry(&mut entries, "missing", Some("x"), None).is_none());
    }

    #[test]
    fn test_delete_and_lookup() {
        let mut entries = Vec::new();
        let a = add_entry(&mut entries, date(2025, 1, 1), "a", "").unwrap();
        add_entry(&mut entries, date(2025, 1, 2), "b", "").unwrap();

        assert_eq!(entry_for_date(&entries, date(2025, 1, 2)).unwrap().title, "b");
        assert!(delete_entry(&mut entries, &a.id).is_some());
        assert!(delete_entry(&mut entries, &a.id).is_none());
        assert!(entry_for_date(&entries, date(2025, 1, 1)).is_none());
    }

    #[test]
    fn test_journal_streak() {
        let mut entries = Vec::new();
        for d in [3, 4, 5, 5] {
            add_entry(&mut entries, date(2025, 1, d), "x", "").unwrap();
        }
        let stats = journal_streak(&entries, date(2025, 1, 6));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.last_date, Some(date(2025, 1, 5)));
        assert_eq!(stats.total_days, 3);
    }
}
