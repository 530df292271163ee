//! Streak computation
//!
//! All functions are pure over the history set so the derived numbers can
//! never drift from the underlying data.

use chrono::{Datelike, Duration, NaiveDate};

use super::models::{CalendarDay, StreakRecord, StreakStats};

/// Mark `day` as complete. Marking a day twice leaves the record unchanged.
///
/// Returns `true` if the day was newly added.
pub fn mark_day_complete(record: &mut StreakRecord, day: NaiveDate) -> bool {
    let added = record.history.insert(day);
    if added {
        log::info!("streak: marked {} complete ({} days total)", day, record.history.len());
    }
    added
}

/// Count consecutive marked days walking back from `today`.
///
/// A missing today does not break the streak, an earlier gap does.
pub fn current_streak(record: &StreakRecord, today: NaiveDate) -> u32 {
    let mut check_date = today;
    if !record.contains(check_date) {
        // Today might not be over yet
        check_date = check_date - Duration::days(1);
    }

    let mut streak = 0;
    while record.contains(check_date) {
        streak += 1;
        check_date = check_date - Duration::days(1);
    }
    streak
}

/// Longest run of consecutive days in the history
pub fn longest_streak(record: &StreakRecord) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut prev: Option<NaiveDate> = None;

    // BTreeSet iterates in sorted order
    for &date in &record.history {
        current = match prev {
            Some(p) if date - p == Duration::days(1) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        prev = Some(date);
    }

    longest
}

pub fn stats(record: &StreakRecord, today: NaiveDate) -> StreakStats {
    StreakStats {
        current_streak: current_streak(record, today),
        longest_streak: longest_streak(record),
        last_date: record.last_date(),
        total_days: record.history.len() as u32,
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Every day of the month containing `day`, flagged if marked
pub fn month_calendar(record: &StreakRecord, day: NaiveDate) -> Vec<CalendarDay> {
    let (year, month) = (day.year(), day.month());
    (1..=days_in_month(year, month))
        .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .map(|date| CalendarDay {
            date,
            marked: record.contains(date),
        })
        .collect()
}
