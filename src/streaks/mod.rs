//! Daily activity streaks
//!
//! Shared by flashcard review (a day counts once every due card has been
//! reviewed) and the gratitude journal (a day counts when it has an entry).

mod models;
mod tracker;

pub use models::{CalendarDay, StreakRecord, StreakStats};
pub use tracker::{
    current_streak, days_in_month, longest_streak, mark_day_complete, month_calendar, stats,
};
