//! Data models for streak tracking

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The days on which a qualifying activity happened.
///
/// Only the history is persisted; every counter is derived from it on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    #[serde(default)]
    pub history: BTreeSet<NaiveDate>,
}

impl StreakRecord {
    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            history: dates.into_iter().collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.history.contains(&date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.history.iter().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Streak statistics derived from a [`StreakRecord`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    /// Consecutive days ending today (or yesterday, if today is not marked yet)
    pub current_streak: u32,
    /// Longest run of consecutive days anywhere in the history
    pub longest_streak: u32,
    pub last_date: Option<NaiveDate>,
    pub total_days: u32,
}

/// One day in a month calendar view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub marked: bool,
}
