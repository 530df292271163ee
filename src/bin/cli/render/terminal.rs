use chrono::{Datelike, NaiveDate};

use mapmynotes_lib::concept_map::SaveStatus;
use mapmynotes_lib::streaks::{CalendarDay, StreakStats};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn render_save_status(status: &SaveStatus, use_color: bool) -> String {
    let color = match status {
        SaveStatus::Saved => Color::GREEN,
        SaveStatus::Error(_) => Color::RED,
        SaveStatus::Saving => Color::YELLOW,
        SaveStatus::Idle => Color::DIM,
    };
    paint(&status.to_string(), color, use_color)
}

pub fn render_streak_stats(stats: &StreakStats, use_color: bool) -> String {
    let last = stats
        .last_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "never".to_string());
    let current = paint(&stats.current_streak.to_string(), Color::BOLD, use_color);
    format!(
        "Current streak: {} day(s)\nLongest streak: {} day(s)\nLast day: {}\nTotal days: {}",
        current, stats.longest_streak, last, stats.total_days
    )
}

/// Month grid, weeks starting on Monday; marked days are highlighted
pub fn render_calendar(days: &[CalendarDay], today: NaiveDate, use_color: bool) -> String {
    let mut lines = vec![
        today.format("%B %Y").to_string(),
        "Mo Tu We Th Fr Sa Su".to_string(),
    ];
    let Some(first) = days.first() else {
        return lines.join("\n");
    };

    let mut row: Vec<String> =
        vec!["  ".to_string(); first.date.weekday().num_days_from_monday() as usize];
    for day in days {
        let number = format!("{:>2}", day.date.day());
        let cell = match (day.marked, use_color) {
            (true, true) => paint(&number, Color::GREEN, true),
            // Without color a marked day shows as a star
            (true, false) => " *".to_string(),
            (false, _) if day.date == today => paint(&number, Color::BOLD, use_color),
            (false, _) => number,
        };
        row.push(cell);
        if row.len() == 7 {
            lines.push(row.join(" "));
            row.clear();
        }
    }
    if !row.is_empty() {
        lines.push(row.join(" "));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapmynotes_lib::streaks::{mark_day_complete, month_calendar, StreakRecord};

    #[test]
    fn test_calendar_layout() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
        let mut record = StreakRecord::default();
        mark_day_complete(&mut record, NaiveDate::from_ymd_opt(2025, 9, 2).unwrap());

        let text = render_calendar(&month_calendar(&record, today), today, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "September 2025");
        // 1 September 2025 is a Monday
        assert_eq!(lines[2], " 1  *  3  4  5  6  7");
        assert_eq!(lines.last().copied(), Some("29 30"));
    }

    #[test]
    fn test_plain_status() {
        assert_eq!(render_save_status(&SaveStatus::Saved, false), SaveStatus::Saved.to_string());
    }
}
