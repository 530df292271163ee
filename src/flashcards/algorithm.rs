//! Spaced repetition review transition
//!
//! A binary remembered/forgot variant of SM-2:
//! - Remembered: ease factor grows by 0.1 and the interval is multiplied by it
//! - Remembered with a manual interval: the interval is taken as given and
//!   the ease factor is left alone
//! - Forgot: ease factor drops by 0.2 and the interval resets to one day
//!
//! The ease factor never goes below 1.3 and the interval never below one day.

use chrono::{DateTime, Days, NaiveDate, Utc};

use super::models::{Flashcard, MIN_EASE_FACTOR, MIN_INTERVAL_DAYS};

/// Ease factor change for a remembered card
const EASE_BONUS: f64 = 0.1;

/// Ease factor change for a forgotten card
const EASE_PENALTY: f64 = 0.2;

/// Interval choices offered next to the free-form override input
pub const DEFAULT_PRESETS: [u32; 3] = [1, 3, 7];

/// Parse a user-entered override interval.
///
/// Returns `None` for non-numeric or non-positive input, in which case the
/// formula-driven interval applies.
pub fn parse_override(input: &str) -> Option<u32> {
    match input.trim().parse::<i64>() {
        Ok(days) if days > 0 => u32::try_from(days).ok(),
        _ => None,
    }
}

/// Compute the state of `card` after a review.
///
/// `today` is the calendar day of the review and `now` its timestamp;
/// `override_days` is only honoured when the card was remembered and the
/// value is positive.
pub fn review(
    card: &Flashcard,
    remembered: bool,
    override_days: Option<u32>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Flashcard {
    let mut next = card.clone();
    next.enforce_floors();

    next.last_reviewed = Some(now);
    next.review_count = next.review_count.saturating_add(1);

    let override_days = override_days.filter(|days| *days >= MIN_INTERVAL_DAYS);

    match (remembered, override_days) {
        (true, Some(days)) => {
            next.interval_days = days;
        }
        (true, None) => {
            next.ease_factor = (next.ease_factor + EASE_BONUS).max(MIN_EASE_FACTOR);
            // Epsilon keeps an exact product like 10 * 2.7 from ceiling up a day
            let scaled = (next.interval_days as f64 * next.ease_factor - 1e-9).ceil();
            next.interval_days = if scaled >= u32::MAX as f64 {
                u32::MAX
            } else {
                (scaled as u32).max(MIN_INTERVAL_DAYS)
            };
        }
        (false, _) => {
            next.ease_factor = (next.ease_factor - EASE_PENALTY).max(MIN_EASE_FACTOR);
            next.interval_days = MIN_INTERVAL_DAYS;
        }
    }

    next.next_review_date = Some(
        today
            .checked_add_days(Days::new(next.interval_days as u64))
            .unwrap_or(NaiveDate::MAX),
    );

    next
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
