//! Data models for the flashcard system

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor of a card that has never been reviewed
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Minimum interval in days
pub const MIN_INTERVAL_DAYS: u32 = 1;

fn default_ease_factor() -> f64 {
    DEFAULT_EASE_FACTOR
}

fn default_interval() -> u32 {
    MIN_INTERVAL_DAYS
}

fn default_created_at() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// Accept `null`, a missing field, an empty string or a full ISO timestamp
/// for `nextReviewDate`; anything unparseable is treated as "never scheduled".
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    // Timestamps like 2025-03-01T10:00:00Z keep only their date part
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Ok(Some(date)),
        Err(_) => {
            log::warn!("flashcards: ignoring unparseable nextReviewDate '{}'", raw);
            Ok(None)
        }
    }
}

/// A flashcard with question, answer and its spaced repetition state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Total number of reviews
    #[serde(default)]
    pub review_count: u32,
    #[serde(default = "default_ease_factor")]
    pub ease_factor: f64,
    /// Current interval in days
    #[serde(default = "default_interval")]
    pub interval_days: u32,
    /// When the card is next due; `None` means due now
    #[serde(default, deserialize_with = "lenient_date")]
    pub next_review_date: Option<NaiveDate>,
}

impl Flashcard {
    pub fn new(question: String, answer: String, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question,
            answer,
            tags,
            created_at: Utc::now(),
            last_reviewed: None,
            review_count: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: MIN_INTERVAL_DAYS,
            next_review_date: None,
        }
    }

    /// Check if the card is due for review on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date.map_or(true, |date| date <= today)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Raise out-of-range scheduling values to their floors.
    ///
    /// Returns `true` if anything changed.
    pub fn enforce_floors(&mut self) -> bool {
        let mut changed = false;
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            self.ease_factor = if self.ease_factor.is_finite() {
                MIN_EASE_FACTOR
            } else {
                DEFAULT_EASE_FACTOR
            };
            changed = true;
        }
        if self.interval_days < MIN_INTERVAL_DAYS {
            self.interval_days = MIN_INTERVAL_DAYS;
            changed = true;
        }
        changed
    }
}
