//! Gratitude journal entry model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_created_at() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// A journal entry. One entry per day is intended but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GratitudeEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
}

impl GratitudeEntry {
    pub fn new(date: NaiveDate, title: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            title,
            description,
            created_at: Utc::now(),
        }
    }
}
