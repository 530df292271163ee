//! Review session state
//!
//! The set of cards reviewed in a session lives only in memory and is
//! dropped with the session. A card is due when its next review date has
//! arrived (or was never set) and it has not been reviewed yet in this
//! session. Due cards are presented in stored order; the head of the due
//! list is the active card.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use super::algorithm::review;
use super::models::Flashcard;

/// Result of reviewing one card
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The card after the review transition
    pub card: Flashcard,
    /// Whether no due card remains after this review
    pub session_complete: bool,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
    today: NaiveDate,
    /// Reviewed card ids, in review order
    reviewed: Vec<String>,
    reviewed_set: HashSet<String>,
    tag_filter: Option<String>,
}

impl ReviewSession {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            reviewed: Vec::new(),
            reviewed_set: HashSet::new(),
            tag_filter: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Restrict the visible queue to cards carrying `tag`; an empty tag clears the filter.
    pub fn set_tag_filter(&mut self, tag: Option<String>) {
        self.tag_filter = tag.filter(|t| !t.trim().is_empty());
    }

    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    fn visible(&self, card: &Flashcard) -> bool {
        match &self.tag_filter {
            Some(tag) => card.has_tag(tag),
            None => true,
        }
    }

    pub fn was_reviewed(&self, card_id: &str) -> bool {
        self.reviewed_set.contains(card_id)
    }

    /// Due and not yet reviewed in this session, ignoring the tag filter
    pub fn is_pending(&self, card: &Flashcard) -> bool {
        card.is_due(self.today) && !self.was_reviewed(&card.id)
    }

    /// Queue of cards to review, in stored order
    pub fn due_cards<'a>(&self, cards: &'a [Flashcard]) -> Vec<&'a Flashcard> {
        cards
            .iter()
            .filter(|c| self.visible(c) && self.is_pending(c))
            .collect()
    }

    /// The active card: head of the due queue
    pub fn current<'a>(&self, cards: &'a [Flashcard]) -> Option<&'a Flashcard> {
        cards.iter().find(|c| self.visible(c) && self.is_pending(c))
    }

    /// Cards reviewed so far in this session, in stored order
    pub fn reviewed_cards<'a>(&self, cards: &'a [Flashcard]) -> Vec<&'a Flashcard> {
        cards
            .iter()
            .filter(|c| self.visible(c) && self.was_reviewed(&c.id))
            .collect()
    }

    /// Review the card with `card_id` in place.
    ///
    /// Returns `None` if no such card exists, it is not due yet, or it was
    /// already reviewed in this session. Completion is judged over all
    /// cards, not only those matching the tag filter.
    pub fn review(
        &mut self,
        cards: &mut [Flashcard],
        card_id: &str,
        remembered: bool,
        override_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Option<ReviewOutcome> {
        let today = self.today;
        let slot = cards.iter_mut().find(|c| c.id == card_id)?;
        if !slot.is_due(today) || self.was_reviewed(card_id) {
            log::debug!("review session: card {} is not in the due queue", card_id);
            return None;
        }
        let updated = review(slot, remembered, override_days, self.today, now);
        *slot = updated.clone();

        if self.reviewed_set.insert(card_id.to_string()) {
            self.reviewed.push(card_id.to_string());
        }

        let session_complete = !cards.iter().any(|c| self.is_pending(c));
        if session_complete {
            log::info!(
                "review session: all due cards reviewed ({} this session)",
                self.reviewed.len()
            );
        }

        Some(ReviewOutcome {
            card: updated,
            session_complete,
        })
    }

    /// Review whatever card is currently at the head of the queue
    pub fn review_current(
        &mut self,
        cards: &mut [Flashcard],
        remembered: bool,
        override_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Option<ReviewOutcome> {
        let id = self.current(cards)?.id.clone();
        self.review(cards, &id, remembered, override_days, now)
    }

    pub fn reviewed_count(&self) -> usize {
        self.reviewed.len()
    }
}
