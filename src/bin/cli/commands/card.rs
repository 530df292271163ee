use anyhow::{bail, Context, Result};
use chrono::Utc;

use mapmynotes_lib::flashcards::{
    add_card, delete_card, format_interval, parse_override, parse_tags, Flashcard, ReviewSession,
};
use mapmynotes_lib::storage::StoreSession;

use crate::app::{resolve_id, App};
use crate::OutputFormat;

async fn load(session: &StoreSession) -> Result<Vec<Flashcard>> {
    session.load_flashcards().await.context("Failed to load flashcards")
}

async fn save(session: &StoreSession, cards: &[Flashcard]) -> Result<()> {
    session
        .save_flashcards(cards)
        .await
        .context("Failed to save flashcards")
}

fn print_cards(cards: &[&Flashcard], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(cards)?),
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("(no cards)");
            }
            for card in cards {
                let next = card
                    .next_review_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "now".to_string());
                let tags = if card.tags.is_empty() {
                    String::new()
                } else {
                    format!("  #{}", card.tags.join(" #"))
                };
                println!("{:.8}  {}  (next: {}){}", card.id, card.question, next, tags);
            }
        }
    }
    Ok(())
}

pub async fn run_list(
    session: &StoreSession,
    tag: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let cards = load(session).await?;
    let selected: Vec<&Flashcard> = cards
        .iter()
        .filter(|c| tag.map_or(true, |t| c.has_tag(t)))
        .collect();
    print_cards(&selected, format)
}

pub async fn run_add(
    session: &StoreSession,
    question: &str,
    answer: &str,
    tags: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    if question.trim().is_empty() || answer.trim().is_empty() {
        bail!("A card needs both a question and an answer");
    }
    let mut cards = load(session).await?;
    let card = Flashcard::new(
        question.to_string(),
        answer.to_string(),
        tags.map(parse_tags).unwrap_or_default(),
    );
    add_card(&mut cards, card.clone());
    save(session, &cards).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&card)?),
        OutputFormat::Plain => println!("Added card {}", card.id),
    }
    Ok(())
}

pub async fn run_delete(session: &StoreSession, id: &str) -> Result<()> {
    let mut cards = load(session).await?;
    let id = resolve_id(&cards, id, "card", |c| c.id.as_str())?.id.clone();
    if let Some(card) = delete_card(&mut cards, &id) {
        save(session, &cards).await?;
        println!("Deleted card \"{}\"", card.question);
    }
    Ok(())
}

pub async fn run_due(
    session: &StoreSession,
    tag: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let cards = load(session).await?;
    let mut review = ReviewSession::new(App::today());
    review.set_tag_filter(tag);
    let due = review.due_cards(&cards);

    if let (OutputFormat::Plain, Some(head)) = (format, review.current(&cards)) {
        println!("{} card(s) due. Next up:", due.len());
        println!("  Q: {}", head.question);
        println!();
    }
    print_cards(&due, format)
}

/// Review one card and mark the day once nothing is left to review
pub async fn run_review(
    app: &App,
    session: &StoreSession,
    id: Option<&str>,
    tag: Option<String>,
    remembered: bool,
    days: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let mut cards = load(session).await?;
    let mut review = ReviewSession::new(App::today());
    review.set_tag_filter(tag);

    let override_days = match days {
        Some(raw) => {
            let parsed = parse_override(raw);
            if parsed.is_none() {
                log::warn!("Ignoring invalid interval '{}', using the schedule", raw);
            }
            parsed
        }
        None => None,
    };
    if override_days.is_some() && !remembered {
        log::warn!("--days only applies to remembered cards");
    }

    let outcome = match id {
        Some(id) => {
            let card = resolve_id(&cards, id, "card", |c| c.id.as_str())?;
            let (id, question) = (card.id.clone(), card.question.clone());
            let outcome = review.review(&mut cards, &id, remembered, override_days, Utc::now());
            if outcome.is_none() {
                bail!("Card \"{}\" is not due for review", question);
            }
            outcome
        }
        None => review.review_current(&mut cards, remembered, override_days, Utc::now()),
    };
    let Some(outcome) = outcome else {
        println!("No cards due");
        return Ok(());
    };
    save(session, &cards).await?;
    session
        .record_review(&outcome, review.today())
        .await
        .context("Failed to update review streak")?;

    let card = &outcome.card;
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "card": card,
                "sessionComplete": outcome.session_complete,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Q: {}", card.question);
            println!("A: {}", card.answer);
            if let Some(next) = card.next_review_date {
                println!(
                    "Next review in {} ({}), ease {:.2}",
                    format_interval(card.interval_days),
                    next,
                    card.ease_factor
                );
            }
            if outcome.session_complete {
                println!("All due cards reviewed. Day marked complete.");
            } else if remembered && days.is_none() {
                let presets: Vec<String> = app
                    .config
                    .review
                    .presets
                    .iter()
                    .map(|d| format_interval(*d))
                    .collect();
                println!("Tip: pass --days to pick an interval ({})", presets.join(", "));
            }
        }
    }
    Ok(())
}
