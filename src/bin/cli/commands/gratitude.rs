use anyhow::{bail, Context, Result};

use mapmynotes_lib::gratitude::{
    add_entry, delete_entry, edit_entry, entry_for_date, journal_streak, GratitudeEntry,
};
use mapmynotes_lib::storage::StoreSession;

use crate::app::{resolve_id, App};
use crate::render::terminal::render_streak_stats;
use crate::OutputFormat;

async fn load(session: &StoreSession) -> Result<Vec<GratitudeEntry>> {
    session
        .load_gratitude_entries()
        .await
        .context("Failed to load gratitude entries")
}

async fn save(session: &StoreSession, entries: &[GratitudeEntry]) -> Result<()> {
    session
        .save_gratitude_entries(entries)
        .await
        .context("Failed to save gratitude entries")
}

fn print_entry(entry: &GratitudeEntry, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entry)?),
        OutputFormat::Plain => {
            println!("{}  {}  ({:.8})", entry.date, entry.title, entry.id);
            if !entry.description.is_empty() {
                println!("    {}", entry.description);
            }
        }
    }
    Ok(())
}

pub async fn run_list(session: &StoreSession, format: &OutputFormat) -> Result<()> {
    let entries = load(session).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("(no entries)");
            }
            for entry in &entries {
                print_entry(entry, format)?;
            }
        }
    }
    Ok(())
}

pub async fn run_add(
    session: &StoreSession,
    title: &str,
    description: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let mut entries = load(session).await?;
    let today = App::today();
    if entry_for_date(&entries, today).is_some() {
        log::info!("There is already an entry for {}", today);
    }
    let Some(entry) = add_entry(&mut entries, today, title, description.unwrap_or_default())
    else {
        bail!("An entry needs a title");
    };
    save(session, &entries).await?;
    print_entry(&entry, format)
}

pub async fn run_edit(
    session: &StoreSession,
    id: &str,
    title: Option<&str>,
    description: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let mut entries = load(session).await?;
    let id = resolve_id(&entries, id, "entry", |e| e.id.as_str())?.id.clone();
    if title.is_some_and(|t| t.trim().is_empty()) {
        bail!("An entry needs a title");
    }
    match edit_entry(&mut entries, &id, title, description) {
        Some(entry) => {
            save(session, &entries).await?;
            print_entry(&entry, format)
        }
        None => bail!("No entry with id '{}'", id),
    }
}

pub async fn run_delete(session: &StoreSession, id: &str) -> Result<()> {
    let mut entries = load(session).await?;
    let id = resolve_id(&entries, id, "entry", |e| e.id.as_str())?.id.clone();
    if let Some(entry) = delete_entry(&mut entries, &id) {
        save(session, &entries).await?;
        println!("Deleted entry \"{}\"", entry.title);
    }
    Ok(())
}

pub async fn run_streak(
    session: &StoreSession,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let entries = load(session).await?;
    let stats = journal_streak(&entries, App::today());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => println!("{}", render_streak_stats(&stats, use_color)),
    }
    Ok(())
}
