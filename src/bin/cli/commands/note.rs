use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};

use mapmynotes_lib::keywords::extract_keywords;
use mapmynotes_lib::notes::{
    create_note, delete_note, update_note, KeywordOutcome, Note, NoteEditor, KEYWORD_KEY,
};
use mapmynotes_lib::ocr::{TesseractExtractor, TextExtractor};
use mapmynotes_lib::storage::StoreSession;

use crate::app::{resolve_id, App};
use crate::OutputFormat;

async fn load(session: &StoreSession) -> Result<Vec<Note>> {
    session.load_notes().await.context("Failed to load notes")
}

async fn save(session: &StoreSession, notes: &[Note]) -> Result<()> {
    session.save_notes(notes).await.context("Failed to save notes")
}

fn find<'a>(notes: &'a [Note], id: &str) -> Result<&'a Note> {
    resolve_id(notes, id, "note", |n| n.id.as_str())
}

fn print_note(note: &Note, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(note)?),
        OutputFormat::Plain => {
            println!("{}", note.title);
            println!("  ID: {}", note.id);
            if !note.user_keywords.is_empty() {
                println!("  Keywords: {}", note.user_keywords.join(", "));
            }
        }
    }
    Ok(())
}

pub async fn run_list(session: &StoreSession, format: &OutputFormat) -> Result<()> {
    let notes = load(session).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notes)?),
        OutputFormat::Plain => {
            if notes.is_empty() {
                println!("(no notes)");
            }
            for note in &notes {
                let keywords = if note.user_keywords.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", note.user_keywords.join(", "))
                };
                println!("{:.8}  {}{}", note.id, note.title, keywords);
            }
        }
    }
    Ok(())
}

pub async fn run_new(
    session: &StoreSession,
    title: &str,
    content: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("A note needs a title");
    }
    let mut notes = load(session).await?;
    let note = create_note(&mut notes, title.to_string(), content.unwrap_or_default());
    save(session, &notes).await?;
    if matches!(format, OutputFormat::Plain) {
        print!("Created note ");
    }
    print_note(&note, format)
}

pub async fn run_show(
    app: &App,
    session: &StoreSession,
    id: &str,
    format: &OutputFormat,
) -> Result<()> {
    let notes = load(session).await?;
    let note = find(&notes, id)?;
    let editor = NoteEditor::new(note.clone());
    let candidates = editor.candidates(app.config.keywords.limit);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "note": note,
                "candidates": candidates,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            print_note(note, format)?;
            if !candidates.is_empty() {
                println!("  Suggested: {}", candidates.join(", "));
            }
            if !note.content.is_empty() {
                println!();
                println!("{}", note.content);
            }
        }
    }
    Ok(())
}

pub async fn run_edit(
    session: &StoreSession,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let mut notes = load(session).await?;
    let mut editor = NoteEditor::new(find(&notes, id)?.clone());
    if let Some(title) = title {
        if title.trim().is_empty() {
            bail!("A note needs a title");
        }
        editor.set_title(title);
    }
    if let Some(content) = content {
        editor.set_content(content);
    }

    if !editor.is_dirty() {
        println!("Nothing to change");
        return Ok(());
    }
    let note = editor.into_note();
    update_note(&mut notes, note.clone());
    save(session, &notes).await?;
    print_note(&note, format)
}

pub async fn run_delete(session: &StoreSession, id: &str) -> Result<()> {
    let mut notes = load(session).await?;
    let id = find(&notes, id)?.id.clone();
    if let Some(note) = delete_note(&mut notes, &id) {
        save(session, &notes).await?;
        println!("Deleted note \"{}\"", note.title);
    }
    Ok(())
}

pub async fn run_keywords(
    app: &App,
    session: &StoreSession,
    id: &str,
    limit: Option<usize>,
    format: &OutputFormat,
) -> Result<()> {
    let notes = load(session).await?;
    let note = find(&notes, id)?;
    let extracted = extract_keywords(&note.content, limit.unwrap_or(app.config.keywords.limit));

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "extracted": extracted,
                "userKeywords": note.user_keywords,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if extracted.is_empty() {
                println!("(no keywords found)");
            }
            for keyword in &extracted {
                let mark = if note.has_keyword(keyword) { "x" } else { " " };
                println!("[{}] {}", mark, keyword);
            }
        }
    }
    Ok(())
}

/// Confirm `text` as a keyword, selecting it in the body when it occurs there
pub async fn run_add_keyword(session: &StoreSession, id: &str, text: &str) -> Result<()> {
    let mut notes = load(session).await?;
    let mut editor = NoteEditor::new(find(&notes, id)?.clone());
    if !editor.select_first(text) {
        editor.select_candidate(text);
    }

    match editor.handle_key(KEYWORD_KEY) {
        KeywordOutcome::Added(keyword) => {
            update_note(&mut notes, editor.into_note());
            save(session, &notes).await?;
            println!("Added keyword \"{}\"", keyword);
        }
        KeywordOutcome::AlreadyPresent(keyword) => {
            println!("Note already has keyword \"{}\"", keyword);
        }
        KeywordOutcome::NothingSelected | KeywordOutcome::Ignored => {
            bail!("Keyword text is empty");
        }
    }
    Ok(())
}

/// Append the text recognised in `image` to the note body
pub async fn run_ocr(
    app: &App,
    session: &StoreSession,
    id: &str,
    image: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let mut notes = load(session).await?;
    let mut editor = NoteEditor::new(find(&notes, id)?.clone());

    let extractor = TesseractExtractor::new(&app.config.ocr.command, &app.config.ocr.language);
    let progress = |fraction: f32| {
        eprint!("\rRecognizing text: {:>3.0}%", fraction * 100.0);
        let _ = std::io::stderr().flush();
    };
    let text = extractor
        .extract_text(image, &progress)
        .await
        .with_context(|| format!("Failed to read text from {}", image.display()))?;
    eprintln!();

    if text.trim().is_empty() {
        println!("No text recognised");
        return Ok(());
    }

    let content = if editor.note().content.is_empty() {
        text.clone()
    } else {
        format!("{}\n\n{}", editor.note().content, text)
    };
    editor.set_content(content);
    let candidates = editor.candidates(app.config.keywords.limit);
    update_note(&mut notes, editor.into_note());
    save(session, &notes).await?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "text": text,
                "candidates": candidates,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", text);
            if !candidates.is_empty() {
                println!();
                println!("Suggested keywords: {}", candidates.join(", "));
            }
        }
    }
    Ok(())
}
