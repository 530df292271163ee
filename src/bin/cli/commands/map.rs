use std::sync::Arc;

use anyhow::{bail, Context, Result};

use mapmynotes_lib::concept_map::{
    add_text_node, connect, delete_node, find_note_for_node, promote_keywords, set_edge_label,
    Autosaver, ConceptMap, NodeLookup, SaveStatus,
};
use mapmynotes_lib::keywords::collect_user_keywords;
use mapmynotes_lib::notes::{create_note_for_keyword, Note};
use mapmynotes_lib::storage::StoreSession;

use crate::app::{resolve_id, resolve_map, App};
use crate::render::terminal::render_save_status;
use crate::OutputFormat;

async fn load_map(session: &StoreSession, query: &str) -> Result<ConceptMap> {
    let maps = session.list_maps().await.context("Failed to list maps")?;
    let id = resolve_map(&maps, query)?.id.clone();
    session
        .load_map(&id)
        .await
        .with_context(|| format!("Failed to load map {}", id))
}

/// Hand the edited map to the autosave layer and wait for the write
async fn commit(
    app: &App,
    session: &Arc<StoreSession>,
    map: &ConceptMap,
    use_color: bool,
) -> Result<()> {
    let saver = Autosaver::start(session.clone(), map.clone(), app.config.autosave_settings());
    saver.edit(map.clone()).await;
    let status = saver.flush().await;
    saver.shutdown().await;

    eprintln!("Map {}", render_save_status(&status, use_color));
    if let SaveStatus::Error(message) = status {
        bail!("Failed to save map \"{}\": {}", map.title, message);
    }
    Ok(())
}

/// Find a node by id, unique id prefix, or label
fn resolve_node(map: &ConceptMap, query: &str) -> Result<String> {
    if let Ok(node) = resolve_id(&map.nodes, query, "node", |n| n.id.as_str()) {
        return Ok(node.id.clone());
    }
    match map.nodes.iter().find(|n| n.label() == query) {
        Some(node) => Ok(node.id.clone()),
        None => bail!("No node \"{}\" on map \"{}\"", query, map.title),
    }
}

pub async fn run_list(session: &StoreSession, format: &OutputFormat) -> Result<()> {
    let maps = session.list_maps().await.context("Failed to list maps")?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&maps)?),
        OutputFormat::Plain => {
            if maps.is_empty() {
                println!("(no maps)");
            }
            for map in &maps {
                println!("{:.8}  {}", map.id, map.name);
            }
        }
    }
    Ok(())
}

pub async fn run_create(session: &StoreSession, title: &str, format: &OutputFormat) -> Result<()> {
    if title.trim().is_empty() {
        bail!("A map needs a title");
    }
    let summary = session.create_map(title).await.context("Failed to create map")?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => println!("Created map \"{}\" ({})", summary.name, summary.id),
    }
    Ok(())
}

pub async fn run_delete(session: &StoreSession, query: &str) -> Result<()> {
    let maps = session.list_maps().await.context("Failed to list maps")?;
    let map = resolve_map(&maps, query)?;
    session
        .delete_map(&map.id)
        .await
        .context("Failed to delete map")?;
    println!("Deleted map \"{}\"", map.name);
    Ok(())
}

pub async fn run_show(session: &StoreSession, query: &str, format: &OutputFormat) -> Result<()> {
    let map = load_map(session, query).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&map)?),
        OutputFormat::Plain => {
            println!("{}  ({})", map.title, map.id);
            println!("Nodes:");
            for node in &map.nodes {
                println!(
                    "  {}  {}  @ ({:.0}, {:.0})",
                    node.id,
                    node.label(),
                    node.position.x,
                    node.position.y
                );
            }
            println!("Edges:");
            for edge in &map.edges {
                let label_of = |id: &str| map.node(id).map(|n| n.label()).unwrap_or_default();
                println!(
                    "  {}  {} --[{}]--> {}",
                    edge.id,
                    label_of(&edge.source),
                    edge.data.label,
                    label_of(&edge.target)
                );
            }
        }
    }
    Ok(())
}

/// Add nodes for confirmed keywords of the selected notes
pub async fn run_promote(
    app: &App,
    session: &Arc<StoreSession>,
    query: &str,
    note_ids: &[String],
    keywords: &[String],
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let notes = session.load_notes().await.context("Failed to load notes")?;
    let selected: Vec<&Note> = note_ids
        .iter()
        .map(|id| resolve_id(&notes, id, "note", |n| n.id.as_str()))
        .collect::<Result<_>>()?;
    let available = collect_user_keywords(selected.iter().copied());

    let chosen: Vec<String> = if keywords.is_empty() {
        available
    } else {
        keywords
            .iter()
            .filter(|k| {
                let known = available.contains(*k);
                if !known {
                    log::warn!("\"{}\" is not a keyword of the selected notes, skipped", k);
                }
                known
            })
            .cloned()
            .collect()
    };
    if chosen.is_empty() {
        bail!("No keywords to promote. Confirm keywords with `note add-keyword` first.");
    }

    let mut map = load_map(session, query).await?;
    let added = promote_keywords(&mut map, &chosen);
    if !added.is_empty() {
        commit(app, session, &map, use_color).await?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&added)?),
        OutputFormat::Plain => {
            for node in &added {
                println!("Added node \"{}\" ({})", node.label(), node.id);
            }
            let skipped = chosen.len() - added.len();
            if skipped > 0 {
                println!("{} keyword(s) already on the map", skipped);
            }
        }
    }
    Ok(())
}

/// Resolve a node to its note, optionally creating one on a miss
pub async fn run_open_node(
    session: &StoreSession,
    map_query: &str,
    node_query: &str,
    create: bool,
    format: &OutputFormat,
) -> Result<()> {
    let map = load_map(session, map_query).await?;
    let node_id = resolve_node(&map, node_query)?;
    let mut notes = session.load_notes().await.context("Failed to load notes")?;
    let Some(lookup) = find_note_for_node(&map, &notes, &node_id) else {
        bail!("No node \"{}\" on map \"{}\"", node_query, map.title);
    };

    let note = match &lookup {
        NodeLookup::NotFound { label } if create && !label.is_empty() => {
            let note = create_note_for_keyword(&mut notes, label);
            session
                .save_notes(&notes)
                .await
                .context("Failed to save notes")?;
            Some(note)
        }
        other => other
            .note_id()
            .and_then(|id| notes.iter().find(|n| n.id == id).cloned()),
    };

    match format {
        OutputFormat::Json => {
            let matched = match &lookup {
                NodeLookup::Keyword { .. } => "keyword",
                NodeLookup::Title { .. } => "title",
                NodeLookup::NotFound { .. } if note.is_some() => "created",
                NodeLookup::NotFound { .. } => "none",
            };
            let output = serde_json::json!({
                "match": matched,
                "note": note,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match (&lookup, &note) {
            (NodeLookup::NotFound { label }, None) => {
                println!("No note found for \"{}\" (use --create to make one)", label);
            }
            (NodeLookup::NotFound { .. }, Some(note)) => {
                println!("Created note \"{}\" ({})", note.title, note.id);
            }
            (_, Some(note)) => {
                println!("{}  ({})", note.title, note.id);
                if !note.content.is_empty() {
                    println!();
                    println!("{}", note.content);
                }
            }
            (_, None) => println!("No note found"),
        },
    }
    Ok(())
}

pub async fn run_connect(
    app: &App,
    session: &Arc<StoreSession>,
    map_query: &str,
    source: &str,
    target: &str,
    label: Option<&str>,
    use_color: bool,
) -> Result<()> {
    let mut map = load_map(session, map_query).await?;
    let source = resolve_node(&map, source)?;
    let target = resolve_node(&map, target)?;
    let Some(edge) = connect(&mut map, &source, &target, label) else {
        bail!("Could not connect {} to {}", source, target);
    };
    commit(app, session, &map, use_color).await?;
    println!("Added edge \"{}\" ({})", edge.data.label, edge.id);
    Ok(())
}

pub async fn run_label_edge(
    app: &App,
    session: &Arc<StoreSession>,
    map_query: &str,
    edge_query: &str,
    label: &str,
    use_color: bool,
) -> Result<()> {
    let mut map = load_map(session, map_query).await?;
    let edge_id = resolve_id(&map.edges, edge_query, "edge", |e| e.id.as_str())?
        .id
        .clone();
    set_edge_label(&mut map, &edge_id, label);
    commit(app, session, &map, use_color).await?;
    println!("Edge {} is now \"{}\"", edge_id, label);
    Ok(())
}

pub async fn run_delete_node(
    app: &App,
    session: &Arc<StoreSession>,
    map_query: &str,
    node_query: &str,
    use_color: bool,
) -> Result<()> {
    let mut map = load_map(session, map_query).await?;
    let node_id = resolve_node(&map, node_query)?;
    let Some((node, edges)) = delete_node(&mut map, &node_id) else {
        bail!("No node \"{}\" on map \"{}\"", node_query, map.title);
    };
    commit(app, session, &map, use_color).await?;
    println!(
        "Deleted node \"{}\" and {} edge(s)",
        node.label(),
        edges.len()
    );
    Ok(())
}

pub async fn run_add_text(
    app: &App,
    session: &Arc<StoreSession>,
    map_query: &str,
    text: &str,
    use_color: bool,
) -> Result<()> {
    let mut map = load_map(session, map_query).await?;
    let node = add_text_node(&mut map, text);
    commit(app, session, &map, use_color).await?;
    println!("Added node \"{}\" ({})", node.label(), node.id);
    Ok(())
}
