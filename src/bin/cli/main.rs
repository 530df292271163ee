mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mapmynotes-cli",
    about = "Notes, concept maps, flashcards and a gratitude journal",
    version
)]
struct Cli {
    /// Path to config.toml (default: user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local data directory (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in to a WebDAV server
    Login {
        /// Server URL (defaults to [store] url from the config file)
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: String,
        /// Password (use "-" to read from stdin)
        #[arg(long)]
        password: String,
    },

    /// Forget the stored sign-in
    Logout,

    /// Show backend and sign-in state
    Status,

    /// Notes and their keywords
    #[command(subcommand)]
    Note(NoteCommand),

    /// Flashcards and reviews
    #[command(subcommand)]
    Card(CardCommand),

    /// Review streak and this month's calendar
    Streak,

    /// Gratitude journal
    #[command(subcommand)]
    Gratitude(GratitudeCommand),

    /// Concept maps
    #[command(subcommand)]
    Map(MapCommand),
}

#[derive(Subcommand)]
enum NoteCommand {
    /// List notes
    List,
    /// Create a note
    New {
        title: String,
        /// Body text (use "-" to read from stdin)
        #[arg(long)]
        content: Option<String>,
    },
    /// Show a note with suggested keywords
    Show { id: String },
    /// Change the title or body of a note
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Body text (use "-" to read from stdin)
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
    /// Keywords extracted from the note body
    Keywords {
        id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Confirm text as a keyword of the note
    AddKeyword { id: String, text: String },
    /// Append text recognised in an image to the note
    Ocr { id: String, image: PathBuf },
}

#[derive(Subcommand)]
enum CardCommand {
    /// List cards
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Add a card
    Add {
        question: String,
        answer: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a card
    Delete { id: String },
    /// Cards due for review
    Due {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Review a card (default: the next due card)
    Review {
        id: Option<String>,
        /// Take the next due card carrying this tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, conflicts_with = "forgot", required_unless_present = "forgot")]
        remembered: bool,
        #[arg(long)]
        forgot: bool,
        /// Days until the next review, instead of the computed interval
        #[arg(long)]
        days: Option<String>,
    },
}

#[derive(Subcommand)]
enum GratitudeCommand {
    /// List entries, newest first
    List,
    /// Add an entry for today
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change an entry
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an entry
    Delete { id: String },
    /// Journal streak
    Streak,
}

#[derive(Subcommand)]
enum MapCommand {
    /// List maps
    List,
    /// Create an empty map
    Create { title: String },
    /// Delete a map
    Delete { map: String },
    /// Show nodes and edges of a map
    Show { map: String },
    /// Add nodes for confirmed keywords of notes
    Promote {
        map: String,
        /// Note to take keywords from (repeatable)
        #[arg(long = "note", required = true)]
        notes: Vec<String>,
        /// Keywords to promote (default: all of the notes' keywords)
        keywords: Vec<String>,
    },
    /// Find the note behind a node
    OpenNode {
        map: String,
        node: String,
        /// Create a note for the label when none matches
        #[arg(long)]
        create: bool,
    },
    /// Connect two nodes
    Connect {
        map: String,
        source: String,
        target: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Rename an edge
    LabelEdge {
        map: String,
        edge: String,
        label: String,
    },
    /// Delete a node and its edges
    DeleteNode { map: String, node: String },
    /// Add a free-text node
    AddText { map: String, text: String },
}

/// Read content from stdin when given as "-"
fn resolve_content(content: Option<String>) -> Option<String> {
    match content.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf).ok();
            Some(buf.trim_end_matches('\n').to_string())
        }
        _ => content,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.config.as_deref(), cli.data_dir)?;
    let format = &cli.format;

    let session = match &cli.command {
        Command::Login { url, username, password } => {
            let password = resolve_content(Some(password.clone())).unwrap_or_default();
            return commands::auth::run_login(&app, url.as_deref(), username, &password, format)
                .await;
        }
        Command::Logout => return commands::auth::run_logout(&app),
        Command::Status => return commands::auth::run_status(&app, format),
        _ => app.open_session()?,
    };

    match cli.command {
        Command::Login { .. } | Command::Logout | Command::Status => {}
        Command::Note(cmd) => match cmd {
            NoteCommand::List => commands::note::run_list(&session, format).await?,
            NoteCommand::New { title, content } => {
                commands::note::run_new(&session, &title, resolve_content(content), format).await?
            }
            NoteCommand::Show { id } => commands::note::run_show(&app, &session, &id, format).await?,
            NoteCommand::Edit { id, title, content } => {
                commands::note::run_edit(&session, &id, title, resolve_content(content), format)
                    .await?
            }
            NoteCommand::Delete { id } => commands::note::run_delete(&session, &id).await?,
            NoteCommand::Keywords { id, limit } => {
                commands::note::run_keywords(&app, &session, &id, limit, format).await?
            }
            NoteCommand::AddKeyword { id, text } => {
                commands::note::run_add_keyword(&session, &id, &text).await?
            }
            NoteCommand::Ocr { id, image } => {
                commands::note::run_ocr(&app, &session, &id, &image, format).await?
            }
        },
        Command::Card(cmd) => match cmd {
            CardCommand::List { tag } => {
                commands::card::run_list(&session, tag.as_deref(), format).await?
            }
            CardCommand::Add { question, answer, tags } => {
                commands::card::run_add(&session, &question, &answer, tags.as_deref(), format)
                    .await?
            }
            CardCommand::Delete { id } => commands::card::run_delete(&session, &id).await?,
            CardCommand::Due { tag } => commands::card::run_due(&session, tag, format).await?,
            // clap makes --remembered and --forgot mutually exclusive
            CardCommand::Review { id, tag, remembered, forgot: _, days } => {
                commands::card::run_review(
                    &app,
                    &session,
                    id.as_deref(),
                    tag,
                    remembered,
                    days.as_deref(),
                    format,
                )
                .await?
            }
        },
        Command::Streak => commands::streak::run(&session, format, use_color).await?,
        Command::Gratitude(cmd) => match cmd {
            GratitudeCommand::List => commands::gratitude::run_list(&session, format).await?,
            GratitudeCommand::Add { title, description } => {
                commands::gratitude::run_add(&session, &title, description.as_deref(), format)
                    .await?
            }
            GratitudeCommand::Edit { id, title, description } => {
                commands::gratitude::run_edit(
                    &session,
                    &id,
                    title.as_deref(),
                    description.as_deref(),
                    format,
                )
                .await?
            }
            GratitudeCommand::Delete { id } => {
                commands::gratitude::run_delete(&session, &id).await?
            }
            GratitudeCommand::Streak => {
                commands::gratitude::run_streak(&session, format, use_color).await?
            }
        },
        Command::Map(cmd) => match cmd {
            MapCommand::List => commands::map::run_list(&session, format).await?,
            MapCommand::Create { title } => {
                commands::map::run_create(&session, &title, format).await?
            }
            MapCommand::Delete { map } => commands::map::run_delete(&session, &map).await?,
            MapCommand::Show { map } => commands::map::run_show(&session, &map, format).await?,
            MapCommand::Promote { map, notes, keywords } => {
                commands::map::run_promote(&app, &session, &map, &notes, &keywords, format, use_color)
                    .await?
            }
            MapCommand::OpenNode { map, node, create } => {
                commands::map::run_open_node(&session, &map, &node, create, format).await?
            }
            MapCommand::Connect { map, source, target, label } => {
                commands::map::run_connect(
                    &app,
                    &session,
                    &map,
                    &source,
                    &target,
                    label.as_deref(),
                    use_color,
                )
                .await?
            }
            MapCommand::LabelEdge { map, edge, label } => {
                commands::map::run_label_edge(&app, &session, &map, &edge, &label, use_color)
                    .await?
            }
            MapCommand::DeleteNode { map, node } => {
                commands::map::run_delete_node(&app, &session, &map, &node, use_color).await?
            }
            MapCommand::AddText { map, text } => {
                commands::map::run_add_text(&app, &session, &map, &text, use_color).await?
            }
        },
    }

    if let Ok(session) = Arc::try_unwrap(session) {
        session.close();
    }
    Ok(())
}
