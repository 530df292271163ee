use anyhow::{Context, Result};

use mapmynotes_lib::storage::StoreSession;
use mapmynotes_lib::streaks::{month_calendar, stats};

use crate::app::App;
use crate::render::terminal::{render_calendar, render_streak_stats};
use crate::OutputFormat;

/// Review streak statistics and the current month
pub async fn run(session: &StoreSession, format: &OutputFormat, use_color: bool) -> Result<()> {
    let record = session.load_streak().await.context("Failed to load streak")?;
    let today = App::today();
    let stats = stats(&record, today);
    let calendar = month_calendar(&record, today);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "stats": stats,
                "calendar": calendar,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_streak_stats(&stats, use_color));
            println!();
            println!("{}", render_calendar(&calendar, today, use_color));
        }
    }
    Ok(())
}
