use anyhow::{Context, Result};
use chrono::Utc;

use recall_lib::review::{preview_intervals, select_next_batch, IntervalScheduler, ReviewFilter};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(
    app: &App,
    collections: Vec<i64>,
    due_only: bool,
    limit: usize,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let filter = ReviewFilter {
        collections,
        due: due_only,
    };
    let now = Utc::now();
    let batch = select_next_batch(app.db.conn(), &filter, limit, now)
        .context("Failed to select due reviewables")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&batch)?),
        OutputFormat::Plain => {
            if batch.is_empty() {
                println!("Nothing due.");
                return Ok(());
            }

            for (i, due) in batch.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                let preview = preview_intervals(&IntervalScheduler, &app.config.review, due.snapshot.as_ref(), now);
                println!("{}", terminal::render_due(due, &preview, now, use_color));
            }
        }
    }

    Ok(())
}
