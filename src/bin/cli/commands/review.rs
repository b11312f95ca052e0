use anyhow::{Context, Result};
use chrono::{Local, Utc};

use recall_lib::review::{format_interval, IntervalScheduler, Rating, RecordReview, ReviewFilter};

use crate::app::App;
use crate::render::terminal::Color;
use crate::OutputFormat;

pub fn run(
    app: &mut App,
    reviewable: i64,
    rating: Rating,
    duration_ms: i64,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let input = RecordReview {
        reviewable,
        rating,
        duration_ms,
        reviewed_at: Local::now().fixed_offset(),
    };

    let config = app.config.review.clone();
    let recorded = app
        .db
        .record_review(&input, &config, &IntervalScheduler)
        .with_context(|| format!("Failed to record review for reviewable {}", reviewable))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recorded)?),
        OutputFormat::Plain => {
            let next = format_interval(recorded.snapshot.due - Utc::now());
            let line = format!("Recorded {:?} for reviewable {}; next review in {}", rating, reviewable, next);
            if use_color {
                println!("{}{}{}", Color::GREEN, line, Color::RESET);
            } else {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

pub fn run_stats(app: &App, collections: Vec<i64>, format: &OutputFormat) -> Result<()> {
    let filter = ReviewFilter {
        collections,
        due: true,
    };
    let stats = app.db.review_stats(&filter).context("Failed to count reviewables")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => {
            println!("Total:      {}", stats.total);
            println!("Due now:    {}", stats.due);
            println!("New:        {}", stats.new);
            println!("Learning:   {}", stats.learning);
            println!("Review:     {}", stats.review);
            println!("Relearning: {}", stats.relearning);
        }
    }

    Ok(())
}
