use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run_add(app: &mut App, name: &str, format: &OutputFormat) -> Result<()> {
    let collection = app
        .db
        .create_collection(name)
        .context("Failed to create collection")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&collection)?),
        OutputFormat::Plain => println!("Created collection \"{}\" (id {})", collection.name, collection.id),
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let collections = app.db.list_collections().context("Failed to list collections")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&collections)?),
        OutputFormat::Plain => {
            if collections.is_empty() {
                println!("No collections.");
                return Ok(());
            }

            let name_width = collections.iter().map(|c| c.name.len()).max().unwrap_or(4).clamp(4, 40);
            println!("{:>5} {:<nw$} {}", "ID", "Name", "Created", nw = name_width);
            println!("{} {} {}",
                "\u{2500}".repeat(5),
                "\u{2500}".repeat(name_width),
                "\u{2500}".repeat(10));
            for collection in &collections {
                println!("{:>5} {:<nw$} {}",
                    collection.id,
                    collection.name,
                    collection.created_at.format("%Y-%m-%d"),
                    nw = name_width);
            }
        }
    }

    Ok(())
}
