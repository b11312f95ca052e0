use anyhow::{Context, Result};

use recall_lib::notes::{
    get_reviewables_for_note, CreateNote, NoteConfig, NoteEdit, NoteFilter, Pagination, SortOrder,
    UpdateNote,
};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub struct NoteInput {
    pub collections: Vec<i64>,
    pub front: Vec<String>,
    pub back: Vec<String>,
    pub reversible: bool,
    pub separable: bool,
}

fn print_edit(app: &App, edit: &NoteEdit, verb: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(edit)?),
        OutputFormat::Plain => {
            println!("{} note {}: {}", verb, edit.note.note.id, terminal::render_summary(&edit.summary, use_color));
            println!();
            println!("{}", terminal::render_note(&edit.note, use_color));
            let reviewables = get_reviewables_for_note(app.db.conn(), edit.note.note.id, true)?;
            let live: Vec<_> = reviewables.into_iter().filter(|r| !r.reviewable.archived).collect();
            println!("{}", terminal::render_reviewables(&edit.note, &live, use_color));
        }
    }
    Ok(())
}

pub fn run_add(app: &mut App, input: NoteInput, format: &OutputFormat, use_color: bool) -> Result<()> {
    let request = CreateNote {
        collections: input.collections,
        sides: vec![input.front, input.back],
        config: NoteConfig {
            reversible: input.reversible,
            separable: input.separable,
        },
    };

    let policy = app.config.synthesis.separable_policy;
    let edit = app.db.create_note(&request, policy).context("Failed to create note")?;
    print_edit(app, &edit, "Created", format, use_color)
}

#[allow(clippy::too_many_arguments)]
pub fn run_edit(
    app: &mut App,
    id: i64,
    sides: Option<Vec<Vec<String>>>,
    collections: Option<Vec<i64>>,
    reversible: Option<bool>,
    separable: Option<bool>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let request = UpdateNote {
        sides,
        reversible,
        separable,
        collections,
    };

    let policy = app.config.synthesis.separable_policy;
    let edit = app
        .db
        .update_note(id, &request, policy)
        .with_context(|| format!("Failed to update note {}", id))?;
    print_edit(app, &edit, "Updated", format, use_color)
}

pub fn run_show(app: &App, id: i64, format: &OutputFormat, use_color: bool) -> Result<()> {
    let note = app.db.get_note(id).with_context(|| format!("Failed to load note {}", id))?;
    let reviewables = get_reviewables_for_note(app.db.conn(), id, true)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "note": note,
                "reviewables": reviewables,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::render_note(&note, use_color));
            println!("{}", terminal::render_reviewables(&note, &reviewables, use_color));
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_list(
    app: &App,
    ids: Vec<i64>,
    collections: Vec<i64>,
    cursor: Option<i64>,
    limit: Option<usize>,
    desc: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let filter = NoteFilter { ids, collections };
    let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
    let page = Pagination {
        cursor,
        limit: limit.unwrap_or(app.config.listing.default_limit),
    };

    let result = app.db.list_notes(&filter, order, &page).context("Failed to list notes")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Plain => {
            if result.notes.is_empty() {
                println!("No notes.");
                return Ok(());
            }

            let width = 40;
            println!("{:>5} {:<w$} {:<w$}", "ID", "Front", "Back", w = width);
            println!("{} {} {}",
                "\u{2500}".repeat(5),
                "\u{2500}".repeat(width),
                "\u{2500}".repeat(width));
            for note in &result.notes {
                let sides = note.sides();
                println!("{:>5} {:<w$} {:<w$}",
                    note.note.id,
                    terminal::truncate(&sides[0].join(" | "), width),
                    terminal::truncate(&sides[1].join(" | "), width),
                    w = width);
            }

            if let Some(next) = result.cursor.next {
                let hint = format!("More notes: --cursor {}", next);
                if use_color {
                    println!("\n{}{}{}", Color::DIM, hint, Color::RESET);
                } else {
                    println!("\n{}", hint);
                }
            }
        }
    }

    Ok(())
}
