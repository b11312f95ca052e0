mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use recall_lib::review::Rating;

#[derive(Parser)]
#[command(name = "recall-cli", about = "Spaced-repetition notes and reviews", version)]
struct Cli {
    /// Config file (default: <config dir>/recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config and RECALL_DB
    #[arg(long, global = true)]
    db: Option<PathBuf>,

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

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Answer {
    Again,
    Hard,
    Good,
    Easy,
    /// Reschedule without grading recall
    Manual,
}

impl From<Answer> for Rating {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Again => Rating::Again,
            Answer::Hard => Rating::Hard,
            Answer::Good => Rating::Good,
            Answer::Easy => Rating::Easy,
            Answer::Manual => Rating::Manual,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Manage collections
    #[command(subcommand)]
    Collection(CollectionCommand),

    /// Create, edit and list notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Show the reviewables due next
    Next {
        /// Restrict to these collection ids
        #[arg(long = "collection")]
        collections: Vec<i64>,
        /// Include reviewables that are not due yet
        #[arg(long)]
        all: bool,
        /// Maximum results
        #[arg(long, default_value = "1")]
        limit: usize,
    },

    /// Record an answer for a reviewable
    Review {
        /// Reviewable id
        reviewable: i64,
        /// How well it was recalled
        answer: Answer,
        /// Time spent answering, in milliseconds
        #[arg(long, default_value = "1000")]
        duration_ms: i64,
    },

    /// Count reviewables by state
    Stats {
        /// Restrict to these collection ids
        #[arg(long = "collection")]
        collections: Vec<i64>,
    },
}

#[derive(Subcommand)]
enum CollectionCommand {
    /// Create a collection
    Add {
        name: String,
    },

    /// List collections
    List,
}

#[derive(Subcommand)]
enum NoteCommand {
    /// Create a note
    Add {
        /// Collection ids (at least one)
        #[arg(long = "collection", required = true)]
        collections: Vec<i64>,
        /// Front field values, in order
        #[arg(long = "front", required = true)]
        front: Vec<String>,
        /// Back field values, in order
        #[arg(long = "back", required = true)]
        back: Vec<String>,
        /// Also quiz back → front
        #[arg(long)]
        reversible: bool,
        /// Quiz each answer field on its own
        #[arg(long)]
        separable: bool,
    },

    /// Edit a note; omitted options are left unchanged
    Edit {
        id: i64,
        /// Replace the front fields (requires --back)
        #[arg(long = "front", requires = "back")]
        front: Vec<String>,
        /// Replace the back fields (requires --front)
        #[arg(long = "back", requires = "front")]
        back: Vec<String>,
        /// Replace the collections
        #[arg(long = "collection")]
        collections: Vec<i64>,
        #[arg(long)]
        reversible: Option<bool>,
        #[arg(long)]
        separable: Option<bool>,
    },

    /// Show a note with its reviewables
    Show {
        id: i64,
    },

    /// List notes page by page
    List {
        /// Only these note ids
        #[arg(long = "id")]
        ids: Vec<i64>,
        /// Only notes in these collections
        #[arg(long = "collection")]
        collections: Vec<i64>,
        /// Start of the page (a `next` value from a previous page)
        #[arg(long)]
        cursor: Option<i64>,
        /// Page size (default from config)
        #[arg(long)]
        limit: Option<usize>,
        /// Newest first
        #[arg(long)]
        desc: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if app::is_invalid_input(&err) => {
            eprintln!("Invalid input: {:#}", err);
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let mut app = app::App::new(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Command::Collection(subcmd) => match subcmd {
            CollectionCommand::Add { name } => {
                commands::collection::run_add(&mut app, &name, &cli.format)?;
            }
            CollectionCommand::List => {
                commands::collection::run_list(&app, &cli.format)?;
            }
        },
        Command::Note(subcmd) => match subcmd {
            NoteCommand::Add { collections, front, back, reversible, separable } => {
                let input = commands::note::NoteInput {
                    collections,
                    front,
                    back,
                    reversible,
                    separable,
                };
                commands::note::run_add(&mut app, input, &cli.format, use_color)?;
            }
            NoteCommand::Edit { id, front, back, collections, reversible, separable } => {
                let sides = (!front.is_empty()).then(|| vec![front, back]);
                let collections = (!collections.is_empty()).then_some(collections);
                commands::note::run_edit(
                    &mut app,
                    id,
                    sides,
                    collections,
                    reversible,
                    separable,
                    &cli.format,
                    use_color,
                )?;
            }
            NoteCommand::Show { id } => {
                commands::note::run_show(&app, id, &cli.format, use_color)?;
            }
            NoteCommand::List { ids, collections, cursor, limit, desc } => {
                commands::note::run_list(
                    &app,
                    ids,
                    collections,
                    cursor,
                    limit,
                    desc,
                    &cli.format,
                    use_color,
                )?;
            }
        },
        Command::Next { collections, all, limit } => {
            commands::next::run(&app, collections, !all, limit, &cli.format, use_color)?;
        }
        Command::Review { reviewable, answer, duration_ms } => {
            commands::review::run(&mut app, reviewable, answer.into(), duration_ms, &cli.format, use_color)?;
        }
        Command::Stats { collections } => {
            commands::review::run_stats(&app, collections, &cli.format)?;
        }
    }

    Ok(())
}
