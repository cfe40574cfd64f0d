//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lifelog_core` linkage.
//! - Print dashboard figures and note pages for a store file without the
//!   Flutter shell.

use clap::{Parser, Subcommand};
use lifelog_core::db::open_db;
use lifelog_core::{
    CoreConfig, DashboardViewModel, GalaxyStore, NoteService, SqliteNoteRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "lifelog")]
#[command(version, about = "Smoke checks for the lifelog data core")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the core health-check reply
    Ping,
    /// Print the core crate version
    Version,
    /// Print dashboard figures for a store
    Stats {
        #[command(flatten)]
        store: StoreArgs,

        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one page of notes, newest first
    Notes {
        #[command(flatten)]
        store: StoreArgs,

        /// Only notes carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct StoreArgs {
    /// SQLite store file (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let rendered = match args.command {
        Command::Ping => Ok(format!("lifelog_core ping={}\n", lifelog_core::ping())),
        Command::Version => Ok(format!(
            "lifelog_core version={}\n",
            lifelog_core::core_version()
        )),
        Command::Stats { store, json } => render_stats(&store, json),
        Command::Notes { store, tag, offset } => render_notes(&store, tag, offset),
    };
    match rendered {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("command failed: {err}");
            ExitCode::FAILURE
        }
    }
}

struct Store {
    config: CoreConfig,
    db_path: PathBuf,
    conn: Connection,
}

/// `--db` wins over the config file's `db_path`.
fn open_store(args: &StoreArgs) -> CliResult<Store> {
    let config = match &args.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::from_env()?,
    };
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path.clone());
    let conn = open_db(&db_path)?;
    Ok(Store {
        config,
        db_path,
        conn,
    })
}

fn render_stats(args: &StoreArgs, json: bool) -> CliResult<String> {
    let store = open_store(args)?;
    let mut view = DashboardViewModel::new(&store.conn);
    let snapshot = view.refresh(lifelog_core::clock::now_ms()).clone();
    if let Some(message) = failure_message(&view) {
        eprintln!("warning: some figures failed to load: {message}");
    }

    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&snapshot)?));
    }
    let galaxies = GalaxyStore::from_config(&store.config).load()?;

    let mut out = String::new();
    writeln!(out, "db={}", store.db_path.display())?;
    writeln!(out, "notes={}", snapshot.note_count)?;
    writeln!(
        out,
        "tasks total={} completed={} active={} overdue={} completion_rate={:.2}",
        snapshot.tasks.total,
        snapshot.tasks.completed,
        snapshot.tasks.active,
        snapshot.tasks.overdue,
        snapshot.tasks.completion_rate
    )?;
    writeln!(out, "journal_streak={}", snapshot.journal_streak)?;
    match snapshot.mood_average_7d {
        Some(score) => writeln!(out, "mood_score_7d={score:.2}")?,
        None => writeln!(out, "mood_score_7d=none")?,
    }
    writeln!(out, "galaxies={}", galaxies.len())?;
    Ok(out)
}

fn render_notes(args: &StoreArgs, tag: Option<String>, offset: u32) -> CliResult<String> {
    let store = open_store(args)?;
    let repo = SqliteNoteRepository::try_new(&store.conn)?;
    let service = NoteService::from_config(repo, &store.config);
    let page = service.list_notes(tag, None, offset)?;

    let mut out = String::new();
    for note in &page.items {
        writeln!(out, "{} {}", note.id, note.title)?;
    }
    writeln!(out, "shown={} page_size={}", page.items.len(), page.applied_limit)?;
    Ok(out)
}

fn failure_message(view: &DashboardViewModel<'_>) -> Option<String> {
    match view.state() {
        lifelog_core::LoadState::Failed(message) => Some(message.clone()),
        _ => None,
    }
}
