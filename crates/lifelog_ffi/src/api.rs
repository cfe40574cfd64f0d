//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple: envelopes carry `ok` plus a message.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every DB-backed call opens the store resolved from `LIFELOG_DB_PATH`,
//!   falling back to a file in the system temp directory.

use lifelog_core::db::open_db;
use lifelog_core::{
    apply_enter, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, CoreConfig, DashboardViewModel, JournalService, LoadState, MoodScale,
    MoodService, NewJournalEntry, NewTask, NoteService, Priority, Recurrence,
    SqliteJournalRepository, SqliteMoodRepository, SqliteNoteRepository, SqliteTaskRepository,
    TaskService,
};
use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const ENTRY_DB_FILE_NAME: &str = "lifelog_entry.sqlite3";
static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope for create/complete calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created or affected record.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, id: Uuid) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            message: message.into(),
        }
    }

    fn failure(call: &'static str, err: impl std::fmt::Display) -> Self {
        warn!("event=ffi_call module=ffi status=error call={}", call);
        Self {
            ok: false,
            id: None,
            message: format!("{call} failed: {err}"),
        }
    }
}

/// Dashboard figures flattened for the Dart side.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub note_count: u64,
    pub task_total: u64,
    pub task_completed: u64,
    pub task_overdue: u64,
    pub completion_rate: f64,
    pub journal_streak: u32,
    /// Mean normalized mood score over the last 7 days.
    pub mood_average_7d: Option<f64>,
    pub message: String,
}

/// Text and cursor after pressing Enter in the note editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorEnterResponse {
    pub text: String,
    /// Cursor position as a byte offset into `text`.
    pub cursor: u32,
}

/// Creates a note with markdown content.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn create_note(title: String, content: String) -> EntryActionResponse {
    let created = with_connection(|conn| {
        let repo = SqliteNoteRepository::try_new(conn).map_err(|err| err.to_string())?;
        NoteService::new(repo)
            .create_note(title, content)
            .map_err(|err| err.to_string())
    });
    match created {
        Ok(note) => EntryActionResponse::success("Note created.", note.id),
        Err(err) => EntryActionResponse::failure("create_note", err),
    }
}

/// Creates a task.
///
/// Input semantics:
/// - `priority`: `0..=3` (none, low, medium, high).
/// - `recurrence`: `daily|weekly|monthly|yearly`, or `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn create_task(
    title: String,
    priority: u8,
    due_epoch_ms: Option<i64>,
    recurrence: Option<String>,
) -> EntryActionResponse {
    let created = with_connection(|conn| {
        let mut input = NewTask::titled(title.trim());
        input.priority = Priority::try_from(priority).map_err(|err| err.to_string())?;
        input.due_at = due_epoch_ms;
        input.recurrence = recurrence
            .as_deref()
            .map(Recurrence::parse)
            .transpose()
            .map_err(|err| err.to_string())?;
        let repo = SqliteTaskRepository::try_new(conn).map_err(|err| err.to_string())?;
        TaskService::new(repo)
            .create_task(input)
            .map_err(|err| err.to_string())
    });
    match created {
        Ok(task) => EntryActionResponse::success("Task created.", task.id),
        Err(err) => EntryActionResponse::failure("create_task", err),
    }
}

/// Completes a task. The returned id is the spawned next occurrence when the
/// task recurs, otherwise the completed task itself.
#[flutter_rust_bridge::frb(sync)]
pub fn complete_task(task_id: String) -> EntryActionResponse {
    let completed = with_connection(|conn| {
        let id = parse_id(&task_id)?;
        let repo = SqliteTaskRepository::try_new(conn).map_err(|err| err.to_string())?;
        TaskService::new(repo)
            .complete_task(id)
            .map_err(|err| err.to_string())
    });
    match completed {
        Ok(completion) => match completion.next {
            Some(next) => EntryActionResponse::success("Task completed; next scheduled.", next.id),
            None => EntryActionResponse::success("Task completed.", completion.completed.id),
        },
        Err(err) => EntryActionResponse::failure("complete_task", err),
    }
}

/// Logs one mood check-in on a five-point or ten-point scale.
#[flutter_rust_bridge::frb(sync)]
pub fn log_mood(level: u8, ten_point: bool, emoji: Option<String>) -> EntryActionResponse {
    let scale = if ten_point {
        MoodScale::TenPoint
    } else {
        MoodScale::FivePoint
    };
    let logged = with_connection(|conn| {
        let repo = SqliteMoodRepository::try_new(conn).map_err(|err| err.to_string())?;
        MoodService::new(repo)
            .log_mood(level, scale, emoji, None)
            .map_err(|err| err.to_string())
    });
    match logged {
        Ok(entry) => EntryActionResponse::success("Mood logged.", entry.id),
        Err(err) => EntryActionResponse::failure("log_mood", err),
    }
}

/// Writes a journal entry. `mood_level` is `1..=10` when present.
#[flutter_rust_bridge::frb(sync)]
pub fn write_journal(
    content: String,
    mood_level: Option<u8>,
    is_dream: bool,
    is_gratitude: bool,
) -> EntryActionResponse {
    let written = with_connection(|conn| {
        let repo = SqliteJournalRepository::try_new(conn).map_err(|err| err.to_string())?;
        JournalService::new(repo)
            .write_entry(NewJournalEntry {
                content,
                mood_level,
                is_dream,
                is_gratitude,
                prompt: None,
            })
            .map_err(|err| err.to_string())
    });
    match written {
        Ok(entry) => EntryActionResponse::success("Journal entry saved.", entry.id),
        Err(err) => EntryActionResponse::failure("write_journal", err),
    }
}

/// Computes the dashboard snapshot as of `now_epoch_ms`.
///
/// # FFI contract
/// - Never panics; figures that failed to load are zero/`None` and
///   `ok=false` with the first failure in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard(now_epoch_ms: i64) -> DashboardResponse {
    let refreshed = with_connection(|conn| {
        let mut view = DashboardViewModel::new(conn);
        let snapshot = view.refresh(now_epoch_ms).clone();
        Ok((snapshot, view.state().clone()))
    });
    match refreshed {
        Ok((snapshot, state)) => {
            let (ok, message) = match state {
                LoadState::Failed(message) => (false, message),
                _ => (true, String::new()),
            };
            DashboardResponse {
                ok,
                note_count: snapshot.note_count,
                task_total: snapshot.tasks.total,
                task_completed: snapshot.tasks.completed,
                task_overdue: snapshot.tasks.overdue,
                completion_rate: snapshot.tasks.completion_rate,
                journal_streak: snapshot.journal_streak,
                mood_average_7d: snapshot.mood_average_7d,
                message,
            }
        }
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=dashboard");
            DashboardResponse {
                ok: false,
                note_count: 0,
                task_total: 0,
                task_completed: 0,
                task_overdue: 0,
                completion_rate: 0.0,
                journal_streak: 0,
                mood_average_7d: None,
                message: format!("dashboard failed: {err}"),
            }
        }
    }
}

/// Applies Enter at `cursor` with markdown list continuation.
///
/// # FFI contract
/// - Sync call, pure computation.
/// - Out-of-range cursors are clamped to the end of `text`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_enter(text: String, cursor: u32) -> EditorEnterResponse {
    let cursor = usize::try_from(cursor).unwrap_or(usize::MAX);
    let edit = apply_enter(&text, cursor);
    EditorEnterResponse {
        cursor: u32::try_from(edit.cursor).unwrap_or(u32::MAX),
        text: edit.text,
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| match CoreConfig::from_env() {
            Ok(config) if config.db_path.is_absolute() => config.db_path,
            _ => std::env::temp_dir().join(ENTRY_DB_FILE_NAME),
        })
        .clone()
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_entry_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("entry DB open failed: {err}"))?;
    f(&conn)
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid id `{raw}`: {err}"))
}
