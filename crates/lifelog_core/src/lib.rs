//! Local-first data core for the lifelog productivity app.
//!
//! Notes, tasks, journal, mood and mind maps live in one SQLite store;
//! galaxy boards live in a JSON file next to it.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod db;
pub mod galaxy;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod text;
pub mod view;

pub use config::{ConfigError, CoreConfig};
pub use crypto::{AgeCipher, CipherError, ContentCipher};
pub use db::{open_db, open_db_in_memory, DbError};
pub use galaxy::{Galaxy, GalaxyConnection, GalaxyError, GalaxyNode, GalaxyStore};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::journal::JournalEntry;
pub use model::mind_map::{MindMap, MindNode};
pub use model::mood::{MoodEntry, MoodScale};
pub use model::note::Note;
pub use model::task::{Priority, Recurrence, Task};
pub use model::{EntityId, ValidationError};
pub use repo::generic::{Entity, Repository, SqliteRepository};
pub use repo::journal_repo::{JournalRepository, SqliteJournalRepository};
pub use repo::mind_map_repo::{
    MindMapRepository, NodeRepository, SqliteMindMapRepository, SqliteNodeRepository,
};
pub use repo::mood_repo::{MoodRepository, SqliteMoodRepository};
pub use repo::note_repo::{NoteListQuery, NoteRepository, SqliteNoteRepository};
pub use repo::query::{FetchOptions, Filter, Sort, SortDirection};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::journal_service::{JournalService, NewJournalEntry};
pub use service::mind_map_service::{MindMapService, MindMapServiceError};
pub use service::mood_service::{MoodService, MoodSummary};
pub use service::note_service::{NoteService, NoteServiceError, NotesListResult};
pub use service::task_service::{
    NewTask, TaskCompletion, TaskEdit, TaskService, TaskServiceError, TaskStats,
};
pub use text::{apply_enter, continue_list, EnterEdit, ListContinuation};
pub use view::{
    DashboardSnapshot, DashboardViewModel, LoadState, NotesViewModel, TaskFilter, TaskSort,
    TasksViewModel,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
