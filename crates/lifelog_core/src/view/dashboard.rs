//! Analytics dashboard snapshot.

use super::{recover, LoadState};
use crate::clock::day_of;
use crate::repo::generic::Repository;
use crate::repo::journal_repo::SqliteJournalRepository;
use crate::repo::mood_repo::SqliteMoodRepository;
use crate::repo::note_repo::SqliteNoteRepository;
use crate::repo::query::Filter;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::service::journal_service::JournalService;
use crate::service::mood_service::MoodService;
use crate::service::task_service::{TaskService, TaskStats};
use rusqlite::Connection;
use serde::Serialize;

const MOOD_WINDOW_DAYS: u32 = 7;

/// Figures shown on the dashboard. Fields that failed to load hold defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub note_count: u64,
    pub tasks: TaskStats,
    pub journal_streak: u32,
    /// Mean normalized mood score (`0.0..=1.0`) over the last 7 days.
    pub mood_average_7d: Option<f64>,
    /// Mean journal mood (`1..=10`) over the last 7 days.
    pub journal_mood_average_7d: Option<f64>,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            note_count: 0,
            tasks: TaskStats {
                total: 0,
                completed: 0,
                active: 0,
                overdue: 0,
                completion_rate: 0.0,
            },
            journal_streak: 0,
            mood_average_7d: None,
            journal_mood_average_7d: None,
        }
    }
}

pub struct DashboardViewModel<'conn> {
    conn: &'conn Connection,
    snapshot: DashboardSnapshot,
    state: LoadState,
}

impl<'conn> DashboardViewModel<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            snapshot: DashboardSnapshot::default(),
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    /// Recomputes every figure as of `now`; failures fall back per field.
    pub fn refresh(&mut self, now: i64) -> &DashboardSnapshot {
        self.state = LoadState::Loading;
        let state = &mut self.state;
        let today = day_of(now).unwrap_or_else(crate::clock::today);

        let note_count = SqliteNoteRepository::try_new(self.conn)
            .and_then(|repo| repo.count(&Filter::all()));
        let note_count = recover(note_count, 0, "dashboard", "note_count", state);

        let tasks = SqliteTaskRepository::try_new(self.conn)
            .and_then(|repo| TaskService::new(repo).stats(now));
        let tasks = recover(
            tasks,
            DashboardSnapshot::default().tasks,
            "dashboard",
            "task_stats",
            state,
        );

        let journal = SqliteJournalRepository::try_new(self.conn).map(JournalService::new);
        let (journal_streak, journal_mood_average_7d) = match journal {
            Ok(service) => {
                let streak = service.streak_ending(today);
                let average = service.average_mood_last_days(today, MOOD_WINDOW_DAYS);
                (
                    recover(streak, 0, "dashboard", "journal_streak", state),
                    recover(average, None, "dashboard", "journal_mood", state),
                )
            }
            Err(err) => (recover(Err(err), 0, "dashboard", "journal", state), None),
        };

        let mood_average_7d = SqliteMoodRepository::try_new(self.conn)
            .and_then(|repo| MoodService::new(repo).summary_last_days(today, MOOD_WINDOW_DAYS))
            .map(|summary| summary.average_score);
        let mood_average_7d = recover(mood_average_7d, None, "dashboard", "mood", state);

        if !state.is_failed() {
            *state = LoadState::Loaded;
        }
        self.snapshot = DashboardSnapshot {
            note_count,
            tasks,
            journal_streak,
            mood_average_7d,
            journal_mood_average_7d,
        };
        &self.snapshot
    }
}
