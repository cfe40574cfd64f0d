//! Task repository: domain queries and completion statistics.
//!
//! # Invariants
//! - Rows violating the completion invariant fail to load (`Task::validate`).
//! - Statistics are computed with separate `COUNT(*)` queries.

use super::generic::{
    delegate_repository, id_value, optional_text, read_bool, read_id, read_small, upsert, Entity,
    Repository, SqliteRepository,
};
use super::query::{FetchOptions, Filter, Sort};
use super::{RepoError, RepoResult};
use crate::model::task::{Priority, Recurrence, Task};
use crate::model::{EntityId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "notes",
        "priority",
        "due_at",
        "is_completed",
        "completed_at",
        "is_recurring",
        "recurrence_pattern",
        "category",
        "created_at",
        "updated_at",
    ];
    const DEFAULT_SORT: &'static [Sort] = &[Sort::desc("created_at")];

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Task::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id),
            Value::Text(self.title.clone()),
            Value::Text(self.notes.clone()),
            Value::Integer(i64::from(self.priority.as_u8())),
            self.due_at.map_or(Value::Null, Value::Integer),
            Value::from(self.is_completed),
            self.completed_at.map_or(Value::Null, Value::Integer),
            Value::from(self.recurrence.is_some()),
            optional_text(self.recurrence.map(Recurrence::as_str)),
            optional_text(self.category.as_deref()),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let priority = Priority::try_from(read_small(row, "priority")?)?;
        let is_recurring = read_bool(row, "is_recurring")?;
        let pattern: Option<String> = row.get("recurrence_pattern")?;
        let recurrence = match (is_recurring, pattern) {
            (true, Some(value)) => Some(Recurrence::parse(&value)?),
            (false, None) => None,
            (flag, value) => {
                return Err(RepoError::InvalidData(format!(
                    "is_recurring={flag} disagrees with recurrence_pattern={value:?} in tasks"
                )));
            }
        };

        let task = Task {
            id: read_id(row, "id")?,
            title: row.get("title")?,
            notes: row.get("notes")?,
            priority,
            due_at: row.get("due_at")?,
            is_completed: read_bool(row, "is_completed")?,
            completed_at: row.get("completed_at")?,
            recurrence,
            category: row.get("category")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Task queries layered on the generic repository.
pub trait TaskRepository: Repository<Task> {
    /// Open tasks: highest priority first, then earliest due date.
    fn active_tasks(&self) -> RepoResult<Vec<Task>>;
    /// Completed tasks, most recently completed first.
    fn completed_tasks(&self) -> RepoResult<Vec<Task>>;
    fn tasks_with_priority_at_least(&self, threshold: Priority) -> RepoResult<Vec<Task>>;
    /// Tasks due in `[start, end)`, completed or not.
    fn tasks_due_between(&self, start: i64, end: i64) -> RepoResult<Vec<Task>>;
    /// Open tasks whose due date is before `now`.
    fn overdue_tasks(&self, now: i64) -> RepoResult<Vec<Task>>;
    fn tasks_in_category(&self, category: &str) -> RepoResult<Vec<Task>>;
    /// Distinct non-null categories, sorted case-insensitively.
    fn categories(&self) -> RepoResult<Vec<String>>;
    fn total_count(&self) -> RepoResult<u64>;
    fn completed_count(&self) -> RepoResult<u64>;
    fn overdue_count(&self, now: i64) -> RepoResult<u64>;
    /// Persists a completed task and its recurrence successor atomically.
    fn save_completion(&self, completed: &Task, successor: Option<&Task>) -> RepoResult<()>;

    /// `completed / total`, or `0.0` for an empty store.
    fn completion_rate(&self) -> RepoResult<f64> {
        let total = self.total_count()?;
        if total == 0 {
            return Ok(0.0);
        }
        let completed = self.completed_count()?;
        Ok(completed as f64 / total as f64)
    }
}

pub struct SqliteTaskRepository<'conn> {
    inner: SqliteRepository<'conn, Task>,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            inner: SqliteRepository::try_new(conn)?,
        })
    }
}

delegate_repository!(SqliteTaskRepository, Task);

fn open_filter() -> Filter {
    Filter::all().eq("is_completed", false)
}

fn overdue_filter(now: i64) -> Filter {
    open_filter().is_not_null("due_at").lt("due_at", now)
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn active_tasks(&self) -> RepoResult<Vec<Task>> {
        let options = FetchOptions::sorted_by(Sort::desc("priority"))
            .then_by(Sort::asc("due_at").nulls_last())
            .then_by(Sort::desc("created_at"));
        self.inner.fetch(&open_filter(), &options)
    }

    fn completed_tasks(&self) -> RepoResult<Vec<Task>> {
        self.inner.fetch(
            &Filter::all().eq("is_completed", true),
            &FetchOptions::sorted_by(Sort::desc("completed_at")),
        )
    }

    fn tasks_with_priority_at_least(&self, threshold: Priority) -> RepoResult<Vec<Task>> {
        self.inner.fetch(
            &Filter::all().gte("priority", i64::from(threshold.as_u8())),
            &FetchOptions::sorted_by(Sort::desc("priority")).then_by(Sort::desc("created_at")),
        )
    }

    fn tasks_due_between(&self, start: i64, end: i64) -> RepoResult<Vec<Task>> {
        self.inner.fetch(
            &Filter::all().between("due_at", start, end),
            &FetchOptions::sorted_by(Sort::asc("due_at")),
        )
    }

    fn overdue_tasks(&self, now: i64) -> RepoResult<Vec<Task>> {
        self.inner.fetch(
            &overdue_filter(now),
            &FetchOptions::sorted_by(Sort::asc("due_at")),
        )
    }

    fn tasks_in_category(&self, category: &str) -> RepoResult<Vec<Task>> {
        self.inner.fetch(
            &Filter::all().eq("category", category.to_string()),
            &FetchOptions::default(),
        )
    }

    fn categories(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.inner.connection().prepare(
            "SELECT DISTINCT category
             FROM tasks
             WHERE category IS NOT NULL
             ORDER BY category COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(row.get(0)?);
        }
        Ok(categories)
    }

    fn total_count(&self) -> RepoResult<u64> {
        self.inner.count(&Filter::all())
    }

    fn completed_count(&self) -> RepoResult<u64> {
        self.inner.count(&Filter::all().eq("is_completed", true))
    }

    fn overdue_count(&self, now: i64) -> RepoResult<u64> {
        self.inner.count(&overdue_filter(now))
    }

    fn save_completion(&self, completed: &Task, successor: Option<&Task>) -> RepoResult<()> {
        completed.validate()?;
        if let Some(next) = successor {
            next.validate()?;
        }

        let conn = self.inner.connection();
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        upsert(&tx, completed)?;
        if let Some(next) = successor {
            upsert(&tx, next)?;
        }
        tx.commit()?;
        Ok(())
    }
}
