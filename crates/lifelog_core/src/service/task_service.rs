//! Task use-case service.
//!
//! # Responsibility
//! - Create, edit, complete and reprioritize tasks.
//! - Spawn the next occurrence when a recurring task is completed.
//! - Produce task statistics snapshots.
//!
//! # Invariants
//! - Completing a recurring task with a due date writes the completion and
//!   exactly one successor in one transaction.
//! - Completing an already-completed task is a no-op and spawns nothing.

use crate::clock::{day_range_ms, now_ms};
use crate::model::task::{Priority, Recurrence, Task};
use crate::model::EntityId;
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TaskServiceError {
    TaskNotFound(EntityId),
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::TaskNotFound(_) => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Input for [`TaskService::create_task`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub notes: String,
    pub priority: Priority,
    pub due_at: Option<i64>,
    pub recurrence: Option<Recurrence>,
    pub category: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_at: Option<Option<i64>>,
    pub recurrence: Option<Option<Recurrence>>,
    pub category: Option<Option<String>>,
}

/// Outcome of completing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub completed: Task,
    /// Next occurrence spawned for a recurring task.
    pub next: Option<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
    pub overdue: u64,
    pub completion_rate: f64,
}

pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create_task(&self, input: NewTask) -> Result<Task, TaskServiceError> {
        let mut task = Task::new(input.title);
        task.notes = input.notes;
        task.priority = input.priority;
        task.due_at = input.due_at;
        task.recurrence = input.recurrence;
        task.category = normalize_category(input.category);
        self.repo.save(&task)?;
        Ok(task)
    }

    pub fn edit_task(&self, id: EntityId, edit: TaskEdit) -> Result<Task, TaskServiceError> {
        let mut task = self.require(id)?;
        if let Some(title) = edit.title {
            task.rename(title);
        }
        if let Some(notes) = edit.notes {
            task.notes = notes;
        }
        if let Some(due_at) = edit.due_at {
            task.due_at = due_at;
        }
        if let Some(recurrence) = edit.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(category) = edit.category {
            task.category = normalize_category(category);
        }
        task.touch();
        self.repo.save(&task)?;
        Ok(task)
    }

    /// Marks a task done, spawning the next occurrence when it recurs.
    pub fn complete_task(&self, id: EntityId) -> Result<TaskCompletion, TaskServiceError> {
        let mut task = self.require(id)?;
        if task.is_completed {
            return Ok(TaskCompletion {
                completed: task,
                next: None,
            });
        }

        task.complete_at(now_ms());
        let next = task.next_occurrence();
        if next.is_some() {
            // The successor carries the rule from here on.
            task.recurrence = None;
        }
        self.repo.save_completion(&task, next.as_ref())?;
        info!(
            "event=task_complete module=service status=ok spawned_next={}",
            next.is_some()
        );
        Ok(TaskCompletion {
            completed: task,
            next,
        })
    }

    pub fn uncomplete_task(&self, id: EntityId) -> Result<Task, TaskServiceError> {
        let mut task = self.require(id)?;
        if task.is_completed {
            task.uncomplete();
            self.repo.save(&task)?;
        }
        Ok(task)
    }

    /// Flips completion; returns the task in its new state.
    pub fn toggle_completion(&self, id: EntityId) -> Result<Task, TaskServiceError> {
        let task = self.require(id)?;
        if task.is_completed {
            self.uncomplete_task(id)
        } else {
            Ok(self.complete_task(id)?.completed)
        }
    }

    pub fn reprioritize(&self, id: EntityId, priority: Priority) -> Result<Task, TaskServiceError> {
        let mut task = self.require(id)?;
        task.set_priority(priority);
        self.repo.save(&task)?;
        Ok(task)
    }

    pub fn delete_task(&self, id: EntityId) -> Result<(), TaskServiceError> {
        self.repo.delete(id)?;
        Ok(())
    }

    /// Tasks due on one UTC day, completed or not.
    pub fn tasks_due_on(&self, day: NaiveDate) -> RepoResult<Vec<Task>> {
        let (start, end) = day_range_ms(day);
        self.repo.tasks_due_between(start, end)
    }

    pub fn stats(&self, now: i64) -> RepoResult<TaskStats> {
        let total = self.repo.total_count()?;
        let completed = self.repo.completed_count()?;
        let overdue = self.repo.overdue_count(now)?;
        Ok(TaskStats {
            total,
            completed,
            active: total.saturating_sub(completed),
            overdue,
            completion_rate: self.repo.completion_rate()?,
        })
    }

    fn require(&self, id: EntityId) -> Result<Task, TaskServiceError> {
        self.repo
            .fetch_by_id(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
