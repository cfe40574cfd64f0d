//! Task domain model.
//!
//! # Invariants
//! - `completed_at.is_some() == is_completed`; only [`Task::complete_at`] and
//!   [`Task::uncomplete`] flip completion state.
//! - Priority is one of four levels on a `0..=3` scale.

use super::{ensure_id, ensure_title, EntityId, ValidationError};
use crate::clock::now_ms;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(ValidationError::PriorityOutOfRange(other)),
        }
    }
}

/// Repeat rule for recurring tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(ValidationError::UnknownRecurrence(value.to_string())),
        }
    }

    /// Advances an epoch-ms due date by one period.
    ///
    /// Month arithmetic clamps to the last day of shorter months.
    pub fn advance(self, due_at: i64) -> Option<i64> {
        let due = DateTime::<Utc>::from_timestamp_millis(due_at)?;
        let next = match self {
            Self::Daily => due.checked_add_signed(Duration::days(1)),
            Self::Weekly => due.checked_add_signed(Duration::weeks(1)),
            Self::Monthly => due.checked_add_months(Months::new(1)),
            Self::Yearly => due.checked_add_months(Months::new(12)),
        }?;
        Some(next.timestamp_millis())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub notes: String,
    pub priority: Priority,
    pub due_at: Option<i64>,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
    pub recurrence: Option<Recurrence>,
    /// Tab/category the task is filed under.
    pub category: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            title: title.into().trim().to_string(),
            notes: String::new(),
            priority: Priority::None,
            due_at: None,
            is_completed: false,
            completed_at: None,
            recurrence: None,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self) {
        self.complete_at(now_ms());
    }

    /// Marks the task done at `at`. Completing a done task keeps the first stamp.
    pub fn complete_at(&mut self, at: i64) {
        if self.is_completed {
            return;
        }
        self.is_completed = true;
        self.completed_at = Some(at);
        self.touch();
    }

    pub fn uncomplete(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
        self.touch();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.touch();
    }

    pub fn reschedule(&mut self, due_at: Option<i64>) {
        self.due_at = due_at;
        self.touch();
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into().trim().to_string();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at);
    }

    pub fn is_overdue(&self, now: i64) -> bool {
        !self.is_completed && self.due_at.is_some_and(|due| due < now)
    }

    pub fn is_due_within(&self, start: i64, end: i64) -> bool {
        self.due_at.is_some_and(|due| due >= start && due < end)
    }

    /// Builds the next open occurrence of a recurring task, if any.
    ///
    /// Requires both a recurrence rule and a due date; the successor gets a
    /// fresh id and the advanced due date.
    pub fn next_occurrence(&self) -> Option<Task> {
        let recurrence = self.recurrence?;
        let next_due = recurrence.advance(self.due_at?)?;
        let mut next = Task::new(self.title.clone());
        next.notes = self.notes.clone();
        next.priority = self.priority;
        next.category = self.category.clone();
        next.recurrence = Some(recurrence);
        next.due_at = Some(next_due);
        Some(next)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(self.id)?;
        ensure_title(&self.title)?;
        if self.is_completed != self.completed_at.is_some() {
            return Err(ValidationError::CompletionMismatch {
                is_completed: self.is_completed,
            });
        }
        Ok(())
    }
}
