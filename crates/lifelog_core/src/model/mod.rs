//! Domain records for notes, tasks, journal, mood and mind maps.
//!
//! # Responsibility
//! - Define the canonical shapes persisted by the repository layer.
//! - Own lifecycle mutators (`update`, `complete`, `seal`) that keep
//!   timestamps and flags consistent.
//!
//! # Invariants
//! - Every record is identified by a non-nil UUID.
//! - Mutators re-stamp `updated_at`; records are hard-deleted, never
//!   tombstoned.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod journal;
pub mod mind_map;
pub mod mood;
pub mod note;
pub mod task;

/// Stable identifier shared by every persisted entity.
pub type EntityId = Uuid;

/// Invariant violations detected before a record is written or after it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is the nil UUID.
    NilId,
    /// Title is empty after trimming.
    BlankTitle,
    /// Task priority outside `0..=3`.
    PriorityOutOfRange(u8),
    /// `completed_at` presence disagrees with `is_completed`.
    CompletionMismatch { is_completed: bool },
    /// Recurring flag set without a pattern, or the reverse.
    UnknownRecurrence(String),
    /// Note flagged encrypted but content is not a sealed envelope.
    UnsealedEncryptedContent,
    /// Mood or journal level outside `1..=max`.
    LevelOutOfRange { level: u8, max: u8 },
    /// Mood scale name is not recognized.
    UnknownMoodScale(String),
    /// Node references itself as parent.
    SelfParent(EntityId),
    /// Node coordinates are NaN or infinite.
    NonFiniteCoordinate,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::PriorityOutOfRange(value) => {
                write!(f, "priority {value} is outside the 0..=3 scale")
            }
            Self::CompletionMismatch { is_completed } => write!(
                f,
                "completed_at must be set if and only if is_completed (is_completed={is_completed})"
            ),
            Self::UnknownRecurrence(value) => write!(f, "unknown recurrence pattern `{value}`"),
            Self::UnsealedEncryptedContent => {
                write!(f, "encrypted note content is not a sealed envelope")
            }
            Self::LevelOutOfRange { level, max } => {
                write!(f, "level {level} is outside the 1..={max} scale")
            }
            Self::UnknownMoodScale(value) => write!(f, "unknown mood scale `{value}`"),
            Self::SelfParent(id) => write!(f, "node {id} cannot be its own parent"),
            Self::NonFiniteCoordinate => write!(f, "node coordinates must be finite"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn ensure_id(id: EntityId) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilId);
    }
    Ok(())
}

pub(crate) fn ensure_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(())
}
