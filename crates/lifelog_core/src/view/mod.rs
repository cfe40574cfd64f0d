//! Screen-level view-models.
//!
//! # Responsibility
//! - Republish repository results as plain screen state.
//! - Apply in-memory search, filters and sorting.
//!
//! # Invariants
//! - Repository and service errors never escape a view-model: they are
//!   logged, replaced with a safe default (empty list, `0`, `0.0`, `false`,
//!   `None`) and surfaced as [`LoadState::Failed`].

use log::error;
use serde::Serialize;
use std::fmt::Display;

mod dashboard;
mod notes_view;
mod tasks_view;

pub use dashboard::{DashboardSnapshot, DashboardViewModel};
pub use notes_view::NotesViewModel;
pub use tasks_view::{TaskFilter, TaskSort, TasksViewModel};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Empty,
    Failed(String),
}

impl LoadState {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// `Loaded` or `Empty` depending on whether anything was found.
    pub fn settled(is_empty: bool) -> Self {
        if is_empty {
            Self::Empty
        } else {
            Self::Loaded
        }
    }
}

/// Unwraps `result`, or logs the error, marks `state` failed and returns `fallback`.
pub(crate) fn recover<T, E: Display>(
    result: Result<T, E>,
    fallback: T,
    screen: &'static str,
    action: &'static str,
    state: &mut LoadState,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(
                "event=view_{} module=view status=error screen={} error={}",
                action, screen, err
            );
            if !state.is_failed() {
                *state = LoadState::Failed(err.to_string());
            }
            fallback
        }
    }
}

/// Case-insensitive substring match; an empty needle matches everything.
pub(crate) fn matches_search(haystacks: &[&str], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
}
