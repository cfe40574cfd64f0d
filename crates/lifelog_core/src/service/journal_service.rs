//! Journal use-cases: writing entries, streaks and mood averages.
//!
//! Day boundaries are UTC days.

use crate::clock::{day_range_ms, MILLIS_PER_DAY};
use crate::model::journal::JournalEntry;
use crate::model::EntityId;
use crate::repo::journal_repo::JournalRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::{Days, NaiveDate};
use std::collections::HashSet;

/// Input for [`JournalService::write_entry`].
#[derive(Debug, Clone, Default)]
pub struct NewJournalEntry {
    pub content: String,
    pub mood_level: Option<u8>,
    pub is_dream: bool,
    pub is_gratitude: bool,
    pub prompt: Option<String>,
}

pub struct JournalService<R: JournalRepository> {
    repo: R,
}

impl<R: JournalRepository> JournalService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn write_entry(&self, input: NewJournalEntry) -> RepoResult<JournalEntry> {
        let mut entry = JournalEntry::new(input.content);
        entry.mood_level = input.mood_level;
        entry.is_dream = input.is_dream;
        entry.is_gratitude = input.is_gratitude;
        entry.prompt = input
            .prompt
            .map(|prompt| prompt.trim().to_string())
            .filter(|prompt| !prompt.is_empty());
        self.repo.save(&entry)?;
        Ok(entry)
    }

    /// Replaces content and mood of an existing entry.
    pub fn edit_entry(
        &self,
        id: EntityId,
        content: impl Into<String>,
        mood_level: Option<u8>,
    ) -> RepoResult<JournalEntry> {
        let mut entry = self.repo.fetch_by_id(id)?.ok_or(RepoError::NotFound(id))?;
        entry.update(content);
        entry.set_mood(mood_level);
        self.repo.save(&entry)?;
        Ok(entry)
    }

    pub fn delete_entry(&self, id: EntityId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    pub fn entries_on(&self, day: NaiveDate) -> RepoResult<Vec<JournalEntry>> {
        let (start, end) = day_range_ms(day);
        self.repo.entries_between(start, end)
    }

    /// Consecutive days with at least one entry, ending on `day`.
    ///
    /// A day without an entry yet does not break the streak: counting then
    /// starts from the previous day.
    pub fn streak_ending(&self, day: NaiveDate) -> RepoResult<u32> {
        let days: HashSet<NaiveDate> = self.repo.entry_days()?.into_iter().collect();
        let mut cursor = if days.contains(&day) {
            Some(day)
        } else {
            day.checked_sub_days(Days::new(1))
        };

        let mut streak = 0;
        while let Some(current) = cursor.filter(|current| days.contains(current)) {
            streak += 1;
            cursor = current.checked_sub_days(Days::new(1));
        }
        Ok(streak)
    }

    /// Mean journal mood over the `days` days ending with `today`.
    pub fn average_mood_last_days(&self, today: NaiveDate, days: u32) -> RepoResult<Option<f64>> {
        if days == 0 {
            return Ok(None);
        }
        let (_, end) = day_range_ms(today);
        let start = end - i64::from(days) * MILLIS_PER_DAY;
        self.repo.average_mood_between(start, end)
    }
}
