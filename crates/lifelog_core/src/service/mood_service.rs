//! Mood check-in use-cases.

use crate::clock::{day_range_ms, MILLIS_PER_DAY};
use crate::model::mood::{MoodEntry, MoodScale};
use crate::repo::mood_repo::MoodRepository;
use crate::repo::RepoResult;
use chrono::NaiveDate;
use serde::Serialize;

/// Aggregates over one time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSummary {
    pub entry_count: u64,
    /// Mean of [`MoodEntry::normalized_score`] across both scales.
    pub average_score: Option<f64>,
    pub five_point_average: Option<f64>,
    pub ten_point_average: Option<f64>,
    pub latest: Option<MoodEntry>,
}

pub struct MoodService<R: MoodRepository> {
    repo: R,
}

impl<R: MoodRepository> MoodService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records one check-in; the level is validated against `scale`.
    pub fn log_mood(
        &self,
        level: u8,
        scale: MoodScale,
        emoji: Option<String>,
        notes: Option<String>,
    ) -> RepoResult<MoodEntry> {
        let mut entry = MoodEntry::new(level, scale)?;
        entry.emoji = emoji.filter(|value| !value.trim().is_empty());
        entry.notes = notes.filter(|value| !value.trim().is_empty());
        self.repo.save(&entry)?;
        Ok(entry)
    }

    pub fn latest(&self) -> RepoResult<Option<MoodEntry>> {
        self.repo.latest()
    }

    /// Summary of entries recorded in `[start, end)`.
    pub fn summary(&self, start: i64, end: i64) -> RepoResult<MoodSummary> {
        let entries = self.repo.entries_between(start, end)?;
        let average_score = if entries.is_empty() {
            None
        } else {
            let total: f64 = entries.iter().map(MoodEntry::normalized_score).sum();
            Some(total / entries.len() as f64)
        };

        Ok(MoodSummary {
            entry_count: entries.len() as u64,
            average_score,
            five_point_average: self.repo.average_level(MoodScale::FivePoint, start, end)?,
            ten_point_average: self.repo.average_level(MoodScale::TenPoint, start, end)?,
            latest: entries.into_iter().next(),
        })
    }

    /// Summary over the `days` days ending with `today`.
    pub fn summary_last_days(&self, today: NaiveDate, days: u32) -> RepoResult<MoodSummary> {
        let (_, end) = day_range_ms(today);
        let start = end - i64::from(days) * MILLIS_PER_DAY;
        self.summary(start, end)
    }

    pub fn distribution(
        &self,
        scale: MoodScale,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<(u8, u64)>> {
        self.repo.level_distribution(scale, start, end)
    }
}
