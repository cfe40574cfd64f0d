//! Mood check-in repository.

use super::generic::{
    delegate_repository, id_value, optional_text, read_id, read_small, Entity, Repository,
    SqliteRepository,
};
use super::query::{FetchOptions, Filter, Sort};
use super::RepoResult;
use crate::model::mood::{MoodEntry, MoodScale};
use crate::model::{EntityId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

impl Entity for MoodEntry {
    const TABLE: &'static str = "mood_entries";
    const COLUMNS: &'static [&'static str] =
        &["id", "level", "scale", "emoji", "notes", "recorded_at"];
    const DEFAULT_SORT: &'static [Sort] = &[Sort::desc("recorded_at")];

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        MoodEntry::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id),
            Value::Integer(i64::from(self.level)),
            Value::Text(self.scale.as_str().to_string()),
            optional_text(self.emoji.as_deref()),
            optional_text(self.notes.as_deref()),
            Value::Integer(self.recorded_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let scale_text: String = row.get("scale")?;
        let entry = MoodEntry {
            id: read_id(row, "id")?,
            level: read_small(row, "level")?,
            scale: MoodScale::parse(&scale_text)?,
            emoji: row.get("emoji")?,
            notes: row.get("notes")?,
            recorded_at: row.get("recorded_at")?,
        };
        entry.validate()?;
        Ok(entry)
    }
}

pub trait MoodRepository: Repository<MoodEntry> {
    /// Entries recorded in `[start, end)`, newest first.
    fn entries_between(&self, start: i64, end: i64) -> RepoResult<Vec<MoodEntry>>;
    fn latest(&self) -> RepoResult<Option<MoodEntry>>;
    /// Mean level of one scale in `[start, end)`.
    fn average_level(&self, scale: MoodScale, start: i64, end: i64) -> RepoResult<Option<f64>>;
    /// `(level, count)` pairs for one scale in `[start, end)`, by level.
    fn level_distribution(
        &self,
        scale: MoodScale,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<(u8, u64)>>;
}

pub struct SqliteMoodRepository<'conn> {
    inner: SqliteRepository<'conn, MoodEntry>,
}

impl<'conn> SqliteMoodRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            inner: SqliteRepository::try_new(conn)?,
        })
    }
}

delegate_repository!(SqliteMoodRepository, MoodEntry);

impl MoodRepository for SqliteMoodRepository<'_> {
    fn entries_between(&self, start: i64, end: i64) -> RepoResult<Vec<MoodEntry>> {
        self.inner.fetch(
            &Filter::all().between("recorded_at", start, end),
            &FetchOptions::default(),
        )
    }

    fn latest(&self) -> RepoResult<Option<MoodEntry>> {
        let mut items = self
            .inner
            .fetch(&Filter::all(), &FetchOptions::default().limit(1))?;
        Ok(items.pop())
    }

    fn average_level(&self, scale: MoodScale, start: i64, end: i64) -> RepoResult<Option<f64>> {
        let average = self.inner.connection().query_row(
            "SELECT AVG(level)
             FROM mood_entries
             WHERE scale = ?1
               AND recorded_at >= ?2
               AND recorded_at < ?3;",
            params![scale.as_str(), start, end],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(average)
    }

    fn level_distribution(
        &self,
        scale: MoodScale,
        start: i64,
        end: i64,
    ) -> RepoResult<Vec<(u8, u64)>> {
        let mut stmt = self.inner.connection().prepare(
            "SELECT level, COUNT(*)
             FROM mood_entries
             WHERE scale = ?1
               AND recorded_at >= ?2
               AND recorded_at < ?3
             GROUP BY level
             ORDER BY level ASC;",
        )?;
        let mut rows = stmt.query(params![scale.as_str(), start, end])?;
        let mut buckets = Vec::new();
        while let Some(row) = rows.next()? {
            let level = read_small(row, "level")?;
            let count: i64 = row.get(1)?;
            buckets.push((level, count.max(0) as u64));
        }
        Ok(buckets)
    }
}
