//! Journal repository.

use super::generic::{
    delegate_repository, id_value, optional_text, read_bool, read_id, Entity, Repository,
    SqliteRepository,
};
use super::query::{FetchOptions, Filter, Sort};
use super::{RepoError, RepoResult};
use crate::clock::{day_of, MILLIS_PER_DAY};
use crate::model::journal::JournalEntry;
use crate::model::{EntityId, ValidationError};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

impl Entity for JournalEntry {
    const TABLE: &'static str = "journal_entries";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "content",
        "mood_level",
        "is_dream",
        "is_gratitude",
        "prompt",
        "created_at",
        "updated_at",
    ];
    const DEFAULT_SORT: &'static [Sort] = &[Sort::desc("created_at")];

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        JournalEntry::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id),
            Value::Text(self.content.clone()),
            self.mood_level
                .map_or(Value::Null, |level| Value::Integer(i64::from(level))),
            Value::from(self.is_dream),
            Value::from(self.is_gratitude),
            optional_text(self.prompt.as_deref()),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let mood_level = row
            .get::<_, Option<i64>>("mood_level")?
            .map(|value| {
                u8::try_from(value).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid mood_level `{value}` in journal_entries"
                    ))
                })
            })
            .transpose()?;

        let entry = JournalEntry {
            id: read_id(row, "id")?,
            content: row.get("content")?,
            mood_level,
            is_dream: read_bool(row, "is_dream")?,
            is_gratitude: read_bool(row, "is_gratitude")?,
            prompt: row.get("prompt")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        entry.validate()?;
        Ok(entry)
    }
}

pub trait JournalRepository: Repository<JournalEntry> {
    /// Entries created in `[start, end)`, newest first.
    fn entries_between(&self, start: i64, end: i64) -> RepoResult<Vec<JournalEntry>>;
    fn dream_entries(&self) -> RepoResult<Vec<JournalEntry>>;
    fn gratitude_entries(&self) -> RepoResult<Vec<JournalEntry>>;
    /// Mean mood level in `[start, end)`; entries without a mood are ignored.
    fn average_mood_between(&self, start: i64, end: i64) -> RepoResult<Option<f64>>;
    /// Distinct UTC days that have at least one entry, newest first.
    fn entry_days(&self) -> RepoResult<Vec<NaiveDate>>;
}

pub struct SqliteJournalRepository<'conn> {
    inner: SqliteRepository<'conn, JournalEntry>,
}

impl<'conn> SqliteJournalRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            inner: SqliteRepository::try_new(conn)?,
        })
    }
}

delegate_repository!(SqliteJournalRepository, JournalEntry);

impl JournalRepository for SqliteJournalRepository<'_> {
    fn entries_between(&self, start: i64, end: i64) -> RepoResult<Vec<JournalEntry>> {
        self.inner.fetch(
            &Filter::all().between("created_at", start, end),
            &FetchOptions::default(),
        )
    }

    fn dream_entries(&self) -> RepoResult<Vec<JournalEntry>> {
        self.inner
            .fetch(&Filter::all().eq("is_dream", true), &FetchOptions::default())
    }

    fn gratitude_entries(&self) -> RepoResult<Vec<JournalEntry>> {
        self.inner.fetch(
            &Filter::all().eq("is_gratitude", true),
            &FetchOptions::default(),
        )
    }

    fn average_mood_between(&self, start: i64, end: i64) -> RepoResult<Option<f64>> {
        let average = self.inner.connection().query_row(
            "SELECT AVG(mood_level)
             FROM journal_entries
             WHERE mood_level IS NOT NULL
               AND created_at >= ?1
               AND created_at < ?2;",
            [start, end],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(average)
    }

    fn entry_days(&self) -> RepoResult<Vec<NaiveDate>> {
        let mut stmt = self.inner.connection().prepare(
            // Floor division: `/` truncates toward zero for pre-1970 stamps.
            "SELECT DISTINCT (created_at - ((created_at % ?1) + ?1) % ?1) / ?1 AS day_index
             FROM journal_entries
             ORDER BY day_index DESC;",
        )?;
        let mut rows = stmt.query([MILLIS_PER_DAY])?;
        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            let day_index: i64 = row.get(0)?;
            let day = day_of(day_index * MILLIS_PER_DAY).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "created_at day index `{day_index}` out of range in journal_entries"
                ))
            })?;
            days.push(day);
        }
        Ok(days)
    }
}
