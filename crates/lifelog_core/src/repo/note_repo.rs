//! Note repository: note rows plus the note/tag link table.
//!
//! # Invariants
//! - Loaded notes always carry their full, lowercase, name-sorted tag set.
//! - `save` writes the row and replaces the tag set in one transaction.
//! - Tag names are normalized before persistence.

use super::generic::{
    id_value, optional_text, read_bool, read_id, upsert, Entity, Repository, SqliteRepository,
};
use super::query::{FetchOptions, Filter, Sort};
use super::schema::table_exists;
use super::{RepoError, RepoResult};
use crate::model::note::Note;
use crate::model::{EntityId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const NOTES_DEFAULT_LIMIT: u32 = 10;
const NOTES_LIMIT_MAX: u32 = 50;

impl Entity for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "content",
        "preview_text",
        "is_encrypted",
        "created_at",
        "updated_at",
    ];
    const DEFAULT_SORT: &'static [Sort] = &[Sort::desc("updated_at")];

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Note::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id),
            Value::Text(self.title.clone()),
            Value::Text(self.content.clone()),
            optional_text(self.preview_text.as_deref()),
            Value::from(self.is_encrypted),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let note = Note {
            id: read_id(row, "id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            preview_text: row.get("preview_text")?,
            is_encrypted: read_bool(row, "is_encrypted")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            tags: Vec::new(),
        };
        note.validate()?;
        Ok(note)
    }
}

/// Query options for tag-filtered, paginated note lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Optional single-tag exact match filter.
    pub tag: Option<String>,
    /// Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Note queries layered on the generic repository.
pub trait NoteRepository: Repository<Note> {
    /// Lists notes by `updated_at DESC, id ASC` with optional tag filter.
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Notes created in `[start, end)`, oldest first.
    fn created_between(&self, start: i64, end: i64) -> RepoResult<Vec<Note>>;
    fn recently_updated(&self, limit: u32) -> RepoResult<Vec<Note>>;
    /// Title substring search, case-insensitive for ASCII.
    fn search_titles(&self, needle: &str) -> RepoResult<Vec<Note>>;
    /// Replaces all tags of one note in a single transaction.
    fn set_note_tags(&self, id: EntityId, tags: &[String]) -> RepoResult<()>;
    /// All known tag names, sorted.
    fn list_tags(&self) -> RepoResult<Vec<String>>;
}

pub struct SqliteNoteRepository<'conn> {
    inner: SqliteRepository<'conn, Note>,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let inner = SqliteRepository::try_new(conn)?;
        for table in ["tags", "note_tags"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { inner })
    }

    fn conn(&self) -> &'conn Connection {
        self.inner.connection()
    }

    fn with_tags(&self, mut notes: Vec<Note>) -> RepoResult<Vec<Note>> {
        for note in &mut notes {
            note.tags = load_tags_for_note(self.conn(), note.id)?;
        }
        Ok(notes)
    }
}

impl Repository<Note> for SqliteNoteRepository<'_> {
    fn fetch_all(&self) -> RepoResult<Vec<Note>> {
        self.with_tags(self.inner.fetch_all()?)
    }

    fn fetch_by_id(&self, id: EntityId) -> RepoResult<Option<Note>> {
        match self.inner.fetch_by_id(id)? {
            Some(mut note) => {
                note.tags = load_tags_for_note(self.conn(), id)?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    fn fetch(&self, filter: &Filter, options: &FetchOptions) -> RepoResult<Vec<Note>> {
        self.with_tags(self.inner.fetch(filter, options)?)
    }

    fn count(&self, filter: &Filter) -> RepoResult<u64> {
        self.inner.count(filter)
    }

    fn save(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;
        let tags = normalize_tags(&note.tags);
        let tx = Transaction::new_unchecked(self.conn(), TransactionBehavior::Immediate)?;
        upsert(&tx, note)?;
        replace_tags(&tx, note.id, &tags)?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        self.inner.delete(id)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("SELECT {} FROM notes WHERE 1 = 1", Note::COLUMNS.join(", "));
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(tag) = query.tag.as_deref().and_then(normalize_tag) {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    INNER JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = notes.id
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_note_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(Note::from_row(row)?);
        }
        self.with_tags(notes)
    }

    fn created_between(&self, start: i64, end: i64) -> RepoResult<Vec<Note>> {
        self.fetch(
            &Filter::all().between("created_at", start, end),
            &FetchOptions::sorted_by(Sort::asc("created_at")),
        )
    }

    fn recently_updated(&self, limit: u32) -> RepoResult<Vec<Note>> {
        self.fetch(
            &Filter::all(),
            &FetchOptions::sorted_by(Sort::desc("updated_at")).limit(limit),
        )
    }

    fn search_titles(&self, needle: &str) -> RepoResult<Vec<Note>> {
        let trimmed = needle.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch(
            &Filter::all().contains("title", trimmed),
            &FetchOptions::default(),
        )
    }

    fn set_note_tags(&self, id: EntityId, tags: &[String]) -> RepoResult<()> {
        let tags = normalize_tags(tags);
        let tx = Transaction::new_unchecked(self.conn(), TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound(id));
        }

        replace_tags(&tx, id, &tags)?;
        tx.execute(
            "UPDATE notes
             SET updated_at = MAX(updated_at, ?2)
             WHERE id = ?1;",
            params![id.to_string(), crate::clock::now_ms()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT name FROM tags ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            tags.push(value.to_lowercase());
        }
        Ok(tags)
    }
}

/// Normalizes list limit according to the notes paging contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Trims and lowercases one tag; blank tags yield `None`.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values, sorted by name.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .filter_map(|tag| normalize_tag(tag))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn replace_tags(conn: &Connection, note_id: EntityId, tags: &[String]) -> RepoResult<()> {
    let note_id = note_id.to_string();
    conn.execute("DELETE FROM note_tags WHERE note_id = ?1;", [note_id.as_str()])?;
    for tag in tags {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [tag.as_str()])?;
        conn.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![note_id.as_str(), tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags_for_note(conn: &Connection, note_id: EntityId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([note_id.to_string()])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::{normalize_note_limit, normalize_tags};

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_note_limit(None), 10);
        assert_eq!(normalize_note_limit(Some(0)), 10);
        assert_eq!(normalize_note_limit(Some(7)), 7);
        assert_eq!(normalize_note_limit(Some(500)), 50);
    }

    #[test]
    fn tags_are_trimmed_lowercased_and_deduplicated() {
        let tags = vec![
            " Work ".to_string(),
            "work".to_string(),
            "".to_string(),
            "Ideas".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["ideas", "work"]);
    }
}
