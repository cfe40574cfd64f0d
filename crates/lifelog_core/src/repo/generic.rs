//! Generic entity repository.
//!
//! # Responsibility
//! - Describe a persisted entity once ([`Entity`]) and derive fetch-all,
//!   fetch-by-id, fetch-by-predicate, count, save and delete from it.
//!
//! # Invariants
//! - `Entity::COLUMNS[0]` is the `id` primary key.
//! - `save` is an upsert keyed by `id` and validates first.
//! - Result order is deterministic: requested/default sort, then `id ASC`.

use super::query::{FetchOptions, Filter, Sort};
use super::schema::ensure_entity_schema;
use super::{RepoError, RepoResult};
use crate::model::{EntityId, ValidationError};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::marker::PhantomData;
use uuid::Uuid;

/// Table mapping for one persisted record type.
pub trait Entity: Sized {
    const TABLE: &'static str;
    /// Column list in bind order; the first entry must be `id`.
    const COLUMNS: &'static [&'static str];
    /// Ordering used when a fetch does not specify one.
    const DEFAULT_SORT: &'static [Sort];

    fn id(&self) -> EntityId;
    fn validate(&self) -> Result<(), ValidationError>;
    /// Values in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// CRUD contract shared by every entity repository.
pub trait Repository<E: Entity> {
    fn fetch_all(&self) -> RepoResult<Vec<E>>;
    fn fetch_by_id(&self, id: EntityId) -> RepoResult<Option<E>>;
    fn fetch(&self, filter: &Filter, options: &FetchOptions) -> RepoResult<Vec<E>>;
    fn count(&self, filter: &Filter) -> RepoResult<u64>;
    fn save(&self, entity: &E) -> RepoResult<()>;
    fn delete(&self, id: EntityId) -> RepoResult<()>;
}

/// SQLite-backed [`Repository`] for any [`Entity`].
pub struct SqliteRepository<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteRepository<'conn, E> {
    /// Wraps a migrated connection after checking the entity table shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_entity_schema(conn, E::TABLE, E::COLUMNS)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
    }
}

impl<E: Entity> Repository<E> for SqliteRepository<'_, E> {
    fn fetch_all(&self) -> RepoResult<Vec<E>> {
        self.fetch(&Filter::all(), &FetchOptions::default())
    }

    fn fetch_by_id(&self, id: EntityId) -> RepoResult<Option<E>> {
        let sql = format!("{} WHERE id = ?1;", Self::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(E::from_row(row)?));
        }
        Ok(None)
    }

    fn fetch(&self, filter: &Filter, options: &FetchOptions) -> RepoResult<Vec<E>> {
        let mut binds = filter.values().to_vec();
        let sql = format!(
            "{}{}{};",
            Self::select_sql(),
            filter.where_sql(),
            options.to_sql(E::DEFAULT_SORT, &mut binds)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(E::from_row(row)?);
        }
        Ok(items)
    }

    fn count(&self, filter: &Filter) -> RepoResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}{};", E::TABLE, filter.where_sql());
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(filter.values()), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative count {count} in {}", E::TABLE)))
    }

    fn save(&self, entity: &E) -> RepoResult<()> {
        entity.validate()?;
        upsert(self.conn, entity)?;
        debug!("event=repo_save module=repo status=ok table={}", E::TABLE);
        Ok(())
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1;", E::TABLE);
        let changed = self.conn.execute(&sql, [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        debug!("event=repo_delete module=repo status=ok table={}", E::TABLE);
        Ok(())
    }
}

/// Insert-or-update by `id` on any connection or open transaction.
pub(crate) fn upsert<E: Entity>(conn: &Connection, entity: &E) -> RepoResult<()> {
    let columns = E::COLUMNS;
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .skip(1)
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})
         ON CONFLICT(id) DO UPDATE SET {updates};",
        E::TABLE,
        columns.join(", ")
    );
    let values = entity.to_values();
    if values.len() != columns.len() {
        return Err(RepoError::InvalidData(format!(
            "{} values for {} columns in {}",
            values.len(),
            columns.len(),
            E::TABLE
        )));
    }
    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

/// Implements [`Repository`] for a wrapper holding `inner: SqliteRepository`.
macro_rules! delegate_repository {
    ($repo:ident, $entity:ty) => {
        impl $crate::repo::generic::Repository<$entity> for $repo<'_> {
            fn fetch_all(&self) -> $crate::repo::RepoResult<Vec<$entity>> {
                $crate::repo::generic::Repository::fetch_all(&self.inner)
            }

            fn fetch_by_id(
                &self,
                id: $crate::model::EntityId,
            ) -> $crate::repo::RepoResult<Option<$entity>> {
                $crate::repo::generic::Repository::fetch_by_id(&self.inner, id)
            }

            fn fetch(
                &self,
                filter: &$crate::repo::query::Filter,
                options: &$crate::repo::query::FetchOptions,
            ) -> $crate::repo::RepoResult<Vec<$entity>> {
                $crate::repo::generic::Repository::fetch(&self.inner, filter, options)
            }

            fn count(&self, filter: &$crate::repo::query::Filter) -> $crate::repo::RepoResult<u64> {
                $crate::repo::generic::Repository::count(&self.inner, filter)
            }

            fn save(&self, entity: &$entity) -> $crate::repo::RepoResult<()> {
                $crate::repo::generic::Repository::save(&self.inner, entity)
            }

            fn delete(&self, id: $crate::model::EntityId) -> $crate::repo::RepoResult<()> {
                $crate::repo::generic::Repository::delete(&self.inner, id)
            }
        }
    };
}

pub(crate) use delegate_repository;

pub(crate) fn read_id(row: &Row<'_>, column: &'static str) -> RepoResult<EntityId> {
    let text: String = row.get(column)?;
    parse_id(&text, column)
}

pub(crate) fn read_optional_id(
    row: &Row<'_>,
    column: &'static str,
) -> RepoResult<Option<EntityId>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| parse_id(&text, column))
        .transpose()
}

pub(crate) fn read_bool(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn read_small(row: &Row<'_>, column: &'static str) -> RepoResult<u8> {
    let value: i64 = row.get(column)?;
    u8::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` out of range in {column}")))
}

pub(crate) fn id_value(id: EntityId) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn parse_id(text: &str, column: &'static str) -> RepoResult<EntityId> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{text}` in {column}")))
}
