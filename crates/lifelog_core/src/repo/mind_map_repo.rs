//! Mind map and node repositories.
//!
//! # Invariants
//! - Both repositories refuse connections without foreign key enforcement;
//!   map and subtree deletes rely on `ON DELETE CASCADE`.
//! - Node reads reject rows whose coordinates are not finite.

use super::generic::{
    delegate_repository, id_value, optional_text, read_id, read_optional_id, Entity, Repository,
    SqliteRepository,
};
use super::query::{FetchOptions, Filter, Sort};
use super::schema::ensure_foreign_keys;
use super::{RepoError, RepoResult};
use crate::model::mind_map::{MindMap, MindNode};
use crate::model::{EntityId, ValidationError};
use log::info;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

impl Entity for MindMap {
    const TABLE: &'static str = "mind_maps";
    const COLUMNS: &'static [&'static str] = &["id", "title", "created_at", "updated_at"];
    const DEFAULT_SORT: &'static [Sort] = &[Sort::desc("updated_at")];

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        MindMap::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id),
            Value::Text(self.title.clone()),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let map = MindMap {
            id: read_id(row, "id")?,
            title: row.get("title")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        map.validate()?;
        Ok(map)
    }
}

impl Entity for MindNode {
    const TABLE: &'static str = "mind_map_nodes";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "mind_map_id",
        "parent_id",
        "title",
        "color",
        "x",
        "y",
        "created_at",
        "updated_at",
    ];
    const DEFAULT_SORT: &'static [Sort] = &[Sort::asc("created_at")];

    fn id(&self) -> EntityId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        MindNode::validate(self)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            id_value(self.id),
            id_value(self.mind_map_id),
            self.parent_id.map_or(Value::Null, id_value),
            Value::Text(self.title.clone()),
            optional_text(self.color.as_deref()),
            Value::Real(self.x),
            Value::Real(self.y),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let node = MindNode {
            id: read_id(row, "id")?,
            mind_map_id: read_id(row, "mind_map_id")?,
            parent_id: read_optional_id(row, "parent_id")?,
            title: row.get("title")?,
            color: row.get("color")?,
            x: row.get("x")?,
            y: row.get("y")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        node.validate()?;
        Ok(node)
    }
}

pub trait MindMapRepository: Repository<MindMap> {
    /// Deletes a map and every node in it; returns how many nodes went with it.
    fn delete_cascade(&self, id: EntityId) -> RepoResult<u64>;
    fn node_count(&self, id: EntityId) -> RepoResult<u64>;
}

pub trait NodeRepository: Repository<MindNode> {
    fn nodes_in_map(&self, mind_map_id: EntityId) -> RepoResult<Vec<MindNode>>;
    fn children(&self, parent_id: EntityId) -> RepoResult<Vec<MindNode>>;
    fn roots(&self, mind_map_id: EntityId) -> RepoResult<Vec<MindNode>>;
}

pub struct SqliteMindMapRepository<'conn> {
    inner: SqliteRepository<'conn, MindMap>,
}

impl<'conn> SqliteMindMapRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let inner = SqliteRepository::try_new(conn)?;
        ensure_foreign_keys(conn)?;
        Ok(Self { inner })
    }
}

delegate_repository!(SqliteMindMapRepository, MindMap);

impl MindMapRepository for SqliteMindMapRepository<'_> {
    fn delete_cascade(&self, id: EntityId) -> RepoResult<u64> {
        let tx = Transaction::new_unchecked(self.inner.connection(), TransactionBehavior::Immediate)?;
        let nodes: i64 = tx.query_row(
            "SELECT COUNT(*) FROM mind_map_nodes WHERE mind_map_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        let changed = tx.execute("DELETE FROM mind_maps WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        let remaining: i64 = tx.query_row(
            "SELECT COUNT(*) FROM mind_map_nodes WHERE mind_map_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if remaining != 0 {
            return Err(RepoError::InvalidData(format!(
                "{remaining} nodes survived deletion of mind map {id}"
            )));
        }
        tx.commit()?;

        info!(
            "event=mind_map_delete module=repo status=ok nodes_removed={}",
            nodes
        );
        Ok(nodes.max(0) as u64)
    }

    fn node_count(&self, id: EntityId) -> RepoResult<u64> {
        let count: i64 = self.inner.connection().query_row(
            "SELECT COUNT(*) FROM mind_map_nodes WHERE mind_map_id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

pub struct SqliteNodeRepository<'conn> {
    inner: SqliteRepository<'conn, MindNode>,
}

impl<'conn> SqliteNodeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let inner = SqliteRepository::try_new(conn)?;
        ensure_foreign_keys(conn)?;
        Ok(Self { inner })
    }
}

delegate_repository!(SqliteNodeRepository, MindNode);

impl NodeRepository for SqliteNodeRepository<'_> {
    fn nodes_in_map(&self, mind_map_id: EntityId) -> RepoResult<Vec<MindNode>> {
        self.inner.fetch(
            &Filter::all().eq("mind_map_id", mind_map_id.to_string()),
            &FetchOptions::default(),
        )
    }

    fn children(&self, parent_id: EntityId) -> RepoResult<Vec<MindNode>> {
        self.inner.fetch(
            &Filter::all().eq("parent_id", parent_id.to_string()),
            &FetchOptions::default(),
        )
    }

    fn roots(&self, mind_map_id: EntityId) -> RepoResult<Vec<MindNode>> {
        self.inner.fetch(
            &Filter::all()
                .eq("mind_map_id", mind_map_id.to_string())
                .is_null("parent_id"),
            &FetchOptions::default(),
        )
    }
}
