//! Mind map and node models.
//!
//! Nodes form a parent-pointer tree scoped to one map. Hierarchy rules that
//! need other rows (cycles, cross-map parents) live in the mind-map service.

use super::{ensure_id, ensure_title, EntityId, ValidationError};
use crate::clock::now_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMap {
    pub id: EntityId,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl MindMap {
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            title: title.into().trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into().trim().to_string();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(self.id)?;
        ensure_title(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindNode {
    pub id: EntityId,
    pub mind_map_id: EntityId,
    /// `None` for a root node.
    pub parent_id: Option<EntityId>,
    pub title: String,
    pub color: Option<String>,
    pub x: f64,
    pub y: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl MindNode {
    pub fn new_root(mind_map_id: EntityId, title: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            mind_map_id,
            parent_id: None,
            title: title.into().trim().to_string(),
            color: None,
            x: 0.0,
            y: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a child in the parent's map, positioned at the parent.
    pub fn new_child(parent: &MindNode, title: impl Into<String>) -> Self {
        let mut node = Self::new_root(parent.mind_map_id, title);
        node.parent_id = Some(parent.id);
        node.x = parent.x;
        node.y = parent.y;
        node
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.touch();
    }

    pub fn reparent(&mut self, parent_id: Option<EntityId>) {
        self.parent_id = parent_id;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(self.id)?;
        ensure_id(self.mind_map_id)?;
        ensure_title(&self.title)?;
        if self.parent_id == Some(self.id) {
            return Err(ValidationError::SelfParent(self.id));
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        Ok(())
    }
}
