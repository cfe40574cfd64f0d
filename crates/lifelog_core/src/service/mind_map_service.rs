//! Mind map use-case service.
//!
//! # Responsibility
//! - Validate hierarchy rules that need more than one row.
//! - Provide map create/delete and node add/move/depth/subtree operations.
//!
//! # Invariants
//! - A node's parent exists and belongs to the same map.
//! - Move operations must not create parent-child cycles.
//! - Every structural change re-stamps the owning map's `updated_at`.

use crate::model::mind_map::{MindMap, MindNode};
use crate::model::EntityId;
use crate::repo::mind_map_repo::{MindMapRepository, NodeRepository};
use crate::repo::RepoError;
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum MindMapServiceError {
    MapNotFound(EntityId),
    NodeNotFound(EntityId),
    ParentNotFound(EntityId),
    /// Parent lives in a different map than the node.
    CrossMapParent {
        map_id: EntityId,
        parent_id: EntityId,
    },
    /// Move would make a node its own ancestor.
    CycleDetected {
        node_id: EntityId,
        parent_id: EntityId,
    },
    Repo(RepoError),
}

impl Display for MindMapServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapNotFound(id) => write!(f, "mind map not found: {id}"),
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent node not found: {id}"),
            Self::CrossMapParent { map_id, parent_id } => {
                write!(f, "parent {parent_id} does not belong to map {map_id}")
            }
            Self::CycleDetected { node_id, parent_id } => write!(
                f,
                "move would create cycle: node {node_id} under parent {parent_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MindMapServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MindMapServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct MindMapService<M: MindMapRepository, N: NodeRepository> {
    maps: M,
    nodes: N,
}

impl<M: MindMapRepository, N: NodeRepository> MindMapService<M, N> {
    pub fn new(maps: M, nodes: N) -> Self {
        Self { maps, nodes }
    }

    /// Maps, most recently updated first.
    pub fn list_maps(&self) -> Result<Vec<MindMap>, MindMapServiceError> {
        Ok(self.maps.fetch_all()?)
    }

    /// Creates a map together with its root node, titled like the map.
    pub fn create_map(
        &self,
        title: impl Into<String>,
    ) -> Result<(MindMap, MindNode), MindMapServiceError> {
        let map = MindMap::new(title);
        let root = MindNode::new_root(map.id, map.title.clone());
        self.maps.save(&map)?;
        self.nodes.save(&root)?;
        Ok((map, root))
    }

    pub fn rename_map(
        &self,
        id: EntityId,
        title: impl Into<String>,
    ) -> Result<MindMap, MindMapServiceError> {
        let mut map = self.require_map(id)?;
        map.rename(title);
        self.maps.save(&map)?;
        Ok(map)
    }

    /// Deletes a map and all of its nodes; returns the number of nodes removed.
    pub fn delete_map(&self, id: EntityId) -> Result<u64, MindMapServiceError> {
        match self.maps.delete_cascade(id) {
            Ok(removed) => Ok(removed),
            Err(RepoError::NotFound(id)) => Err(MindMapServiceError::MapNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Adds a child under `parent_id`, or a new root when `parent_id` is `None`.
    pub fn add_node(
        &self,
        map_id: EntityId,
        parent_id: Option<EntityId>,
        title: impl Into<String>,
    ) -> Result<MindNode, MindMapServiceError> {
        let mut map = self.require_map(map_id)?;
        let node = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .fetch_by_id(parent_id)?
                    .ok_or(MindMapServiceError::ParentNotFound(parent_id))?;
                if parent.mind_map_id != map_id {
                    return Err(MindMapServiceError::CrossMapParent { map_id, parent_id });
                }
                MindNode::new_child(&parent, title)
            }
            None => MindNode::new_root(map_id, title),
        };
        self.nodes.save(&node)?;
        map.touch();
        self.maps.save(&map)?;
        Ok(node)
    }

    pub fn rename_node(
        &self,
        id: EntityId,
        title: impl Into<String>,
    ) -> Result<MindNode, MindMapServiceError> {
        let mut node = self.require_node(id)?;
        node.title = title.into().trim().to_string();
        node.touch();
        self.nodes.save(&node)?;
        Ok(node)
    }

    pub fn reposition_node(
        &self,
        id: EntityId,
        x: f64,
        y: f64,
    ) -> Result<MindNode, MindMapServiceError> {
        let mut node = self.require_node(id)?;
        node.move_to(x, y);
        self.nodes.save(&node)?;
        Ok(node)
    }

    /// Re-parents a node. `None` turns it into a root.
    pub fn move_node(
        &self,
        id: EntityId,
        new_parent_id: Option<EntityId>,
    ) -> Result<MindNode, MindMapServiceError> {
        let mut node = self.require_node(id)?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == id {
                return Err(MindMapServiceError::CycleDetected {
                    node_id: id,
                    parent_id,
                });
            }
            let parent = self
                .nodes
                .fetch_by_id(parent_id)?
                .ok_or(MindMapServiceError::ParentNotFound(parent_id))?;
            if parent.mind_map_id != node.mind_map_id {
                return Err(MindMapServiceError::CrossMapParent {
                    map_id: node.mind_map_id,
                    parent_id,
                });
            }
            if self.would_create_cycle(id, parent_id)? {
                return Err(MindMapServiceError::CycleDetected {
                    node_id: id,
                    parent_id,
                });
            }
        }

        node.reparent(new_parent_id);
        self.nodes.save(&node)?;
        let mut map = self.require_map(node.mind_map_id)?;
        map.touch();
        self.maps.save(&map)?;
        Ok(node)
    }

    /// Deletes a node and its whole subtree.
    pub fn delete_node(&self, id: EntityId) -> Result<(), MindMapServiceError> {
        match self.nodes.delete(id) {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound(id)) => Err(MindMapServiceError::NodeNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Number of ancestors between `id` and its root; roots have depth 0.
    pub fn node_depth(&self, id: EntityId) -> Result<u32, MindMapServiceError> {
        let node = self.require_node(id)?;
        let mut visited = HashSet::from([id]);
        let mut depth = 0;
        let mut cursor = node.parent_id;
        while let Some(current) = cursor {
            if !visited.insert(current) {
                return Err(MindMapServiceError::CycleDetected {
                    node_id: id,
                    parent_id: current,
                });
            }
            depth += 1;
            cursor = self
                .nodes
                .fetch_by_id(current)?
                .ok_or(MindMapServiceError::ParentNotFound(current))?
                .parent_id;
        }
        Ok(depth)
    }

    /// The node followed by its descendants in breadth-first order.
    pub fn subtree(&self, id: EntityId) -> Result<Vec<MindNode>, MindMapServiceError> {
        let root = self.require_node(id)?;
        let mut visited = HashSet::from([root.id]);
        let mut queue = VecDeque::from([root.id]);
        let mut nodes = vec![root];
        while let Some(current) = queue.pop_front() {
            for child in self.nodes.children(current)? {
                if visited.insert(child.id) {
                    queue.push_back(child.id);
                    nodes.push(child);
                }
            }
        }
        Ok(nodes)
    }

    pub fn nodes_in_map(&self, map_id: EntityId) -> Result<Vec<MindNode>, MindMapServiceError> {
        self.require_map(map_id)?;
        Ok(self.nodes.nodes_in_map(map_id)?)
    }

    pub fn node_count(&self, map_id: EntityId) -> Result<u64, MindMapServiceError> {
        Ok(self.maps.node_count(map_id)?)
    }

    fn require_map(&self, id: EntityId) -> Result<MindMap, MindMapServiceError> {
        self.maps
            .fetch_by_id(id)?
            .ok_or(MindMapServiceError::MapNotFound(id))
    }

    fn require_node(&self, id: EntityId) -> Result<MindNode, MindMapServiceError> {
        self.nodes
            .fetch_by_id(id)?
            .ok_or(MindMapServiceError::NodeNotFound(id))
    }

    fn would_create_cycle(
        &self,
        node_id: EntityId,
        candidate_parent_id: EntityId,
    ) -> Result<bool, MindMapServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == node_id || !visited.insert(current) {
                return Ok(true);
            }
            cursor = self
                .nodes
                .fetch_by_id(current)?
                .ok_or(MindMapServiceError::ParentNotFound(current))?
                .parent_id;
        }
        Ok(false)
    }
}
