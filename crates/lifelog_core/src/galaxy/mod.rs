//! Galaxy boards: free-form node/connection graphs kept outside the store.
//!
//! # Invariants
//! - Connections are undirected; at most one connection joins a node pair.
//! - No self-loops; both endpoints exist when a connection is created.
//! - Removing a node removes every connection touching it.

use crate::clock::now_ms;
use crate::model::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::f64::consts::TAU;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod store;

pub use store::GalaxyStore;

pub const DEFAULT_NODE_RADIUS: f64 = 24.0;

#[derive(Debug)]
pub enum GalaxyError {
    UnknownNode(EntityId),
    UnknownConnection(EntityId),
    SelfLoop(EntityId),
    DuplicateConnection { from: EntityId, to: EntityId },
    NonFiniteCoordinate,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for GalaxyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "galaxy node not found: {id}"),
            Self::UnknownConnection(id) => write!(f, "galaxy connection not found: {id}"),
            Self::SelfLoop(id) => write!(f, "node {id} cannot connect to itself"),
            Self::DuplicateConnection { from, to } => {
                write!(f, "nodes {from} and {to} are already connected")
            }
            Self::NonFiniteCoordinate => write!(f, "galaxy coordinates must be finite"),
            Self::Io(err) => write!(f, "galaxy store io error: {err}"),
            Self::Json(err) => write!(f, "galaxy store json error: {err}"),
        }
    }
}

impl Error for GalaxyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GalaxyError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for GalaxyError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyNode {
    pub id: EntityId,
    pub label: String,
    pub color: Option<String>,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalaxyConnection {
    pub id: EntityId,
    pub from: EntityId,
    pub to: EntityId,
    #[serde(default)]
    pub label: Option<String>,
}

impl GalaxyConnection {
    pub fn touches(&self, node_id: EntityId) -> bool {
        self.from == node_id || self.to == node_id
    }

    /// True when this connection joins `a` and `b` in either direction.
    pub fn joins(&self, a: EntityId, b: EntityId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    fn other_end(&self, node_id: EntityId) -> Option<EntityId> {
        if self.from == node_id {
            Some(self.to)
        } else if self.to == node_id {
            Some(self.from)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<GalaxyNode>,
    #[serde(default)]
    pub connections: Vec<GalaxyConnection>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Galaxy {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            nodes: Vec::new(),
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn node(&self, id: EntityId) -> Option<&GalaxyNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Result<EntityId, GalaxyError> {
        ensure_finite(x, y)?;
        let id = Uuid::new_v4();
        self.nodes.push(GalaxyNode {
            id,
            label: label.into(),
            color: None,
            x,
            y,
            radius: DEFAULT_NODE_RADIUS,
        });
        self.touch();
        Ok(id)
    }

    pub fn move_node(&mut self, id: EntityId, x: f64, y: f64) -> Result<(), GalaxyError> {
        ensure_finite(x, y)?;
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id == id)
            .ok_or(GalaxyError::UnknownNode(id))?;
        node.x = x;
        node.y = y;
        self.touch();
        Ok(())
    }

    /// Removes a node and its connections; returns the removed node.
    pub fn remove_node(&mut self, id: EntityId) -> Result<GalaxyNode, GalaxyError> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.id == id)
            .ok_or(GalaxyError::UnknownNode(id))?;
        let node = self.nodes.remove(index);
        self.connections.retain(|connection| !connection.touches(id));
        self.touch();
        Ok(node)
    }

    pub fn connect(
        &mut self,
        from: EntityId,
        to: EntityId,
        label: Option<String>,
    ) -> Result<EntityId, GalaxyError> {
        if from == to {
            return Err(GalaxyError::SelfLoop(from));
        }
        for endpoint in [from, to] {
            if self.node(endpoint).is_none() {
                return Err(GalaxyError::UnknownNode(endpoint));
            }
        }
        if self
            .connections
            .iter()
            .any(|connection| connection.joins(from, to))
        {
            return Err(GalaxyError::DuplicateConnection { from, to });
        }

        let id = Uuid::new_v4();
        self.connections.push(GalaxyConnection {
            id,
            from,
            to,
            label,
        });
        self.touch();
        Ok(id)
    }

    pub fn disconnect(&mut self, connection_id: EntityId) -> Result<(), GalaxyError> {
        let before = self.connections.len();
        self.connections
            .retain(|connection| connection.id != connection_id);
        if self.connections.len() == before {
            return Err(GalaxyError::UnknownConnection(connection_id));
        }
        self.touch();
        Ok(())
    }

    /// Ids of nodes connected to `id`, in connection order.
    pub fn neighbors(&self, id: EntityId) -> Vec<EntityId> {
        self.connections
            .iter()
            .filter_map(|connection| connection.other_end(id))
            .collect()
    }

    /// Drops connections whose endpoints no longer exist; returns how many.
    ///
    /// Boards written by older builds may contain such edges.
    pub fn prune_dangling(&mut self) -> usize {
        let ids: HashSet<EntityId> = self.nodes.iter().map(|node| node.id).collect();
        let before = self.connections.len();
        self.connections
            .retain(|connection| ids.contains(&connection.from) && ids.contains(&connection.to));
        let removed = before - self.connections.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Places the neighbors of `center_id` evenly on a circle around it.
    ///
    /// The first neighbor sits at angle 0 (to the right of the center).
    pub fn orbit_layout(&mut self, center_id: EntityId, radius: f64) -> Result<(), GalaxyError> {
        if !radius.is_finite() {
            return Err(GalaxyError::NonFiniteCoordinate);
        }
        let center = self
            .node(center_id)
            .ok_or(GalaxyError::UnknownNode(center_id))?;
        let (cx, cy) = (center.x, center.y);
        let satellites = self.neighbors(center_id);
        if satellites.is_empty() {
            return Ok(());
        }

        let step = TAU / satellites.len() as f64;
        for (index, satellite) in satellites.iter().enumerate() {
            let angle = step * index as f64;
            if let Some(node) = self.nodes.iter_mut().find(|node| node.id == *satellite) {
                node.x = cx + radius * angle.cos();
                node.y = cy + radius * angle.sin();
            }
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = now_ms().max(self.updated_at);
    }
}

fn ensure_finite(x: f64, y: f64) -> Result<(), GalaxyError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(GalaxyError::NonFiniteCoordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::{Galaxy, GalaxyConnection, GalaxyError};
    use uuid::Uuid;

    fn board() -> (Galaxy, Uuid, Uuid, Uuid) {
        let mut galaxy = Galaxy::new("ideas");
        let sun = galaxy.add_node("sun", 0.0, 0.0).unwrap();
        let earth = galaxy.add_node("earth", 10.0, 0.0).unwrap();
        let mars = galaxy.add_node("mars", 20.0, 0.0).unwrap();
        (galaxy, sun, earth, mars)
    }

    #[test]
    fn connect_rejects_self_loops_unknown_nodes_and_duplicates() {
        let (mut galaxy, sun, earth, _) = board();
        assert!(matches!(
            galaxy.connect(sun, sun, None),
            Err(GalaxyError::SelfLoop(_))
        ));
        assert!(matches!(
            galaxy.connect(sun, Uuid::new_v4(), None),
            Err(GalaxyError::UnknownNode(_))
        ));
        galaxy.connect(sun, earth, None).unwrap();
        assert!(matches!(
            galaxy.connect(earth, sun, None),
            Err(GalaxyError::DuplicateConnection { .. })
        ));
        assert_eq!(galaxy.connections.len(), 1);
    }

    #[test]
    fn removing_a_node_removes_its_connections() {
        let (mut galaxy, sun, earth, mars) = board();
        galaxy.connect(sun, earth, None).unwrap();
        galaxy.connect(mars, sun, None).unwrap();
        galaxy.connect(earth, mars, None).unwrap();

        galaxy.remove_node(sun).unwrap();

        assert!(galaxy.connections.iter().all(|c| !c.touches(sun)));
        assert_eq!(galaxy.connections.len(), 1);
        assert_eq!(galaxy.neighbors(earth), vec![mars]);
    }

    #[test]
    fn prune_dangling_drops_edges_to_missing_nodes() {
        let (mut galaxy, sun, earth, _) = board();
        galaxy.connections.push(GalaxyConnection {
            id: Uuid::new_v4(),
            from: sun,
            to: Uuid::new_v4(),
            label: None,
        });
        galaxy.connect(sun, earth, None).unwrap();
        assert_eq!(galaxy.prune_dangling(), 1);
        assert_eq!(galaxy.neighbors(sun), vec![earth]);
    }

    #[test]
    fn orbit_layout_places_neighbors_on_circle() {
        let (mut galaxy, sun, earth, mars) = board();
        galaxy.connect(sun, earth, None).unwrap();
        galaxy.connect(sun, mars, None).unwrap();

        galaxy.orbit_layout(sun, 5.0).unwrap();

        let earth = galaxy.node(earth).unwrap();
        let mars = galaxy.node(mars).unwrap();
        assert!((earth.x - 5.0).abs() < 1e-9 && earth.y.abs() < 1e-9);
        assert!((mars.x + 5.0).abs() < 1e-9 && mars.y.abs() < 1e-9);
    }

    #[test]
    fn disconnect_and_move_report_unknown_ids() {
        let (mut galaxy, sun, _, _) = board();
        assert!(matches!(
            galaxy.disconnect(Uuid::new_v4()),
            Err(GalaxyError::UnknownConnection(_))
        ));
        assert!(matches!(
            galaxy.move_node(Uuid::new_v4(), 1.0, 1.0),
            Err(GalaxyError::UnknownNode(_))
        ));
        assert!(matches!(
            galaxy.move_node(sun, f64::NAN, 0.0),
            Err(GalaxyError::NonFiniteCoordinate)
        ));
    }
}
