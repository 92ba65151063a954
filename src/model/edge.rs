//! Edge — a relationship between two nodes, as reported by the graph store.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// Opaque edge identifier, assigned by the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A relationship between two nodes.
///
/// Edges are read-only to the core: the external graph store owns them, and
/// one traversal treats the whole edge set as an immutable snapshot. The
/// connection graph is mutual, so traversal walks edges from either end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub a: EntityId,
    pub b: EntityId,
    /// Raw interaction signal from the store (recency/frequency), 0..=10.
    pub raw_signal: f64,
    pub mutual_connections: u32,
    /// Free-text relationship context, e.g. "Worked together at Initech".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Edge {
    pub fn new(id: EdgeId, a: EntityId, b: EntityId, raw_signal: f64) -> Self {
        Self { id, a, b, raw_signal, mutual_connections: 0, context: None }
    }

    pub fn with_mutual_connections(mut self, count: u32) -> Self {
        self.mutual_connections = count;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The "other" end of the edge from the given node.
    pub fn other_end(&self, from: &EntityId) -> Option<&EntityId> {
        if from == &self.a {
            Some(&self.b)
        } else if from == &self.b {
            Some(&self.a)
        } else {
            None
        }
    }

    /// True if `id` is one of the edge's endpoints.
    pub fn touches(&self, id: &EntityId) -> bool {
        &self.a == id || &self.b == id
    }
}
