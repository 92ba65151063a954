//! Connection path — a sequence of alternating nodes and edges from a
//! source person to a target, with its warmth and introducer candidates.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use super::{Edge, EntityId, Node, WarmthLabel};
use crate::{Error, Result};

/// Hard ceiling on connection degree. A path deeper than this is a
/// business-invariant violation, not a tunable.
pub const MAX_DEGREE: usize = 3;

/// Deterministic path identifier, derived from the node sequence.
///
/// Two requests that discover the same hop sequence produce the same ID,
/// which is what makes keyset pagination over path results stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(String);

impl PathId {
    /// Derive the ID for an ordered node sequence.
    pub fn derive<'a>(hops: impl IntoIterator<Item = &'a EntityId>) -> Self {
        let mut hasher = Sha256::new();
        for id in hops {
            hasher.update(id.as_str().as_bytes());
            hasher.update(b"\x1f");
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(4 + 16);
        hex.push_str("pth_");
        for byte in &digest[..8] {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-hop contact of the source lying on a path to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Introducer {
    pub node: Node,
    /// Strength of the source ↔ introducer edge, 0..=10.
    pub relationship_strength: f64,
    pub mutual_connections: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// An introduction path: source -[edge]- hop -[edge]- ... -[edge]- target.
///
/// `nodes` always has exactly one more element than `edges`; the first node
/// is the source and the last is the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPath {
    pub id: PathId,
    pub source: EntityId,
    pub target: EntityId,
    /// Hop count, 1..=3. Degree 1 is a direct connection.
    pub degree: u8,
    /// Aggregate warmth, 0..=10, deterministic for the same edges.
    pub warmth_score: f64,
    pub warmth_label: WarmthLabel,
    /// Ranked introducer candidates. Empty for degree-1 paths.
    pub introducers: Vec<Introducer>,
    pub nodes: SmallVec<[Node; 4]>,
    pub edges: SmallVec<[Edge; 3]>,
}

impl ConnectionPath {
    /// Assemble a path from traversal output, enforcing the shape and
    /// degree invariants. Any violation here means the engine produced a
    /// non-compliant path and must fail loudly rather than return it.
    pub fn assemble(
        nodes: SmallVec<[Node; 4]>,
        edges: SmallVec<[Edge; 3]>,
        warmth_score: f64,
        introducers: Vec<Introducer>,
    ) -> Result<Self> {
        if nodes.len() != edges.len() + 1 {
            return Err(Error::Internal(format!(
                "malformed path: {} nodes for {} edges",
                nodes.len(),
                edges.len()
            )));
        }
        let degree = edges.len();
        if degree == 0 || degree > MAX_DEGREE {
            return Err(Error::Internal(format!(
                "path degree {degree} outside 1..={MAX_DEGREE}"
            )));
        }
        if !(0.0..=10.0).contains(&warmth_score) {
            return Err(Error::Internal(format!(
                "warmth score {warmth_score} outside 0..=10"
            )));
        }
        if degree == 1 && !introducers.is_empty() {
            return Err(Error::Internal(
                "degree-1 path carries introducers".to_string(),
            ));
        }

        let id = PathId::derive(nodes.iter().map(|n| &n.id));
        let source = nodes.first().expect("path has at least two nodes").id.clone();
        let target = nodes.last().expect("path has at least two nodes").id.clone();
        let warmth_label = WarmthLabel::for_score(warmth_score);

        Ok(Self {
            id,
            source,
            target,
            degree: degree as u8,
            warmth_score,
            warmth_label,
            introducers,
            nodes,
            edges,
        })
    }

    /// The first hop away from the source, if the path is indirect.
    pub fn first_hop(&self) -> Option<&Node> {
        if self.degree >= 2 { self.nodes.get(1) } else { None }
    }
}
