//! # Relationship Graph Model
//!
//! Clean DTOs shared by every layer: store ↔ traversal ↔ scoring ↔ ops.
//!
//! Design rule: this module is pure data — no I/O, no store handles, no
//! async. Everything here is serde-serializable so the external transport
//! layer can render results without translation.

pub mod edge;
pub mod node;
pub mod page;
pub mod path;
pub mod warmth;

pub use edge::{Edge, EdgeId};
pub use node::{EntityId, Node, NodeKind};
pub use page::Page;
pub use path::{ConnectionPath, Introducer, PathId, MAX_DEGREE};
pub use warmth::WarmthLabel;
