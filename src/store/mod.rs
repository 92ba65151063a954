//! # Graph Store Contract
//!
//! This is THE contract between warmpath and the external social-graph
//! store. It is deliberately narrow and read-only: the core never mutates
//! graph data, and one traversal treats the store as an immutable snapshot.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryGraphStore` | `memory` | In-memory reference store for testing/embedding |
//!
//! Adapters over remote stores must map their transport failures to
//! [`Error::StoreUnavailable`](crate::Error::StoreUnavailable): the core
//! never retries, so transient faults surface to the caller unchanged.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Edge, EntityId, Node};
use crate::Result;

pub use memory::MemoryGraphStore;

// ============================================================================
// Search filters
// ============================================================================

/// Filter criteria for people search. All present criteria must match;
/// string matches are case-insensitive substring tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PersonFilter {
    /// A filter with no criteria matches everything, which is a caller
    /// mistake — ops reject it before the store sees it.
    pub fn is_empty(&self) -> bool {
        self.name_contains.is_none()
            && self.headline_contains.is_none()
            && self.location.is_none()
    }
}

/// Filter criteria for company search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CompanyFilter {
    pub fn is_empty(&self) -> bool {
        self.name_contains.is_none() && self.industry.is_none() && self.location.is_none()
    }
}

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The universal read-only store contract.
///
/// Any adapter that implements this trait can serve the core. Methods
/// return plain `Option`/`Vec` results; "not present" is never an error at
/// this layer — the resolver and traversal decide what absence means.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    /// Fetch a node by its canonical ID. Alias IDs return `None` here;
    /// callers resolve aliases first via [`resolve_alias`](Self::resolve_alias).
    async fn node(&self, id: &EntityId) -> Result<Option<Node>>;

    /// Resolve an ID (canonical or alias) to its canonical ID.
    ///
    /// Upstream record merges chain aliases, so implementations follow the
    /// alias index to its terminal entry. Returns `None` for IDs the store
    /// has never seen.
    async fn resolve_alias(&self, id: &EntityId) -> Result<Option<EntityId>>;

    /// All edges adjacent to a node, with their strength attributes.
    /// Unknown nodes yield an empty list.
    async fn neighbors(&self, id: &EntityId) -> Result<Vec<Edge>>;

    /// Look up a person node by public profile URL (exact match).
    async fn node_by_profile_url(&self, url: &str) -> Result<Option<Node>>;

    /// Look up a company node by web domain (case-insensitive).
    async fn node_by_company_domain(&self, domain: &str) -> Result<Option<Node>>;

    /// People matching the filter, in store order. The ops layer applies
    /// the deterministic sort — store order is never trusted for paging.
    async fn search_people(&self, filter: &PersonFilter) -> Result<Vec<Node>>;

    /// Companies matching the filter, in store order.
    async fn search_companies(&self, filter: &CompanyFilter) -> Result<Vec<Node>>;
}
