//! In-memory graph store.
//!
//! This is the reference implementation of `GraphStore`.
//! It uses simple hash maps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No indexes**: search does a full scan with case-insensitive
//!   substring matching.
//! - **Seed-then-read**: seeding methods take `&self` behind locks, so a
//!   cloned handle can keep mutating while an `Engine` reads — tests use
//!   this to exercise pagination under concurrent graph change.
//!
//! Use this store for:
//! - Testing the resolver, traversal, scoring, and ops layers
//! - Embedding warmpath in applications that hold their graph in memory

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{CompanyFilter, GraphStore, PersonFilter};
use crate::model::{Edge, EdgeId, EntityId, Node, NodeKind};
use crate::{Error, Result};

/// Alias chains longer than this indicate a corrupt index.
const MAX_ALIAS_HOPS: usize = 32;

// ============================================================================
// MemoryGraphStore
// ============================================================================

/// In-memory relationship graph. Cloning shares the underlying graph.
#[derive(Clone)]
pub struct MemoryGraphStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<EntityId, Node>>,
    edges: RwLock<HashMap<EdgeId, Edge>>,
    /// node id → adjacent edge IDs
    adjacency: RwLock<HashMap<EntityId, Vec<EdgeId>>>,
    /// alias id → next hop toward the canonical id
    aliases: RwLock<HashMap<EntityId, EntityId>>,
    /// profile URL → person id
    profile_urls: RwLock<HashMap<String, EntityId>>,
    /// lowercased domain → company id
    domains: RwLock<HashMap<String, EntityId>>,
    next_edge_id: AtomicU64,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                edges: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                aliases: RwLock::new(HashMap::new()),
                profile_urls: RwLock::new(HashMap::new()),
                domains: RwLock::new(HashMap::new()),
                next_edge_id: AtomicU64::new(1),
            }),
        }
    }

    // ========================================================================
    // Seeding (not part of the GraphStore contract)
    // ========================================================================

    /// Add a node, indexing its profile URL / domain when present.
    /// Returns the node's ID for convenience in test setup.
    pub fn add_node(&self, node: Node) -> EntityId {
        let id = node.id.clone();
        if let Some(url) = &node.profile_url {
            self.inner.profile_urls.write().insert(url.clone(), id.clone());
        }
        if let Some(domain) = &node.company_domain {
            self.inner.domains.write().insert(domain.to_lowercase(), id.clone());
        }
        self.inner.adjacency.write().entry(id.clone()).or_default();
        self.inner.nodes.write().insert(id.clone(), node);
        id
    }

    /// Connect two nodes with a raw interaction signal. Returns the edge ID.
    pub fn connect(&self, a: &EntityId, b: &EntityId, raw_signal: f64) -> EdgeId {
        let id = EdgeId(self.inner.next_edge_id.fetch_add(1, Ordering::Relaxed));
        self.insert_edge(Edge::new(id, a.clone(), b.clone(), raw_signal));
        id
    }

    /// Connect two nodes with full edge attributes.
    pub fn connect_detailed(
        &self,
        a: &EntityId,
        b: &EntityId,
        raw_signal: f64,
        mutual_connections: u32,
        context: Option<&str>,
    ) -> EdgeId {
        let id = EdgeId(self.inner.next_edge_id.fetch_add(1, Ordering::Relaxed));
        let mut edge = Edge::new(id, a.clone(), b.clone(), raw_signal)
            .with_mutual_connections(mutual_connections);
        if let Some(ctx) = context {
            edge = edge.with_context(ctx);
        }
        self.insert_edge(edge);
        id
    }

    /// Register an alias produced by an upstream record merge.
    /// `alias` resolves to whatever `canonical` resolves to, so merges of
    /// merges form chains the lookup follows.
    pub fn add_alias(&self, alias: EntityId, canonical: EntityId) {
        self.inner.aliases.write().insert(alias, canonical);
    }

    fn insert_edge(&self, edge: Edge) {
        let mut adjacency = self.inner.adjacency.write();
        adjacency.entry(edge.a.clone()).or_default().push(edge.id);
        if edge.a != edge.b {
            adjacency.entry(edge.b.clone()).or_default().push(edge.id);
        }
        drop(adjacency);
        self.inner.edges.write().insert(edge.id, edge);
    }

    fn matches(haystack: Option<&str>, needle: &str) -> bool {
        haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn node(&self, id: &EntityId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(id).cloned())
    }

    async fn resolve_alias(&self, id: &EntityId) -> Result<Option<EntityId>> {
        let nodes = self.inner.nodes.read();
        let aliases = self.inner.aliases.read();

        let mut current = id.clone();
        for _ in 0..MAX_ALIAS_HOPS {
            if nodes.contains_key(&current) {
                return Ok(Some(current));
            }
            match aliases.get(&current) {
                Some(next) => current = next.clone(),
                None => return Ok(None),
            }
        }
        Err(Error::Internal(format!(
            "alias chain for {id} exceeds {MAX_ALIAS_HOPS} hops"
        )))
    }

    async fn neighbors(&self, id: &EntityId) -> Result<Vec<Edge>> {
        let adjacency = self.inner.adjacency.read();
        let edges = self.inner.edges.read();

        let edge_ids = adjacency.get(id).cloned().unwrap_or_default();
        Ok(edge_ids.iter().filter_map(|eid| edges.get(eid).cloned()).collect())
    }

    async fn node_by_profile_url(&self, url: &str) -> Result<Option<Node>> {
        let id = self.inner.profile_urls.read().get(url).cloned();
        match id {
            Some(id) => Ok(self.inner.nodes.read().get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn node_by_company_domain(&self, domain: &str) -> Result<Option<Node>> {
        let id = self.inner.domains.read().get(&domain.to_lowercase()).cloned();
        match id {
            Some(id) => Ok(self.inner.nodes.read().get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn search_people(&self, filter: &PersonFilter) -> Result<Vec<Node>> {
        // Brute force scan (no indexes in the memory store)
        Ok(self
            .inner
            .nodes
            .read()
            .values()
            .filter(|n| n.kind() == NodeKind::Person)
            .filter(|n| {
                filter
                    .name_contains
                    .as_deref()
                    .map_or(true, |q| Self::matches(Some(n.name.as_str()), q))
            })
            .filter(|n| {
                filter
                    .headline_contains
                    .as_deref()
                    .map_or(true, |q| Self::matches(n.headline.as_deref(), q))
            })
            .filter(|n| {
                filter
                    .location
                    .as_deref()
                    .map_or(true, |q| Self::matches(n.location.as_deref(), q))
            })
            .cloned()
            .collect())
    }

    async fn search_companies(&self, filter: &CompanyFilter) -> Result<Vec<Node>> {
        Ok(self
            .inner
            .nodes
            .read()
            .values()
            .filter(|n| n.kind() == NodeKind::Company)
            .filter(|n| {
                filter
                    .name_contains
                    .as_deref()
                    .map_or(true, |q| Self::matches(Some(n.name.as_str()), q))
            })
            .filter(|n| {
                filter
                    .industry
                    .as_deref()
                    .map_or(true, |q| Self::matches(n.industry.as_deref(), q))
            })
            .filter(|n| {
                filter
                    .location
                    .as_deref()
                    .map_or(true, |q| Self::matches(n.location.as_deref(), q))
            })
            .cloned()
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
