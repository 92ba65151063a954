//! # Operations
//!
//! The transport-agnostic operations a partner integration calls: path
//! resolution, people and company search, warmth sorting, and batch
//! fan-out. Every operation validates its inputs before touching the
//! store, orders results deterministically, and paginates keyset-style.
//!
//! Pages are ordered by the exact key their cursors carry (warmth in milli
//! units, names as strings), so presentation order and continuation can
//! never disagree.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::{self, BatchConfig, BatchItem};
use crate::cursor::{self, score_to_milli, CursorState, SortKey};
use crate::model::{ConnectionPath, EntityId, Node, Page, WarmthLabel};
use crate::rank::rank_introducers;
use crate::resolve::resolve_identifier;
use crate::score::ScoringPolicy;
use crate::store::{CompanyFilter, GraphStore, PersonFilter};
use crate::traverse::{discover_paths, DiscoveredPath, TraversalConfig, TraversalMode};
use crate::{Engine, Error, ErrorKind, Result};

/// Identifiers accepted by one `sort_by_warmth` call.
pub const SORT_BY_WARMTH_CAP: usize = 50;

/// Introducer candidates returned per target.
pub const DEFAULT_MAX_INTRODUCERS: usize = 10;

// ============================================================================
// Configuration
// ============================================================================

/// Page size bounds for the paginated operations.
#[derive(Debug, Clone)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_limit: 25, max_limit: 100 }
    }
}

impl PageLimits {
    /// Apply a caller-supplied limit, rejecting zero and over-max values.
    fn effective(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            None => Ok(self.default_limit),
            Some(0) => Err(Error::Validation {
                field: Some("limit"),
                message: "limit must be at least 1".into(),
            }),
            Some(l) if l > self.max_limit => Err(Error::Validation {
                field: Some("limit"),
                message: format!("limit {l} exceeds the maximum of {}", self.max_limit),
            }),
            Some(l) => Ok(l),
        }
    }
}

/// Engine-wide limits and policy knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub traversal: TraversalConfig,
    pub batch: BatchConfig,
    pub scoring: ScoringPolicy,
    pub pages: PageLimits,
    pub max_introducers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalConfig::default(),
            batch: BatchConfig::default(),
            scoring: ScoringPolicy::default(),
            pages: PageLimits::default(),
            max_introducers: DEFAULT_MAX_INTRODUCERS,
        }
    }
}

/// Options for [`Engine::resolve_paths`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvePathsOptions {
    /// Page size; engine default when absent.
    pub limit: Option<usize>,
    /// Continuation token from a previous page.
    pub cursor: Option<String>,
    pub mode: TraversalMode,
}

// ============================================================================
// Warmth ranking output
// ============================================================================

/// One identifier's standing in a `sort_by_warmth` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmthRanked {
    /// The identifier exactly as the caller sent it.
    pub identifier: String,
    /// Canonical target, present when the identifier resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
    /// Best-path warmth; absent when no path exists within three hops.
    pub warmth_score: Option<f64>,
    pub warmth_label: Option<WarmthLabel>,
    /// Why this identifier could not be scored, when it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Scored entries first (warmth desc), then resolved-but-unreachable, then
/// failures; ties break on the identifier string ascending.
fn order_warmth_ranked(ranked: &mut [WarmthRanked]) {
    fn standing(w: &WarmthRanked) -> u8 {
        if w.error.is_some() {
            2
        } else if w.warmth_score.is_none() {
            1
        } else {
            0
        }
    }
    ranked.sort_by(|a, b| {
        standing(a)
            .cmp(&standing(b))
            .then_with(|| {
                let ma = a.warmth_score.map_or(0, score_to_milli);
                let mb = b.warmth_score.map_or(0, score_to_milli);
                mb.cmp(&ma)
            })
            .then_with(|| a.identifier.cmp(&b.identifier))
    });
}

// ============================================================================
// Pagination plumbing
// ============================================================================

fn path_key(path: &ConnectionPath) -> SortKey {
    SortKey::Warmth {
        milli: score_to_milli(path.warmth_score),
        path_id: path.id.as_str().to_string(),
    }
}

fn node_key(node: &Node) -> SortKey {
    SortKey::Name {
        name: node.name.clone(),
        node_id: node.id.as_str().to_string(),
    }
}

/// Slice one page off an already-ordered, already-filtered result set.
fn paginate<T>(
    mut items: Vec<T>,
    limit: usize,
    fingerprint: u64,
    key: impl Fn(&T) -> SortKey,
) -> Result<Page<T>> {
    let has_more = items.len() > limit;
    items.truncate(limit);
    let cursor = match (has_more, items.last()) {
        (true, Some(last)) => Some(CursorState::new(key(last), fingerprint).encode()?),
        _ => None,
    };
    Ok(Page::new(items, cursor, has_more))
}

fn mode_tag(mode: TraversalMode) -> &'static str {
    match mode {
        TraversalMode::AllPaths => "all_paths",
        TraversalMode::ShortestOnly => "shortest_only",
    }
}

// ============================================================================
// Engine operations
// ============================================================================

impl<S: GraphStore> Engine<S> {
    /// How is `source` connected to `target`?
    ///
    /// Returns one warmth-ordered page of connection paths. Both endpoints
    /// accept any identifier form the resolver understands; cursors are
    /// bound to the canonical endpoints plus the traversal mode, so the
    /// same enumeration may continue under a different identifier spelling
    /// but never under a different query.
    pub async fn resolve_paths(
        &self,
        source: &str,
        target: &str,
        options: ResolvePathsOptions,
    ) -> Result<Page<ConnectionPath>> {
        let limit = self.config.pages.effective(options.limit)?;
        let source_node = self.resolve_source(source).await?;
        let target_node = self.resolve_target(target).await?;

        let fingerprint = cursor::fingerprint([
            "resolve_paths",
            source_node.id.as_str(),
            target_node.id.as_str(),
            mode_tag(options.mode),
        ]);
        let after = match options.cursor.as_deref() {
            Some(token) => Some(CursorState::decode(token, fingerprint)?),
            None => None,
        };

        let mut paths = self
            .discover_for(&source_node, &target_node, options.mode)
            .await?;
        debug!(
            source = %source_node.id,
            target = %target_node.id,
            candidates = paths.len(),
            "path discovery complete"
        );

        if let Some(state) = after {
            paths.retain(|p| state.key.strictly_after(&path_key(p)));
        }
        paginate(paths, limit, fingerprint, path_key)
    }

    /// Search people by fielded filter, paged by (name, id).
    pub async fn search_people(
        &self,
        filter: &PersonFilter,
        limit: Option<usize>,
        cursor_token: Option<&str>,
    ) -> Result<Page<Node>> {
        if filter.is_empty() {
            return Err(Error::Validation {
                field: Some("filter"),
                message: "at least one search field is required".into(),
            });
        }
        let limit = self.config.pages.effective(limit)?;
        let fingerprint = cursor::fingerprint([
            "search_people",
            filter.name_contains.as_deref().unwrap_or(""),
            filter.headline_contains.as_deref().unwrap_or(""),
            filter.location.as_deref().unwrap_or(""),
        ]);
        let after = match cursor_token {
            Some(token) => Some(CursorState::decode(token, fingerprint)?),
            None => None,
        };

        let mut nodes = self.store.search_people(filter).await?;
        nodes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        if let Some(state) = after {
            nodes.retain(|n| state.key.strictly_after(&node_key(n)));
        }
        paginate(nodes, limit, fingerprint, node_key)
    }

    /// Search companies by fielded filter, paged by (name, id).
    pub async fn search_companies(
        &self,
        filter: &CompanyFilter,
        limit: Option<usize>,
        cursor_token: Option<&str>,
    ) -> Result<Page<Node>> {
        if filter.is_empty() {
            return Err(Error::Validation {
                field: Some("filter"),
                message: "at least one search field is required".into(),
            });
        }
        let limit = self.config.pages.effective(limit)?;
        let fingerprint = cursor::fingerprint([
            "search_companies",
            filter.name_contains.as_deref().unwrap_or(""),
            filter.industry.as_deref().unwrap_or(""),
            filter.location.as_deref().unwrap_or(""),
        ]);
        let after = match cursor_token {
            Some(token) => Some(CursorState::decode(token, fingerprint)?),
            None => None,
        };

        let mut nodes = self.store.search_companies(filter).await?;
        nodes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        if let Some(state) = after {
            nodes.retain(|n| state.key.strictly_after(&node_key(n)));
        }
        paginate(nodes, limit, fingerprint, node_key)
    }

    /// Annotate up to [`SORT_BY_WARMTH_CAP`] identifiers with their best
    /// warmth toward `source` and order them warmest-first.
    ///
    /// Identifiers that resolve but have no path within three hops come
    /// after every scored entry with an empty score; identifiers that fail
    /// outright come last, carrying the error kind. One bad identifier
    /// never fails the call.
    pub async fn sort_by_warmth(
        &self,
        source: &str,
        identifiers: &[String],
    ) -> Result<Vec<WarmthRanked>> {
        if source.trim().is_empty() {
            return Err(Error::Validation {
                field: Some("source"),
                message: "source identifier is empty".into(),
            });
        }
        if identifiers.is_empty() {
            return Err(Error::Validation {
                field: Some("identifiers"),
                message: "identifier list is empty".into(),
            });
        }
        if identifiers.len() > SORT_BY_WARMTH_CAP {
            return Err(Error::Validation {
                field: Some("identifiers"),
                message: format!(
                    "{} identifiers exceed the cap of {SORT_BY_WARMTH_CAP}",
                    identifiers.len()
                ),
            });
        }

        let source_node = self.resolve_source(source).await?;
        let source_ref = &source_node;

        let mut ranked: Vec<WarmthRanked> = futures::stream::iter(identifiers.iter().cloned())
            .map(|identifier| async move {
                let outcome = async {
                    let target = self.resolve_target(&identifier).await?;
                    let paths = self
                        .discover_for(source_ref, &target, TraversalMode::AllPaths)
                        .await?;
                    Ok::<_, Error>((target, paths))
                }
                .await;
                match outcome {
                    Ok((target, paths)) => {
                        let best = paths.first();
                        WarmthRanked {
                            identifier,
                            target: Some(target.id),
                            warmth_score: best.map(|p| p.warmth_score),
                            warmth_label: best.map(|p| p.warmth_label),
                            error: None,
                        }
                    }
                    Err(e) => WarmthRanked {
                        identifier,
                        target: None,
                        warmth_score: None,
                        warmth_label: None,
                        error: Some(e.kind()),
                    },
                }
            })
            .buffered(self.config.batch.max_in_flight.max(1))
            .collect()
            .await;

        order_warmth_ranked(&mut ranked);
        Ok(ranked)
    }

    /// Resolve paths from one source to many targets concurrently.
    ///
    /// Structural precondition failures reject the whole batch before any
    /// traversal dispatches; per-target failures land in their own
    /// [`BatchItem`]. Output order matches input order.
    pub async fn batch_resolve_paths(
        &self,
        source: &str,
        identifiers: Vec<String>,
    ) -> Result<Vec<BatchItem>> {
        batch::check_preconditions(&self.config.batch, source, &identifiers)?;
        let source_node = self.resolve_source(source).await?;
        let source_ref = &source_node;

        Ok(batch::dispatch(
            identifiers,
            self.config.batch.max_in_flight,
            |identifier| async move {
                let target = self.resolve_target(&identifier).await?;
                self.discover_for(source_ref, &target, TraversalMode::AllPaths)
                    .await
            },
        )
        .await)
    }

    // ------------------------------------------------------------------
    // Shared pipeline pieces
    // ------------------------------------------------------------------

    async fn resolve_source(&self, identifier: &str) -> Result<Node> {
        resolve_identifier(&self.store, identifier)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::SourceNotFound(identifier.to_string()),
                other => other,
            })
    }

    async fn resolve_target(&self, identifier: &str) -> Result<Node> {
        resolve_identifier(&self.store, identifier)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::TargetNotFound(identifier.to_string()),
                other => other,
            })
    }

    /// Traverse to one resolved target, attach introducers, and order the
    /// result by the pagination key (warmth milli desc, path id asc).
    async fn discover_for(
        &self,
        source: &Node,
        target: &Node,
        mode: TraversalMode,
    ) -> Result<Vec<ConnectionPath>> {
        let mut discovered = discover_paths(
            &self.store,
            &self.config.scoring,
            &self.config.traversal,
            mode,
            source,
            std::slice::from_ref(target),
        )
        .await?;
        let target_paths = discovered
            .pop()
            .ok_or_else(|| Error::Internal("traversal dropped its target".into()))?;
        self.shape_paths(target_paths.paths)
    }

    fn shape_paths(&self, discovered: Vec<DiscoveredPath>) -> Result<Vec<ConnectionPath>> {
        let introducers = rank_introducers(
            &self.config.scoring,
            discovered.iter().filter_map(DiscoveredPath::first_hop),
            self.config.max_introducers,
        );

        let mut paths = Vec::with_capacity(discovered.len());
        for p in discovered {
            let attached = if p.degree() >= 2 { introducers.clone() } else { Vec::new() };
            paths.push(ConnectionPath::assemble(
                p.nodes,
                p.edges,
                p.warmth_score,
                attached,
            )?);
        }
        paths.sort_by(|a, b| {
            score_to_milli(b.warmth_score)
                .cmp(&score_to_milli(a.warmth_score))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::EntityId;
    use crate::store::MemoryGraphStore;

    fn node(id: &str, name: &str) -> Node {
        Node::new(EntityId::parse(id).unwrap(), name)
    }

    /// src directly connected to the target and via five mid contacts of
    /// distinct strengths, so resolve_paths yields six paths.
    fn star_engine() -> Engine<MemoryGraphStore> {
        let store = MemoryGraphStore::new();
        let src = store.add_node(node("per_src", "Source"));
        let tgt = store.add_node(
            node("com_tgt", "Target Co").with_company_domain("target.example"),
        );
        store.connect(&src, &tgt, 5.0);
        for i in 0..5 {
            let mid = store.add_node(node(&format!("per_mid{i}"), &format!("Mid {i}")));
            store.connect(&src, &mid, 3.0 + i as f64);
            store.connect(&mid, &tgt, 3.0 + i as f64);
        }
        Engine::new(store)
    }

    #[test]
    fn test_limit_bounds() {
        let pages = PageLimits::default();
        assert_eq!(pages.effective(None).unwrap(), 25);
        assert_eq!(pages.effective(Some(40)).unwrap(), 40);
        assert!(matches!(
            pages.effective(Some(0)),
            Err(Error::Validation { field: Some("limit"), .. })
        ));
        assert!(matches!(
            pages.effective(Some(101)),
            Err(Error::Validation { field: Some("limit"), .. })
        ));
    }

    #[test]
    fn test_warmth_ranking_order() {
        let entry = |identifier: &str, score: Option<f64>, error: Option<ErrorKind>| WarmthRanked {
            identifier: identifier.into(),
            target: None,
            warmth_score: score,
            warmth_label: score.map(WarmthLabel::for_score),
            error,
        };
        let mut ranked = vec![
            entry("e_notfound", None, Some(ErrorKind::NotFoundError)),
            entry("b_cold", Some(2.0), None),
            entry("d_unreachable", None, None),
            entry("a_warm", Some(8.0), None),
            entry("c_cold_too", Some(2.0), None),
        ];
        order_warmth_ranked(&mut ranked);
        let order: Vec<&str> = ranked.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(
            order,
            vec!["a_warm", "b_cold", "c_cold_too", "d_unreachable", "e_notfound"]
        );
    }

    #[tokio::test]
    async fn test_resolve_paths_pages_without_gaps_or_overlap() {
        let engine = star_engine();
        let mut seen: Vec<String> = Vec::new();
        let mut cursor = None;
        let mut rounds = 0;

        loop {
            let page = engine
                .resolve_paths(
                    "per_src",
                    "target.example",
                    ResolvePathsOptions { limit: Some(2), cursor, ..Default::default() },
                )
                .await
                .unwrap();
            assert!(page.count <= 2);
            for p in &page.items {
                seen.push(p.id.as_str().to_string());
            }
            rounds += 1;
            if !page.has_more {
                assert!(page.cursor.is_none());
                break;
            }
            assert_eq!(page.count, 2);
            cursor = page.cursor;
            assert!(cursor.is_some());
        }

        assert_eq!(rounds, 3);
        assert_eq!(seen.len(), 6);
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6, "pages overlapped: {seen:?}");
    }

    #[tokio::test]
    async fn test_cursor_from_another_query_is_rejected() {
        let engine = star_engine();
        let other = engine.store().add_node(
            node("com_other", "Other Co").with_company_domain("other.example"),
        );
        let src = EntityId::parse("per_src").unwrap();
        engine.store().connect(&src, &other, 5.0);

        let first = engine
            .resolve_paths(
                "per_src",
                "target.example",
                ResolvePathsOptions { limit: Some(1), ..Default::default() },
            )
            .await
            .unwrap();
        let stolen = first.cursor.unwrap();

        let err = engine
            .resolve_paths(
                "per_src",
                "other.example",
                ResolvePathsOptions { cursor: Some(stolen), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCursor(_)), "{err}");
    }

    #[tokio::test]
    async fn test_cursor_survives_identifier_respelling() {
        let engine = star_engine();
        let first = engine
            .resolve_paths(
                "per_src",
                "target.example",
                ResolvePathsOptions { limit: Some(2), ..Default::default() },
            )
            .await
            .unwrap();

        // continue the same logical query by canonical id instead of domain
        let second = engine
            .resolve_paths(
                "per_src",
                "com_tgt",
                ResolvePathsOptions {
                    limit: Some(2),
                    cursor: first.cursor,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(second.count, 2);
        assert!(first.items.iter().all(|p| !second.items.contains(p)));
    }

    #[tokio::test]
    async fn test_degree_one_paths_carry_no_introducers() {
        let engine = star_engine();
        let page = engine
            .resolve_paths("per_src", "com_tgt", ResolvePathsOptions::default())
            .await
            .unwrap();

        for path in &page.items {
            if path.degree == 1 {
                assert!(path.introducers.is_empty());
            } else {
                assert!(!path.introducers.is_empty());
                // ranked strongest-first
                for pair in path.introducers.windows(2) {
                    assert!(
                        pair[0].relationship_strength >= pair[1].relationship_strength
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_source_misses_map_to_source_not_found() {
        let engine = star_engine();
        let err = engine
            .resolve_paths("per_ghost", "com_tgt", ResolvePathsOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)), "{err}");

        let err = engine
            .resolve_paths("per_src", "com_ghost", ResolvePathsOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TargetNotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn test_blank_source_is_a_validation_failure() {
        let engine = star_engine();
        let err = engine
            .resolve_paths("   ", "com_tgt", ResolvePathsOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_search_requires_a_filter() {
        let engine = star_engine();
        let err = engine
            .search_people(&PersonFilter::default(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some("filter"), .. }));
    }

    #[tokio::test]
    async fn test_search_people_pages_by_name_then_id() {
        let store = MemoryGraphStore::new();
        store.add_node(node("per_b2", "Ada Prairie"));
        store.add_node(node("per_a1", "Ada Prairie"));
        store.add_node(node("per_c3", "Ada Quarry"));
        let engine = Engine::new(store);

        let filter = PersonFilter {
            name_contains: Some("Ada".into()),
            ..Default::default()
        };
        let first = engine.search_people(&filter, Some(2), None).await.unwrap();
        let ids: Vec<&str> = first.items.iter().map(|n| n.id.as_str()).collect();
        // same name orders by id
        assert_eq!(ids, vec!["per_a1", "per_b2"]);
        assert!(first.has_more);

        let second = engine
            .search_people(&filter, Some(2), first.cursor.as_deref())
            .await
            .unwrap();
        let ids: Vec<&str> = second.items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["per_c3"]);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn test_shortest_only_mode_narrows_the_result() {
        let engine = star_engine();
        let page = engine
            .resolve_paths(
                "per_src",
                "com_tgt",
                ResolvePathsOptions {
                    mode: TraversalMode::ShortestOnly,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].degree, 1);
    }
}
