//! # Path Traversal
//!
//! Breadth-bounded, cycle-free discovery of simple paths from one source to
//! one or more targets. Depth is capped at [`MAX_DEGREE`] — that ceiling is
//! a business invariant, not a performance knob, and holds even when the
//! underlying store could walk deeper.
//!
//! The engine reads the graph through `GraphStore` and never mutates it, so
//! any number of traversals can run concurrently against one snapshot. All
//! expansion is deterministic: neighbors are visited in (neighbor id,
//! edge id) order, and per-target retention breaks warmth ties by path ID.

use hashbrown::{HashMap, HashSet};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use crate::model::{Edge, EntityId, Node, PathId, MAX_DEGREE};
use crate::score::ScoringPolicy;
use crate::store::GraphStore;
use crate::Result;

/// Paths retained per target after scoring, unless overridden.
pub const DEFAULT_PATH_CAP: usize = 10;

/// Upper bound on partial paths carried between depth levels.
pub const DEFAULT_MAX_FRONTIER: usize = 10_000;

// ============================================================================
// Configuration
// ============================================================================

/// Which paths a traversal should collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Every simple path up to degree 3, subject to the per-target cap.
    #[default]
    AllPaths,
    /// Only the minimum-degree path(s) per target; expansion stops as soon
    /// as every target has been reached.
    ShortestOnly,
}

/// Traversal limits. Depth itself is not configurable.
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    /// Paths retained per target. Candidates are scored first and the
    /// highest-warmth survive, so a low cap never hides a strong path.
    pub per_target_path_cap: usize,
    /// Hard bound on the number of partial paths carried into the next
    /// depth. Overflow is dropped in deterministic generation order.
    pub max_frontier: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            per_target_path_cap: DEFAULT_PATH_CAP,
            max_frontier: DEFAULT_MAX_FRONTIER,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// One simple path from the source to a target, scored but not yet shaped
/// for the wire (no introducers attached; see `ops`).
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPath {
    pub id: PathId,
    /// Source first, target last.
    pub nodes: SmallVec<[Node; 4]>,
    /// One fewer than `nodes`, in hop order.
    pub edges: SmallVec<[Edge; 3]>,
    pub warmth_score: f64,
}

impl DiscoveredPath {
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    /// First hop away from the source, present on degree >= 2 paths.
    pub fn first_hop(&self) -> Option<(&Node, &Edge)> {
        if self.degree() >= 2 {
            Some((&self.nodes[1], &self.edges[0]))
        } else {
            None
        }
    }
}

/// All retained paths for one requested target, ordered by warmth descending
/// with path-ID ascending as the tiebreak.
#[derive(Debug, Clone)]
pub struct TargetPaths {
    pub target: EntityId,
    pub paths: Vec<DiscoveredPath>,
}

// ============================================================================
// Working state
// ============================================================================

#[derive(Clone)]
struct Walk {
    nodes: SmallVec<[Node; 4]>,
    edges: SmallVec<[Edge; 3]>,
}

impl Walk {
    fn seed(source: Node) -> Self {
        Self { nodes: smallvec![source], edges: SmallVec::new() }
    }

    fn tip(&self) -> &Node {
        self.nodes.last().expect("walk always has at least one node")
    }

    fn visits(&self, id: &EntityId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    fn extend(&self, edge: Edge, node: Node) -> Self {
        let mut next = self.clone();
        next.edges.push(edge);
        next.nodes.push(node);
        next
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Find simple paths from `source` to each of `targets`.
///
/// Returns one entry per requested target, in input order. A target that is
/// unreachable within [`MAX_DEGREE`] hops yields an empty path list, not an
/// error: endpoint existence was the caller's concern at resolution time.
///
/// Candidate paths are scored with `policy` *before* the per-target cap is
/// applied, so truncation keeps the warmest paths regardless of the depth
/// at which they were found.
pub async fn discover_paths<S: GraphStore>(
    store: &S,
    policy: &ScoringPolicy,
    config: &TraversalConfig,
    mode: TraversalMode,
    source: &Node,
    targets: &[Node],
) -> Result<Vec<TargetPaths>> {
    let target_index: HashMap<EntityId, usize> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    let mut completed: Vec<Vec<Walk>> = vec![Vec::new(); targets.len()];
    // ShortestOnly: targets whose minimum degree has already been reached.
    let mut done: Vec<bool> = vec![false; targets.len()];

    let mut frontier: Vec<Walk> = vec![Walk::seed(source.clone())];

    for depth in 1..=MAX_DEGREE {
        let mut next: Vec<Walk> = Vec::new();
        let mut overflow = 0usize;

        for walk in &frontier {
            let tip_id = walk.tip().id.clone();
            let mut hops: Vec<(EntityId, Edge)> = store
                .neighbors(&tip_id)
                .await?
                .into_iter()
                .filter_map(|e| e.other_end(&tip_id).cloned().map(|n| (n, e)))
                .collect();
            hops.sort_by(|(na, ea), (nb, eb)| na.cmp(nb).then(ea.id.cmp(&eb.id)));

            for (next_id, edge) in hops {
                // Simple paths only. This also excludes the source at
                // depth > 1, since the source is on every walk.
                if walk.visits(&next_id) {
                    continue;
                }

                let extended = if let Some(&ti) = target_index.get(&next_id) {
                    let extended = walk.extend(edge, targets[ti].clone());
                    if !done[ti] {
                        completed[ti].push(extended.clone());
                    }
                    extended
                } else {
                    let Some(node) = store.node(&next_id).await? else {
                        // Edge to a node the store no longer returns.
                        continue;
                    };
                    walk.extend(edge, node)
                };

                if depth < MAX_DEGREE && worth_extending(&extended, targets, &done) {
                    if next.len() < config.max_frontier {
                        next.push(extended);
                    } else {
                        overflow += 1;
                    }
                }
            }
        }

        if overflow > 0 {
            debug!(
                depth,
                dropped = overflow,
                limit = config.max_frontier,
                "frontier bound reached, pruning expansion"
            );
        }
        trace!(depth, frontier = next.len(), "expansion level complete");

        if mode == TraversalMode::ShortestOnly {
            for (ti, paths) in completed.iter().enumerate() {
                if !paths.is_empty() {
                    done[ti] = true;
                }
            }
            if done.iter().all(|d| *d) {
                break;
            }
        }

        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    targets
        .iter()
        .zip(completed)
        .map(|(target, candidates)| {
            Ok(TargetPaths {
                target: target.id.clone(),
                paths: retain_best(policy, config.per_target_path_cap, candidates)?,
            })
        })
        .collect()
}

/// A walk is only worth carrying forward while some still-wanted target
/// lies off the walk. Anything else can never complete.
fn worth_extending(walk: &Walk, targets: &[Node], done: &[bool]) -> bool {
    targets
        .iter()
        .zip(done)
        .any(|(t, finished)| !finished && !walk.visits(&t.id))
}

/// Score every candidate, then keep the `cap` warmest. Parallel edges can
/// produce the same node sequence twice; the warmer copy wins its path ID.
fn retain_best(
    policy: &ScoringPolicy,
    cap: usize,
    candidates: Vec<Walk>,
) -> Result<Vec<DiscoveredPath>> {
    let mut scored: Vec<DiscoveredPath> = candidates
        .into_iter()
        .map(|walk| {
            let warmth_score = policy.path_warmth(&walk.edges)?;
            Ok(DiscoveredPath {
                id: PathId::derive(walk.nodes.iter().map(|n| &n.id)),
                nodes: walk.nodes,
                edges: walk.edges,
                warmth_score,
            })
        })
        .collect::<Result<_>>()?;

    scored.sort_by(|a, b| {
        b.warmth_score
            .total_cmp(&a.warmth_score)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut seen: HashSet<PathId> = HashSet::new();
    scored.retain(|p| seen.insert(p.id.clone()));
    scored.truncate(cap);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::NodeKind;
    use crate::store::MemoryGraphStore;

    fn seed(store: &MemoryGraphStore, id: &str) -> EntityId {
        store.add_node(Node::new(EntityId::parse(id).unwrap(), id.to_uppercase()))
    }

    async fn run(
        store: &MemoryGraphStore,
        mode: TraversalMode,
        source: &EntityId,
        targets: &[EntityId],
    ) -> Vec<TargetPaths> {
        run_with(store, &TraversalConfig::default(), mode, source, targets).await
    }

    async fn run_with(
        store: &MemoryGraphStore,
        config: &TraversalConfig,
        mode: TraversalMode,
        source: &EntityId,
        targets: &[EntityId],
    ) -> Vec<TargetPaths> {
        let source = store.node(source).await.unwrap().unwrap();
        let mut resolved = Vec::new();
        for t in targets {
            resolved.push(store.node(t).await.unwrap().unwrap());
        }
        discover_paths(
            store,
            &ScoringPolicy::default(),
            config,
            mode,
            &source,
            &resolved,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_paths_through_a_diamond() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let b = seed(&store, "per_b");
        let c = seed(&store, "per_c");
        let tgt = seed(&store, "com_tgt");

        store.connect(&src, &tgt, 4.0);
        store.connect(&src, &b, 9.0);
        store.connect(&b, &tgt, 9.0);
        store.connect(&src, &c, 2.0);
        store.connect(&c, &tgt, 8.0);

        let out = run(&store, TraversalMode::AllPaths, &src, &[tgt.clone()]).await;
        assert_eq!(out.len(), 1);
        let paths = &out[0].paths;
        assert_eq!(paths.len(), 3);

        let degrees: Vec<usize> = paths.iter().map(|p| p.degree()).collect();
        assert!(degrees.contains(&1));
        assert_eq!(degrees.iter().filter(|d| **d == 2).count(), 2);

        // warmth descending
        for pair in paths.windows(2) {
            assert!(pair[0].warmth_score >= pair[1].warmth_score);
        }
        // every path ends at the target and starts at the source
        for p in paths {
            assert_eq!(p.nodes.first().unwrap().id, src);
            assert_eq!(p.nodes.last().unwrap().id, tgt);
            assert_eq!(p.nodes.last().unwrap().kind(), NodeKind::Company);
        }
    }

    #[tokio::test]
    async fn test_shortest_only_stops_at_minimum_degree() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let b = seed(&store, "per_b");
        let c = seed(&store, "per_c");
        let tgt = seed(&store, "com_tgt");

        // two distinct 2-hop routes, no direct edge
        store.connect(&src, &b, 5.0);
        store.connect(&b, &tgt, 5.0);
        store.connect(&src, &c, 7.0);
        store.connect(&c, &tgt, 7.0);
        // and a 3-hop route that must not appear
        let d = seed(&store, "per_d");
        store.connect(&b, &d, 9.0);
        store.connect(&d, &tgt, 9.0);

        let out = run(&store, TraversalMode::ShortestOnly, &src, &[tgt]).await;
        let paths = &out[0].paths;
        assert_eq!(paths.len(), 2, "every minimum-degree path is kept");
        assert!(paths.iter().all(|p| p.degree() == 2));
    }

    #[tokio::test]
    async fn test_degree_ceiling_is_hard() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let b = seed(&store, "per_b");
        let c = seed(&store, "per_c");
        let d = seed(&store, "per_d");
        let tgt = seed(&store, "com_tgt");

        // src -> b -> c -> d -> tgt is four hops, one past the ceiling
        store.connect(&src, &b, 9.0);
        store.connect(&b, &c, 9.0);
        store.connect(&c, &d, 9.0);
        store.connect(&d, &tgt, 9.0);

        let out = run(&store, TraversalMode::AllPaths, &src, &[tgt.clone()]).await;
        assert!(out[0].paths.is_empty());

        // shortcut one hop and the path appears at exactly degree 3
        store.connect(&b, &d, 6.0);
        let out = run(&store, TraversalMode::AllPaths, &src, &[tgt]).await;
        assert_eq!(out[0].paths.len(), 1);
        assert_eq!(out[0].paths[0].degree(), 3);
    }

    #[tokio::test]
    async fn test_cycles_never_repeat_a_node() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let b = seed(&store, "per_b");
        let c = seed(&store, "per_c");
        let tgt = seed(&store, "com_tgt");

        // triangle src-b-c-src plus the target hanging off c
        store.connect(&src, &b, 5.0);
        store.connect(&b, &c, 5.0);
        store.connect(&c, &src, 5.0);
        store.connect(&c, &tgt, 5.0);

        let out = run(&store, TraversalMode::AllPaths, &src, &[tgt]).await;
        for p in &out[0].paths {
            let mut ids: Vec<&EntityId> = p.nodes.iter().map(|n| &n.id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), p.nodes.len(), "simple path repeated a node");
        }
        // src -> c -> tgt and src -> b -> c -> tgt
        assert_eq!(out[0].paths.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_target_is_empty_not_error() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let tgt = seed(&store, "com_island");

        let out = run(&store, TraversalMode::AllPaths, &src, &[tgt]).await;
        assert!(out[0].paths.is_empty());
    }

    #[tokio::test]
    async fn test_cap_keeps_the_warmest_paths() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let tgt = seed(&store, "com_tgt");

        // five 2-hop routes of increasing strength
        for i in 0..5 {
            let mid = seed(&store, &format!("per_mid{i}"));
            let signal = 2.0 + i as f64;
            store.connect(&src, &mid, signal);
            store.connect(&mid, &tgt, signal);
        }

        let config = TraversalConfig { per_target_path_cap: 2, ..Default::default() };
        let out = run_with(
            &store,
            &config,
            TraversalMode::AllPaths,
            &src,
            &[tgt],
        )
        .await;
        let paths = &out[0].paths;
        assert_eq!(paths.len(), 2);
        // the two warmest routes run through mid4 and mid3
        let hops: Vec<&str> = paths.iter().map(|p| p.nodes[1].id.as_str()).collect();
        assert_eq!(hops, vec!["per_mid4", "per_mid3"]);
    }

    #[tokio::test]
    async fn test_multi_target_collects_for_each_in_input_order() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let t1 = seed(&store, "com_one");
        let t2 = seed(&store, "com_two");

        // src -> t1 -> t2: t1 is both a target and a hop toward t2
        store.connect(&src, &t1, 6.0);
        store.connect(&t1, &t2, 6.0);

        let out = run(
            &store,
            TraversalMode::AllPaths,
            &src,
            &[t2.clone(), t1.clone()],
        )
        .await;
        assert_eq!(out[0].target, t2);
        assert_eq!(out[1].target, t1);
        assert_eq!(out[0].paths.len(), 1);
        assert_eq!(out[0].paths[0].degree(), 2);
        assert_eq!(out[1].paths.len(), 1);
        assert_eq!(out[1].paths[0].degree(), 1);
    }

    #[tokio::test]
    async fn test_expansion_order_is_insertion_independent() {
        // Same graph, edges inserted in opposite orders.
        let build = |reversed: bool| {
            let store = MemoryGraphStore::new();
            let src = seed(&store, "per_src");
            let tgt = seed(&store, "com_tgt");
            let mids = ["per_m1", "per_m2", "per_m3"];
            let order: Vec<&str> = if reversed {
                mids.iter().rev().copied().collect()
            } else {
                mids.to_vec()
            };
            for m in order {
                let mid = seed(&store, m);
                store.connect(&src, &mid, 5.0);
                store.connect(&mid, &tgt, 5.0);
            }
            (store, src, tgt)
        };

        let (sa, src_a, tgt_a) = build(false);
        let (sb, src_b, tgt_b) = build(true);
        let a = run(&sa, TraversalMode::AllPaths, &src_a, &[tgt_a]).await;
        let b = run(&sb, TraversalMode::AllPaths, &src_b, &[tgt_b]).await;

        let ids_a: Vec<&PathId> = a[0].paths.iter().map(|p| &p.id).collect();
        let ids_b: Vec<&PathId> = b[0].paths.iter().map(|p| &p.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[tokio::test]
    async fn test_parallel_edges_keep_one_path_per_node_sequence() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let tgt = seed(&store, "com_tgt");

        store.connect(&src, &tgt, 3.0);
        store.connect(&src, &tgt, 9.0);

        let out = run(&store, TraversalMode::AllPaths, &src, &[tgt]).await;
        let paths = &out[0].paths;
        assert_eq!(paths.len(), 1, "same node sequence collapses to one path");
        // the stronger parallel edge decides the score
        assert_eq!(paths[0].edges[0].raw_signal, 9.0);
    }

    #[tokio::test]
    async fn test_frontier_bound_drops_deterministically() {
        let store = MemoryGraphStore::new();
        let src = seed(&store, "per_src");
        let tgt = seed(&store, "com_tgt");

        for i in 0..6 {
            let mid = seed(&store, &format!("per_mid{i}"));
            store.connect(&src, &mid, 5.0);
            store.connect(&mid, &tgt, 5.0);
        }

        // frontier of 3 keeps the first three mids in neighbor-id order
        let config = TraversalConfig { max_frontier: 3, ..Default::default() };
        let out = run_with(&store, &config, TraversalMode::AllPaths, &src, &[tgt]).await;
        let mut hops: Vec<&str> = out[0]
            .paths
            .iter()
            .map(|p| p.nodes[1].id.as_str())
            .collect();
        hops.sort();
        assert_eq!(hops, vec!["per_mid0", "per_mid1", "per_mid2"]);
    }
}
