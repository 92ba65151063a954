//! End-to-end tests for batch fan-out and warmth sorting.
//!
//! Covers per-target failure isolation, structural precondition rejection
//! before any dispatch, input-order preservation under concurrency, and
//! the sort_by_warmth bucket ordering.

use warmpath::{
    Engine, EntityId, Error, ErrorKind, MemoryGraphStore, Node, ResolvePathsOptions,
};

fn id(s: &str) -> EntityId {
    EntityId::parse(s).unwrap()
}

/// One source connected to `n` targets at increasing signal strength.
fn setup_fanout(n: usize) -> Engine<MemoryGraphStore> {
    let store = MemoryGraphStore::new();
    let src = store.add_node(Node::new(id("per_src"), "Source"));
    for i in 0..n {
        let tgt = store.add_node(Node::new(id(&format!("per_t{i}")), format!("Target {i}")));
        store.connect(&src, &tgt, 1.0 + (i as f64 % 9.0));
    }
    Engine::new(store)
}

fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// 1. Isolation: one bad target never spoils the batch
// ============================================================================

#[tokio::test]
async fn test_one_unknown_target_is_isolated() {
    let engine = setup_fanout(3);
    let targets = strings(&["per_t0", "per_ghost", "per_t2"]);

    let items = engine
        .batch_resolve_paths("per_src", targets)
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].target, "per_t0");
    assert_eq!(items[1].target, "per_ghost");
    assert_eq!(items[2].target, "per_t2");

    assert_eq!(items[0].outcome.as_ref().unwrap().len(), 1);
    assert!(matches!(
        items[1].outcome,
        Err(Error::TargetNotFound(_))
    ));
    assert_eq!(items[2].outcome.as_ref().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_targets_succeed_with_empty_paths() {
    let engine = setup_fanout(1);
    engine
        .store()
        .add_node(Node::new(id("per_island"), "No Connections"));

    let items = engine
        .batch_resolve_paths("per_src", strings(&["per_t0", "per_island"]))
        .await
        .unwrap();

    assert_eq!(items[0].outcome.as_ref().unwrap().len(), 1);
    // resolvable but unreachable is a success with zero paths, not an error
    assert!(items[1].outcome.as_ref().unwrap().is_empty());
}

// ============================================================================
// 2. Structural preconditions reject the whole batch up front
// ============================================================================

#[tokio::test]
async fn test_fifty_one_person_targets_reject_before_dispatch() {
    let engine = setup_fanout(2);
    let targets: Vec<String> = (0..51).map(|i| format!("per_x{i}")).collect();

    let err = engine
        .batch_resolve_paths("per_src", targets)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(matches!(err, Error::Validation { field: Some("targets"), .. }));
}

#[tokio::test]
async fn test_twenty_one_company_targets_reject_before_dispatch() {
    let engine = setup_fanout(2);
    let targets: Vec<String> = (0..21).map(|i| format!("brand{i}.example")).collect();

    let err = engine
        .batch_resolve_paths("per_src", targets)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_empty_batch_rejects() {
    let engine = setup_fanout(2);
    let err = engine
        .batch_resolve_paths("per_src", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { field: Some("targets"), .. }));
}

#[tokio::test]
async fn test_unknown_source_fails_the_whole_batch() {
    let engine = setup_fanout(2);
    let err = engine
        .batch_resolve_paths("per_nobody", strings(&["per_t0"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceNotFound(_)), "{err}");
}

// ============================================================================
// 3. Ordering under concurrency
// ============================================================================

#[tokio::test]
async fn test_results_preserve_input_order_beyond_the_concurrency_limit() {
    // more targets than the in-flight limit, so some must queue
    let engine = setup_fanout(25);
    let targets: Vec<String> = (0..25).rev().map(|i| format!("per_t{i}")).collect();

    let items = engine
        .batch_resolve_paths("per_src", targets.clone())
        .await
        .unwrap();

    let got: Vec<&str> = items.iter().map(|i| i.target.as_str()).collect();
    let expected: Vec<&str> = targets.iter().map(String::as_str).collect();
    assert_eq!(got, expected);
    assert!(items.iter().all(|i| i.outcome.is_ok()));
}

// ============================================================================
// 4. sort_by_warmth
// ============================================================================

#[tokio::test]
async fn test_sort_by_warmth_buckets_and_orders() {
    let store = MemoryGraphStore::new();
    let src = store.add_node(Node::new(id("per_src"), "Source"));
    let warm = store.add_node(Node::new(id("per_warm"), "Warm"));
    let cool = store.add_node(Node::new(id("per_cool"), "Cool"));
    store.add_node(Node::new(id("per_far"), "Far Away"));
    store.connect(&src, &warm, 9.0);
    store.connect(&src, &cool, 2.0);
    let engine = Engine::new(store);

    let ranked = engine
        .sort_by_warmth(
            "per_src",
            &strings(&["per_cool", "per_missing", "per_far", "per_warm"]),
        )
        .await
        .unwrap();

    let order: Vec<&str> = ranked.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(order, vec!["per_warm", "per_cool", "per_far", "per_missing"]);

    assert!(ranked[0].warmth_score.unwrap() > ranked[1].warmth_score.unwrap());
    assert_eq!(ranked[0].target, Some(id("per_warm")));
    assert!(ranked[0].error.is_none());

    // resolved but unreachable: no score, no error
    assert_eq!(ranked[2].target, Some(id("per_far")));
    assert!(ranked[2].warmth_score.is_none());
    assert!(ranked[2].error.is_none());

    // unresolvable identifier: error kind, nothing else
    assert!(ranked[3].target.is_none());
    assert_eq!(ranked[3].error, Some(ErrorKind::NotFoundError));
}

#[tokio::test]
async fn test_sort_by_warmth_caps_at_fifty() {
    let engine = setup_fanout(1);
    let identifiers: Vec<String> = (0..51).map(|i| format!("per_x{i}")).collect();
    let err = engine
        .sort_by_warmth("per_src", &identifiers)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { field: Some("identifiers"), .. }));
}

#[tokio::test]
async fn test_sort_by_warmth_prefers_the_best_path_per_target() {
    let store = MemoryGraphStore::new();
    let src = store.add_node(Node::new(id("per_src"), "Source"));
    let tgt = store.add_node(Node::new(id("per_tgt"), "Target"));
    let mid = store.add_node(Node::new(id("per_mid"), "Middle"));
    // weak direct edge, strong two-hop route
    store.connect(&src, &tgt, 1.0);
    store.connect(&src, &mid, 9.0);
    store.connect(&mid, &tgt, 9.0);
    let engine = Engine::new(store);

    let ranked = engine
        .sort_by_warmth("per_src", &strings(&["per_tgt"]))
        .await
        .unwrap();

    // the two-hop route outscores the weak direct edge even after the
    // degree penalty, and the best path is what gets reported
    let direct = engine
        .resolve_paths("per_src", "per_tgt", ResolvePathsOptions::default())
        .await
        .unwrap();
    assert_eq!(
        ranked[0].warmth_score.unwrap(),
        direct.items[0].warmth_score
    );
    assert_eq!(direct.items[0].degree, 2);
}
