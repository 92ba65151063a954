//! # Introducer Ranking
//!
//! Orders the one-hop contacts that can broker an introduction to a target.
//! Pure function of the candidate set — no store access, no side effects.

use hashbrown::HashMap;

use crate::model::{Edge, EntityId, Introducer, Node};
use crate::score::ScoringPolicy;

/// Rank introducer candidates for one target.
///
/// `candidates` pairs each first-hop node (across every discovered path to
/// the target) with its source-side edge. Duplicate nodes collapse to their
/// strongest edge. The returned order is total and deterministic:
/// relationship strength desc, mutual connections desc, canonical ID asc —
/// capped at `cap` without disturbing the order.
pub fn rank_introducers<'a>(
    policy: &ScoringPolicy,
    candidates: impl IntoIterator<Item = (&'a Node, &'a Edge)>,
    cap: usize,
) -> Vec<Introducer> {
    let mut best: HashMap<EntityId, (&Node, &Edge, f64)> = HashMap::new();

    for (node, edge) in candidates {
        let strength = policy.edge_strength(edge);
        match best.get(&node.id) {
            Some((_, kept_edge, kept_strength))
                if *kept_strength > strength
                    || (*kept_strength == strength && kept_edge.id <= edge.id) => {}
            _ => {
                best.insert(node.id.clone(), (node, edge, strength));
            }
        }
    }

    let mut ranked: Vec<Introducer> = best
        .into_values()
        .map(|(node, edge, strength)| Introducer {
            node: node.clone(),
            relationship_strength: strength,
            mutual_connections: edge.mutual_connections,
            context: edge.context.clone(),
        })
        .collect();

    sort_introducers(&mut ranked);
    ranked.truncate(cap);
    ranked
}

/// The introducer total order, exposed so assembled paths can re-verify it.
pub fn sort_introducers(introducers: &mut [Introducer]) {
    introducers.sort_by(|a, b| {
        b.relationship_strength
            .total_cmp(&a.relationship_strength)
            .then(b.mutual_connections.cmp(&a.mutual_connections))
            .then(a.node.id.cmp(&b.node.id))
    });
}
