//! # Relationship Scoring
//!
//! Converts raw edge attributes into relationship strength, and a path's
//! edges into a single warmth score. Pure functions over a tunable policy —
//! no I/O, no state.
//!
//! The policy contract (weights are tunable, the shape is not):
//! - edge strength is strictly increasing in the raw interaction signal,
//!   non-decreasing in mutual-connection count, bounded to [0, 10], and
//!   deterministic for identical inputs
//! - path warmth is the weakest edge strength on the path times a degree
//!   penalty that strictly decreases from degree 1 to 3; a degree-1 path
//!   scores exactly its single edge's strength

use serde::{Deserialize, Serialize};

use crate::model::{Edge, WarmthLabel, MAX_DEGREE};
use crate::{Error, Result};

/// Tunable scoring weights.
///
/// Defaults: `strength = 0.8·clamp(signal, 0, 10) + 2.0·m/(m + 10)` where
/// `m` is the mutual-connection count. The mutual term saturates toward its
/// weight, so strength stays under 10 for every finite input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub signal_weight: f64,
    pub mutual_weight: f64,
    /// Mutual count at which the mutual bonus reaches half its weight.
    pub mutual_midpoint: f64,
    /// Degree penalty factors for degree 1, 2, 3. Must strictly decrease.
    pub degree_factors: [f64; MAX_DEGREE],
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            signal_weight: 0.8,
            mutual_weight: 2.0,
            mutual_midpoint: 10.0,
            degree_factors: [1.0, 0.75, 0.55],
        }
    }
}

impl ScoringPolicy {
    /// Relationship strength of a single edge, in [0, 10].
    pub fn edge_strength(&self, edge: &Edge) -> f64 {
        let signal = edge.raw_signal.clamp(0.0, 10.0);
        let m = edge.mutual_connections as f64;
        let mutual_bonus = self.mutual_weight * m / (m + self.mutual_midpoint);
        (self.signal_weight * signal + mutual_bonus).clamp(0.0, 10.0)
    }

    /// Aggregate warmth of a path, in [0, 10]: an introduction chain is
    /// only as strong as its weakest link, discounted per hop.
    pub fn path_warmth(&self, edges: &[Edge]) -> Result<f64> {
        let degree = edges.len();
        if degree == 0 || degree > MAX_DEGREE {
            return Err(Error::Internal(format!(
                "cannot score a path of degree {degree}"
            )));
        }
        let weakest = edges
            .iter()
            .map(|e| self.edge_strength(e))
            .fold(f64::INFINITY, f64::min);
        Ok((weakest * self.degree_factors[degree - 1]).clamp(0.0, 10.0))
    }

    /// Warmth label for a score, via the fixed band map.
    pub fn label(&self, score: f64) -> WarmthLabel {
        WarmthLabel::for_score(score)
    }
}
