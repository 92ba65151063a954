//! Warmth label banding over the 0..=10 score range.

use serde::{Deserialize, Serialize};

/// Banded measure of how strong an introduction path is.
///
/// Bands are fixed, contiguous, and cover the full [0, 10] range:
/// Poor [0,2), Fair [2,4), Good [4,6), Very Good [6,8), Excellent [8,10].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WarmthLabel {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl WarmthLabel {
    /// Map a warmth score to its band. Scores are clamped to [0, 10] first,
    /// so an out-of-range input can never produce a gap.
    pub fn for_score(score: f64) -> Self {
        let s = score.clamp(0.0, 10.0);
        match s {
            s if s < 2.0 => WarmthLabel::Poor,
            s if s < 4.0 => WarmthLabel::Fair,
            s if s < 6.0 => WarmthLabel::Good,
            s if s < 8.0 => WarmthLabel::VeryGood,
            _ => WarmthLabel::Excellent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarmthLabel::Poor => "Poor",
            WarmthLabel::Fair => "Fair",
            WarmthLabel::Good => "Good",
            WarmthLabel::VeryGood => "Very Good",
            WarmthLabel::Excellent => "Excellent",
        }
    }
}

impl std::fmt::Display for WarmthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
