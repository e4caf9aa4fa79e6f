use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::Dimensions;

/// How a finished game's cost is normalised for cross-size comparison.
/// Lower is better under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoringPolicy {
    /// `cost / depth / ln(width)`
    #[default]
    LogWidth,
    /// `cost / depth`
    PerDepth,
}

impl ScoringPolicy {
    /// `None` where the formula has no finite value: zero depth, or width 1
    /// under [`ScoringPolicy::LogWidth`] (ln 1 = 0).
    pub fn relative_score(self, total_cost: u64, dims: Dimensions) -> Option<f64> {
        if dims.depth() == 0 {
            return None;
        }
        let per_depth = total_cost as f64 / f64::from(dims.depth());
        match self {
            ScoringPolicy::PerDepth => Some(per_depth),
            ScoringPolicy::LogWidth => {
                if dims.width() <= 1 {
                    None
                } else {
                    Some(per_depth / f64::from(dims.width()).ln())
                }
            }
        }
    }
}

/// Handed to the leaderboard once a game completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub total_cost: u64,
    pub depth: u32,
    pub width: u32,
    pub relative_score: Option<f64>,
}

impl ScoreReport {
    pub fn new(total_cost: u64, dims: Dimensions, policy: ScoringPolicy) -> Self {
        Self {
            total_cost,
            depth: dims.depth(),
            width: dims.width(),
            relative_score: policy.relative_score(total_cost, dims),
        }
    }

    /// Fails for a report deserialized with a shape no game could have had.
    pub fn dimensions(&self) -> Result<Dimensions> {
        Dimensions::new(self.width, self.depth)
    }
}
