use chrono::{DateTime, Utc};
use engine::{Dimensions, Error, Result, ScoreReport};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: usize = 100;
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub username: String,
    pub cost: u64,
    pub depth: u32,
    pub width: u32,
    /// Rounded to two decimals, the precision players see.
    pub relative_score: f64,
    pub tree_fingerprint: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// In-memory ranking of finished games. Storage is someone else's problem;
/// this only decides who beats whom.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn submit(
        &mut self,
        report: &ScoreReport,
        username: &str,
        tree_fingerprint: Option<String>,
    ) -> Result<&ScoreEntry> {
        self.submit_at(report, username, tree_fingerprint, Utc::now())
    }

    pub fn submit_at(
        &mut self,
        report: &ScoreReport,
        username: &str,
        tree_fingerprint: Option<String>,
        submitted_at: DateTime<Utc>,
    ) -> Result<&ScoreEntry> {
        let Some(score) = report.relative_score else {
            return Err(Error::invalid_configuration(format!(
                "a {}x{} game has no relative score",
                report.width, report.depth
            )));
        };

        let username = match username.trim() {
            "" => ANONYMOUS,
            name => name,
        };

        self.entries.push(ScoreEntry {
            username: username.to_string(),
            cost: report.total_cost,
            depth: report.depth,
            width: report.width,
            relative_score: round_to_hundredths(score),
            tree_fingerprint,
            submitted_at,
        });
        tracing::info!(username, cost = report.total_cost, "score submitted");

        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Best `limit` results for exactly these dimensions, best first. Equal
    /// scores keep submission order.
    pub fn top(&self, dims: Dimensions, limit: usize) -> Vec<&ScoreEntry> {
        let mut matching: Vec<&ScoreEntry> = self
            .entries
            .iter()
            .filter(|e| e.depth == dims.depth() && e.width == dims.width())
            .collect();
        matching.sort_by(|a, b| {
            a.relative_score
                .total_cmp(&b.relative_score)
                .then(a.submitted_at.cmp(&b.submitted_at))
        });
        matching.truncate(limit);
        matching
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
