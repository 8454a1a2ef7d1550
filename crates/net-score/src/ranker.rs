//! Net Score Ranking Module
//!
//! Scores each ticker by the direction of its growth and trend signals and
//! ranks crossing rows best-first.

use crate::models::RankedRow;
use screen_core::{CrossingRow, FundamentalSnapshot, GrowthMetrics};
use std::collections::HashMap;

/// Points awarded (or deducted) per signal family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    /// Weight for each quarter-over-quarter growth (sales, profit, EPS)
    pub qoq: i32,
    /// Weight for each year-over-year growth (sales, profit, EPS)
    pub yoy: i32,
    /// Weight for each 5-quarter slope (sales, profit)
    pub slope: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { qoq: 1, yoy: 2, slope: 3 }
    }
}

impl ScoreWeights {
    /// Highest reachable score; the lowest is its negation.
    pub fn max_score(&self) -> i32 {
        3 * self.qoq + 3 * self.yoy + 2 * self.slope
    }
}

/// +1 for a strictly positive value, -1 otherwise.
///
/// Missing values count as zero and zero counts as negative, so absent data is
/// penalized the same as decline.
fn sign(value: Option<f64>) -> i32 {
    if value.unwrap_or(0.0) > 0.0 {
        1
    } else {
        -1
    }
}

pub struct NetScoreRanker {
    weights: ScoreWeights,
}

impl Default for NetScoreRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl NetScoreRanker {
    pub fn new() -> Self {
        Self {
            weights: ScoreWeights::default(),
        }
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Net score of one metric set, within `[-max_score, max_score]`.
    pub fn score(&self, m: &GrowthMetrics) -> i32 {
        let w = &self.weights;
        (sign(m.sales_qoq) + sign(m.profit_qoq) + sign(m.eps_qoq)) * w.qoq
            + (sign(m.sales_yoy) + sign(m.profit_yoy) + sign(m.eps_yoy)) * w.yoy
            + (sign(m.sales_slope) + sign(m.profit_slope)) * w.slope
    }

    /// Join rows with snapshots on ticker, score, and sort by score descending.
    ///
    /// The sort is stable, so rows with equal scores keep their input order.
    pub fn rank(&self, rows: &[CrossingRow], snapshots: &[FundamentalSnapshot]) -> Vec<RankedRow> {
        let by_ticker: HashMap<&str, &FundamentalSnapshot> =
            snapshots.iter().map(|s| (s.ticker.as_str(), s)).collect();

        let mut ranked: Vec<RankedRow> = rows
            .iter()
            .map(|row| {
                let snapshot = by_ticker.get(row.ticker.as_str()).copied();
                let metrics = snapshot.map(|s| s.metrics).unwrap_or_default();
                RankedRow::join(row, snapshot, self.score(&metrics))
            })
            .collect();

        ranked.sort_by(|a, b| b.net_score.cmp(&a.net_score));

        tracing::debug!(
            "Ranked {} rows, top score {:?}",
            ranked.len(),
            ranked.first().map(|r| r.net_score)
        );
        ranked
    }
}
