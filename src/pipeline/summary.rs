//! Portfolio-level aggregation over an optimized batch.

use crate::pipeline::types::{EnhancedCandidate, PortfolioMetrics};
use std::collections::HashSet;

/// Floor on mean risk when forming the risk-adjusted return.
const RISK_FLOOR: f64 = 0.01;

/// z-score for a 95% normal-approximation interval.
const Z_95: f64 = 1.96;

/// Pure aggregation of per-candidate figures into portfolio metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioSummarizer;

impl PortfolioSummarizer {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate the batch. Never mutates its input; an empty batch yields
    /// all-zero metrics and an empty correlation matrix, never an error.
    ///
    /// The confidence interval treats the per-candidate expected values as a
    /// finite sample and applies a normal approximation (mean ± 1.96·stddev).
    /// No simulation is involved.
    pub fn summarize(
        &self,
        candidates: &[EnhancedCandidate],
        correlation_matrix: &[Vec<f64>],
    ) -> PortfolioMetrics {
        if candidates.is_empty() {
            return PortfolioMetrics::empty();
        }

        let n = candidates.len() as f64;

        let total_expected_value: f64 = candidates.iter().map(|c| c.expected_value).sum();
        let mean_risk = candidates.iter().map(|c| c.risk.overall_risk).sum::<f64>() / n;

        let distinct_sports: HashSet<&str> = candidates
            .iter()
            .map(|c| c.candidate.sport.as_str())
            .collect();
        let distinct_teams: HashSet<&str> = candidates
            .iter()
            .map(|c| c.candidate.team.as_str())
            .collect();
        let diversification_score =
            ((distinct_sports.len() + distinct_teams.len()) as f64 / (2.0 * n)).min(1.0);

        let allocation = candidates
            .iter()
            .map(|c| (c.candidate.id.clone(), c.optimal_stake))
            .collect();

        let risk_adjusted_return = total_expected_value / mean_risk.max(RISK_FLOOR);

        PortfolioMetrics {
            total_expected_value,
            mean_risk,
            diversification_score,
            correlation_matrix: correlation_matrix.to_vec(),
            allocation,
            risk_adjusted_return,
            confidence_interval: Self::confidence_interval(candidates),
        }
    }

    fn confidence_interval(candidates: &[EnhancedCandidate]) -> (f64, f64) {
        let n = candidates.len() as f64;
        let mean = candidates.iter().map(|c| c.expected_value).sum::<f64>() / n;
        let variance = candidates
            .iter()
            .map(|c| (c.expected_value - mean).powi(2))
            .sum::<f64>()
            / n;
        let stddev = variance.sqrt();
        (mean - Z_95 * stddev, mean + Z_95 * stddev)
    }
}
