//! Correlation-penalized allocation across a candidate batch.

use crate::error::PipelineError;
use crate::pipeline::types::EnhancedCandidate;
use tracing::debug;

/// Floor on variance contribution when forming the pseudo-Sharpe ratio.
const VARIANCE_FLOOR: f64 = 0.01;

/// Fraction of the correlation penalty applied to the score.
const PENALTY_SCALE: f64 = 0.5;

/// Default maximum stake fraction across the batch.
pub const DEFAULT_MAX_STAKE_PERCENTAGE: f64 = 0.25;

/// Solves for a normalized allocation vector that favors high risk-adjusted
/// return while penalizing correlated concentration.
pub struct PortfolioOptimizer {
    max_stake_percentage: f64,
}

impl PortfolioOptimizer {
    pub fn new(max_stake_percentage: f64) -> Self {
        Self {
            max_stake_percentage,
        }
    }

    /// Compute normalized weights and write stakes back into the batch.
    ///
    /// Requires the correlation matrix dimension to equal the candidate
    /// count; a mismatch is an internal invariant violation and fails the
    /// whole batch rather than silently truncating.
    ///
    /// Single-candidate batches skip optimization entirely and keep the
    /// `kelly_fraction · 0.5` default stake.
    pub fn optimize(
        &self,
        candidates: &mut [EnhancedCandidate],
        correlation_matrix: &[Vec<f64>],
    ) -> Result<Vec<f64>, PipelineError> {
        let n = candidates.len();
        self.check_dimensions(n, correlation_matrix)?;

        if n == 0 {
            return Ok(Vec::new());
        }
        if n == 1 {
            candidates[0].optimal_stake = candidates[0].kelly_fraction * 0.5;
            candidates[0].portfolio_impact = 1.0;
            return Ok(vec![1.0]);
        }

        let weights = self.weights(candidates, correlation_matrix);
        for (candidate, &weight) in candidates.iter_mut().zip(weights.iter()) {
            candidate.optimal_stake = weight * self.max_stake_percentage;
            candidate.portfolio_impact = weight;
        }

        debug!(
            batch_size = n,
            total_stake = weights.iter().sum::<f64>() * self.max_stake_percentage,
            "Optimized batch allocation"
        );

        Ok(weights)
    }

    fn check_dimensions(
        &self,
        n: usize,
        correlation_matrix: &[Vec<f64>],
    ) -> Result<(), PipelineError> {
        let mismatch = correlation_matrix.len() != n
            || correlation_matrix.iter().any(|row| row.len() != n);
        if mismatch {
            return Err(PipelineError::DimensionMismatch {
                candidates: n,
                matrix: correlation_matrix.len(),
            });
        }
        Ok(())
    }

    /// Pseudo-Sharpe scoring with a mean-correlation penalty, normalized to
    /// sum to 1.0. Falls back to uniform weights when every adjusted score is
    /// zero; the fallback is the documented degenerate-case policy, not an
    /// error.
    fn weights(
        &self,
        candidates: &[EnhancedCandidate],
        correlation_matrix: &[Vec<f64>],
    ) -> Vec<f64> {
        let n = candidates.len();

        let adjusted: Vec<f64> = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let pseudo_sharpe =
                    candidate.expected_value / candidate.variance_contribution.max(VARIANCE_FLOOR);
                let penalty: f64 = correlation_matrix[i]
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, &c)| c)
                    .sum::<f64>()
                    / (n - 1) as f64;
                (pseudo_sharpe * (1.0 - PENALTY_SCALE * penalty)).max(0.0)
            })
            .collect();

        let total: f64 = adjusted.iter().sum();
        if total > 0.0 {
            adjusted.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / n as f64; n]
        }
    }
}

impl Default for PortfolioOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STAKE_PERCENTAGE)
    }
}
