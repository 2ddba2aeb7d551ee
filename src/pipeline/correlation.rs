//! Pairwise correlation estimation over a candidate batch.

use crate::pipeline::types::EnhancedCandidate;

// Fixed attribute-overlap weights. Their sum is the maximum off-diagonal
// correlation before the 1.0 cap.
const SAME_TEAM_WEIGHT: f64 = 0.6;
const SAME_SPORT_WEIGHT: f64 = 0.2;
const SAME_STAT_TYPE_WEIGHT: f64 = 0.2;

/// Estimates an N×N correlation matrix from shared categorical attributes.
///
/// Deterministic and stateless; the order of the input slice defines matrix
/// index order and must stay stable for the batch's lifetime. Empty
/// attribute strings are treated as unknown and never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationEstimator;

impl RelationEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Build the full correlation matrix for a batch. O(N²).
    pub fn estimate(&self, candidates: &[EnhancedCandidate]) -> Vec<Vec<f64>> {
        let n = candidates.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            matrix[i][i] = 1.0;
            for j in (i + 1)..n {
                let correlation = Self::pairwise(&candidates[i], &candidates[j]);
                matrix[i][j] = correlation;
                matrix[j][i] = correlation;
            }
        }

        matrix
    }

    /// Correlation between two distinct candidates, capped at 1.0.
    fn pairwise(a: &EnhancedCandidate, b: &EnhancedCandidate) -> f64 {
        let mut correlation = 0.0;

        if attributes_match(&a.candidate.team, &b.candidate.team) {
            correlation += SAME_TEAM_WEIGHT;
        }
        if attributes_match(&a.candidate.sport, &b.candidate.sport) {
            correlation += SAME_SPORT_WEIGHT;
        }
        if attributes_match(&a.candidate.stat_type, &b.candidate.stat_type) {
            correlation += SAME_STAT_TYPE_WEIGHT;
        }

        correlation.min(1.0)
    }
}

/// Empty strings mean the attribute is unknown; unknowns never match.
fn attributes_match(a: &str, b: &str) -> bool {
    !a.is_empty() && a == b
}
