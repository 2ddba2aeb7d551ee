//! Enhancement-and-allocation pipeline.
//!
//! Contains the core logic for:
//! - Per-candidate feature derivation (Kelly sizing, EV, risk assessment)
//! - Pairwise correlation estimation over a batch
//! - Correlation-penalized allocation and portfolio aggregation
//! - Auditable explanation records for display
//!
//! All stages are synchronous, side-effect-free functions over their
//! explicit inputs. Feature derivation has no ordering dependency across
//! candidates; the batch stages require the complete derived set. Distinct
//! batches never share mutable state.

mod correlation;
mod explain;
mod features;
mod optimizer;
mod summary;
pub mod types;

pub use correlation::RelationEstimator;
pub use explain::{ExplanationGenerator, ExplanationRecord, FeatureAttribution};
pub use features::{
    risk_level_for, AttributeScorer, FeatureDeriver, TableScorer, ASSUMED_ODDS, DEFAULT_KELLY_CAP,
};
pub use optimizer::{PortfolioOptimizer, DEFAULT_MAX_STAKE_PERCENTAGE};
pub use summary::PortfolioSummarizer;
pub use types::{
    Candidate, EnhancedCandidate, PortfolioMetrics, RejectedCandidate, RiskAssessment, RiskLevel,
};

use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Tunable pipeline behavior. Loaded from configuration or supplied by the
/// caller per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// When false the batch stages are skipped entirely and candidates keep
    /// their single-candidate defaults with zeroed portfolio metrics.
    #[serde(default = "default_include_optimization")]
    pub include_portfolio_optimization: bool,
    /// Stake budget spread across the batch (0.0-1.0).
    #[serde(default = "default_max_stake_percentage")]
    pub max_stake_percentage: f64,
    /// Cap on any single Kelly fraction (0.0-1.0).
    #[serde(default = "default_kelly_cap")]
    pub kelly_cap: f64,
}

fn default_include_optimization() -> bool {
    true
}

fn default_max_stake_percentage() -> f64 {
    DEFAULT_MAX_STAKE_PERCENTAGE
}

fn default_kelly_cap() -> f64 {
    DEFAULT_KELLY_CAP
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include_portfolio_optimization: default_include_optimization(),
            max_stake_percentage: default_max_stake_percentage(),
            kelly_cap: default_kelly_cap(),
        }
    }
}

/// Result of one pipeline run: candidates in display order (descending
/// optimal stake), aggregate metrics, and the inputs that were dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub candidates: Vec<EnhancedCandidate>,
    pub metrics: PortfolioMetrics,
    pub rejected: Vec<RejectedCandidate>,
}

/// Orchestrates the full enhancement-and-allocation pass over a batch.
pub struct Pipeline {
    options: PipelineOptions,
    deriver: FeatureDeriver,
    estimator: RelationEstimator,
    optimizer: PortfolioOptimizer,
    summarizer: PortfolioSummarizer,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        let deriver = FeatureDeriver::new(options.kelly_cap);
        let optimizer = PortfolioOptimizer::new(options.max_stake_percentage);
        Self {
            options,
            deriver,
            estimator: RelationEstimator::new(),
            optimizer,
            summarizer: PortfolioSummarizer::new(),
        }
    }

    /// Run the pipeline over a raw candidate batch.
    ///
    /// Malformed candidates are dropped into the report's rejected list and
    /// the rest of the batch proceeds; an empty input yields an empty report
    /// with zeroed metrics. The only fatal error is an internal dimension
    /// mismatch between candidates and the correlation matrix.
    pub fn run(&self, candidates: Vec<Candidate>) -> Result<BatchReport, PipelineError> {
        let batch_size = candidates.len();
        let mut enhanced = Vec::with_capacity(batch_size);
        let mut rejected = Vec::new();

        for candidate in &candidates {
            match self.deriver.derive(candidate) {
                Ok(e) => enhanced.push(e),
                Err(PipelineError::InvalidCandidate { id, reason }) => {
                    warn!(%id, %reason, "Dropping invalid candidate");
                    rejected.push(RejectedCandidate { id, reason });
                }
                Err(other) => return Err(other),
            }
        }

        if !self.options.include_portfolio_optimization {
            info!(
                batch_size,
                enhanced = enhanced.len(),
                rejected = rejected.len(),
                "Batch enhanced without portfolio optimization"
            );
            return Ok(BatchReport {
                generated_at: Utc::now(),
                candidates: enhanced,
                metrics: PortfolioMetrics::empty(),
                rejected,
            });
        }

        let matrix = self.estimator.estimate(&enhanced);
        self.optimizer.optimize(&mut enhanced, &matrix)?;

        // Display order: descending stake, stable so ties keep batch order.
        enhanced.sort_by(|a, b| {
            b.optimal_stake
                .partial_cmp(&a.optimal_stake)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // The matrix is indexed by sequence position, so it must be rebuilt
        // in display order before it is published in the metrics.
        let display_matrix = self.estimator.estimate(&enhanced);
        let metrics = self.summarizer.summarize(&enhanced, &display_matrix);

        info!(
            batch_size,
            enhanced = enhanced.len(),
            rejected = rejected.len(),
            total_expected_value = metrics.total_expected_value,
            diversification = metrics.diversification_score,
            "Batch optimized"
        );

        Ok(BatchReport {
            generated_at: Utc::now(),
            candidates: enhanced,
            metrics,
            rejected,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}
