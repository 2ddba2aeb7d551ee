//! Data model for the enhancement-and-allocation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw wager candidate as delivered by a provider.
///
/// Categorical descriptors (`team`, `sport`, `stat_type`) may be empty when
/// the upstream source does not know them; empty attributes never match in
/// correlation estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique identifier within a batch.
    pub id: String,
    /// Player the line refers to.
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub sport: String,
    #[serde(default)]
    pub stat_type: String,
    /// Recommended side, e.g. "OVER" or "UNDER".
    #[serde(default = "default_recommendation")]
    pub recommendation: String,
    /// Estimated probability that the recommended side occurs, scaled to 0-100.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// The posted line for the stat.
    #[serde(default)]
    pub line_value: f64,
    /// Optional weather signal in [0, 1].
    #[serde(default)]
    pub weather_impact: Option<f64>,
    /// Injury signal in [0, 1].
    #[serde(default = "default_injury_risk")]
    pub injury_risk: f64,
}

fn default_recommendation() -> String {
    "OVER".to_string()
}

fn default_confidence() -> f64 {
    75.0
}

fn default_injury_risk() -> f64 {
    0.1
}

/// Qualitative risk bucket derived from the overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Per-candidate risk breakdown. All components live in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk: f64,
    pub confidence_risk: f64,
    pub line_risk: f64,
    pub market_risk: f64,
    pub risk_level: RiskLevel,
}

/// A candidate enriched with derived risk/return features.
///
/// Created per batch by the feature deriver; `optimal_stake`,
/// `portfolio_impact` and `variance_contribution` start at single-candidate
/// defaults and are overwritten in place when a batch optimization runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,

    /// Capped Kelly-optimal bankroll fraction.
    pub kelly_fraction: f64,
    /// Expected per-unit return scaled by the Kelly fraction.
    pub expected_value: f64,
    /// Bounded blend of raw confidence with deterministic attribute signals,
    /// clamped to [50, 99.9].
    pub composite_confidence: f64,
    pub risk: RiskAssessment,

    pub optimal_stake: f64,
    pub portfolio_impact: f64,
    pub variance_contribution: f64,
}

impl EnhancedCandidate {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// Aggregate portfolio view over an optimized batch. Recomputed on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_expected_value: f64,
    pub mean_risk: f64,
    /// Normalized categorical spread across sports and teams, in [0, 1].
    pub diversification_score: f64,
    /// Symmetric with unit diagonal; indexed in the batch's display order.
    pub correlation_matrix: Vec<Vec<f64>>,
    /// Candidate id -> stake fraction. BTreeMap keeps iteration order stable
    /// for display and serialization.
    pub allocation: BTreeMap<String, f64>,
    pub risk_adjusted_return: f64,
    /// Normal-approximation interval over the candidate-level expected value
    /// distribution; no simulation is involved.
    pub confidence_interval: (f64, f64),
}

impl PortfolioMetrics {
    /// All-zero metrics for an empty batch or a skipped optimization.
    pub fn empty() -> Self {
        Self {
            total_expected_value: 0.0,
            mean_risk: 0.0,
            diversification_score: 0.0,
            correlation_matrix: Vec::new(),
            allocation: BTreeMap::new(),
            risk_adjusted_return: 0.0,
            confidence_interval: (0.0, 0.0),
        }
    }

    /// Format metrics as a human-readable summary block.
    pub fn summary(&self) -> String {
        format!(
            r#"═══════════════════════════════════════════════
PORTFOLIO METRICS ({} allocations)
═══════════════════════════════════════════════
  Total Expected Value:  {:.4}
  Mean Risk:             {:.3}
  Diversification:       {:.2}
  Risk-Adjusted Return:  {:.3}
  95% EV Interval:       [{:.4}, {:.4}]
═══════════════════════════════════════════════"#,
            self.allocation.len(),
            self.total_expected_value,
            self.mean_risk,
            self.diversification_score,
            self.risk_adjusted_return,
            self.confidence_interval.0,
            self.confidence_interval.1,
        )
    }
}

/// A candidate dropped during feature derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub id: String,
    pub reason: String,
}
