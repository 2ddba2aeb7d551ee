//! Structured, auditable rationale records for enhanced candidates.
//!
//! Attribution weights are declared constants, not learned; the records are
//! consumed by callers for display and never feed back into optimization.

use crate::pipeline::types::EnhancedCandidate;
use serde::{Deserialize, Serialize};

/// Fixed feature-attribution weights. They sum to 1.0; each contribution is
/// the candidate's confidence scaled by its weight.
const ATTRIBUTION_WEIGHTS: [(&str, f64); 7] = [
    ("recent_performance", 0.25),
    ("matchup_advantage", 0.20),
    ("historical_avg", 0.15),
    ("team_pace", 0.15),
    ("injury_status", 0.10),
    ("weather_conditions", 0.10),
    ("market_movement", 0.05),
];

/// Attribution baseline the contributions are measured against.
const BASELINE: f64 = 50.0;

const TOP_FACTOR_COUNT: usize = 3;

// Risk-factor trigger thresholds.
const HIGH_RISK_THRESHOLD: f64 = 0.6;
const INJURY_RISK_THRESHOLD: f64 = 0.3;
const WEATHER_IMPACT_THRESHOLD: f64 = 0.2;

/// Sentinel emitted when no risk trigger fires, keeping the list non-empty.
const LOW_RISK_SENTINEL: &str = "low risk profile";

/// A single feature's share of the confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub factor: String,
    pub weight: f64,
    pub contribution: f64,
}

/// Deterministic rationale for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRecord {
    pub candidate_id: String,
    pub baseline: f64,
    pub attributions: Vec<FeatureAttribution>,
    /// Largest contributions first, ties broken by declaration order.
    pub top_factors: Vec<FeatureAttribution>,
    /// Always non-empty; "low risk profile" when nothing triggers.
    pub risk_factors: Vec<String>,
    pub rationale: String,
}

/// Maps enhanced candidates to explanation records. Pure and deterministic:
/// template substitution over computed fields, no external calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplanationGenerator;

impl ExplanationGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the explanation record for one candidate.
    pub fn explain(&self, candidate: &EnhancedCandidate) -> ExplanationRecord {
        let attributions = Self::attributions(candidate);
        let top_factors = Self::top_factors(&attributions);
        let risk_factors = Self::risk_factors(candidate);
        let rationale = Self::rationale(candidate);

        ExplanationRecord {
            candidate_id: candidate.candidate.id.clone(),
            baseline: BASELINE,
            attributions,
            top_factors,
            risk_factors,
            rationale,
        }
    }

    /// Explain every candidate in display order.
    pub fn explain_batch(&self, candidates: &[EnhancedCandidate]) -> Vec<ExplanationRecord> {
        candidates.iter().map(|c| self.explain(c)).collect()
    }

    fn attributions(candidate: &EnhancedCandidate) -> Vec<FeatureAttribution> {
        ATTRIBUTION_WEIGHTS
            .iter()
            .map(|&(factor, weight)| FeatureAttribution {
                factor: factor.to_string(),
                weight,
                contribution: candidate.candidate.confidence * weight,
            })
            .collect()
    }

    fn top_factors(attributions: &[FeatureAttribution]) -> Vec<FeatureAttribution> {
        let mut sorted = attributions.to_vec();
        sorted.sort_by(|a, b| {
            b.contribution
                .partial_cmp(&a.contribution)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(TOP_FACTOR_COUNT);
        sorted
    }

    fn risk_factors(candidate: &EnhancedCandidate) -> Vec<String> {
        let mut factors = Vec::new();

        if candidate.risk.overall_risk > HIGH_RISK_THRESHOLD {
            factors.push("high overall risk level".to_string());
        }
        if candidate.candidate.injury_risk > INJURY_RISK_THRESHOLD {
            factors.push("elevated injury risk".to_string());
        }
        if let Some(weather) = candidate.candidate.weather_impact {
            if weather > WEATHER_IMPACT_THRESHOLD {
                factors.push("weather impact concern".to_string());
            }
        }

        if factors.is_empty() {
            factors.push(LOW_RISK_SENTINEL.to_string());
        }
        factors
    }

    fn rationale(candidate: &EnhancedCandidate) -> String {
        format!(
            "Confidence derived from {:.1}% base estimate with composite score {:.1}%. \
             Expected value {:.4} per unit at {} risk. \
             Kelly criterion suggests {:.1}% of bankroll.",
            candidate.candidate.confidence,
            candidate.composite_confidence,
            candidate.expected_value,
            candidate.risk.risk_level,
            candidate.kelly_fraction * 100.0,
        )
    }
}
