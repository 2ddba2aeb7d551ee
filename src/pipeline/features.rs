//! Per-candidate feature derivation: Kelly sizing, expected value, composite
//! confidence and risk assessment.

use crate::error::PipelineError;
use crate::pipeline::types::{Candidate, EnhancedCandidate, RiskAssessment, RiskLevel};
use tracing::trace;

/// Payout odds assumed for every line (standard -105 approximation).
pub const ASSUMED_ODDS: f64 = 1.95;

/// Default cap on the Kelly fraction for risk control.
pub const DEFAULT_KELLY_CAP: f64 = 0.25;

/// Constant market risk baseline used in the risk assessment.
const MARKET_RISK_BASELINE: f64 = 0.2;

// Composite confidence blend weights. Declared constants, not learned.
const RAW_CONFIDENCE_WEIGHT: f64 = 0.60;
const TEAM_SIGNAL_WEIGHT: f64 = 0.25;
const SPORT_SIGNAL_WEIGHT: f64 = 0.15;

const COMPOSITE_FLOOR: f64 = 50.0;
const COMPOSITE_CEILING: f64 = 99.9;

/// Deterministic scalar signal per categorical attribute, on a 0-100 scale.
///
/// Implementations must be pure functions of the attribute string. A real
/// predictive model can be plugged in behind this trait; the default
/// [`TableScorer`] is an explicitly non-predictive fixed lookup table.
pub trait AttributeScorer: Send + Sync {
    fn score(&self, attribute: &str) -> f64;
}

/// Fixed lookup table over well-known sport labels with a neutral fallback.
///
/// Stands in for whatever signal source the deployment supplies. The values
/// carry no predictive content; they exist so the composite blend is
/// reproducible and testable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableScorer;

/// Neutral signal for attributes the table does not know.
const NEUTRAL_SIGNAL: f64 = 80.0;

impl AttributeScorer for TableScorer {
    fn score(&self, attribute: &str) -> f64 {
        match attribute.to_uppercase().as_str() {
            "NBA" => 88.0,
            "NFL" => 86.0,
            "NHL" => 85.0,
            "MLB" | "WNBA" => 84.0,
            "SOCCER" | "EPL" => 83.0,
            "MLS" => 82.0,
            _ => NEUTRAL_SIGNAL,
        }
    }
}

/// Classify an overall risk score into a qualitative bucket.
///
/// Boundary policy is inclusive on the high side: exactly 0.3 is medium,
/// exactly 0.6 is high.
pub fn risk_level_for(overall_risk: f64) -> RiskLevel {
    if overall_risk < 0.3 {
        RiskLevel::Low
    } else if overall_risk < 0.6 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Derives risk/return features for a single candidate.
///
/// Pure function of its input plus the fixed odds assumption; safe to run
/// over candidates independently and in parallel.
pub struct FeatureDeriver<S: AttributeScorer = TableScorer> {
    kelly_cap: f64,
    scorer: S,
}

impl FeatureDeriver<TableScorer> {
    /// Create a deriver with the default table scorer.
    pub fn new(kelly_cap: f64) -> Self {
        Self::with_scorer(kelly_cap, TableScorer)
    }
}

impl<S: AttributeScorer> FeatureDeriver<S> {
    /// Create a deriver with a caller-supplied attribute scorer.
    pub fn with_scorer(kelly_cap: f64, scorer: S) -> Self {
        Self { kelly_cap, scorer }
    }

    /// Derive the full feature set for one candidate.
    ///
    /// Rejects candidates whose confidence falls outside [0, 100] or whose
    /// line value is non-finite.
    pub fn derive(&self, candidate: &Candidate) -> Result<EnhancedCandidate, PipelineError> {
        self.validate(candidate)?;

        let kelly_fraction = self.kelly_fraction(candidate.confidence);
        let expected_value = Self::expected_value(candidate.confidence, kelly_fraction);
        let composite_confidence = self.composite_confidence(candidate);
        let risk = Self::assess_risk(candidate);
        let variance_contribution = Self::variance_contribution(candidate.confidence);

        trace!(
            id = %candidate.id,
            kelly_fraction,
            expected_value,
            composite_confidence,
            overall_risk = risk.overall_risk,
            "Derived candidate features"
        );

        Ok(EnhancedCandidate {
            candidate: candidate.clone(),
            kelly_fraction,
            expected_value,
            composite_confidence,
            risk,
            // Single-candidate defaults, overwritten by batch optimization.
            optimal_stake: kelly_fraction * 0.5,
            portfolio_impact: 1.0,
            variance_contribution,
        })
    }

    fn validate(&self, candidate: &Candidate) -> Result<(), PipelineError> {
        if !candidate.confidence.is_finite()
            || candidate.confidence < 0.0
            || candidate.confidence > 100.0
        {
            return Err(PipelineError::InvalidCandidate {
                id: candidate.id.clone(),
                reason: format!("confidence {} outside [0, 100]", candidate.confidence),
            });
        }
        if !candidate.line_value.is_finite() {
            return Err(PipelineError::InvalidCandidate {
                id: candidate.id.clone(),
                reason: "line_value is not finite".to_string(),
            });
        }
        Ok(())
    }

    /// Kelly criterion: f = (b·p − q) / b, clamped to [0, kelly_cap].
    fn kelly_fraction(&self, confidence: f64) -> f64 {
        let p = confidence / 100.0;
        let b = ASSUMED_ODDS - 1.0;
        let q = 1.0 - p;
        let kelly = (b * p - q) / b;
        kelly.clamp(0.0, self.kelly_cap)
    }

    /// Expected per-unit return scaled by the Kelly fraction.
    fn expected_value(confidence: f64, kelly_fraction: f64) -> f64 {
        let p = confidence / 100.0;
        let profit = ASSUMED_ODDS - 1.0;
        let ev = p * profit - (1.0 - p);
        ev * kelly_fraction
    }

    /// Weighted blend of raw confidence with attribute signals, clamped to
    /// [50, 99.9].
    fn composite_confidence(&self, candidate: &Candidate) -> f64 {
        let team_signal = self.scorer.score(&candidate.team);
        let sport_signal = self.scorer.score(&candidate.sport);
        let blended = RAW_CONFIDENCE_WEIGHT * candidate.confidence
            + TEAM_SIGNAL_WEIGHT * team_signal
            + SPORT_SIGNAL_WEIGHT * sport_signal;
        blended.clamp(COMPOSITE_FLOOR, COMPOSITE_CEILING)
    }

    fn assess_risk(candidate: &Candidate) -> RiskAssessment {
        let confidence_risk = ((90.0 - candidate.confidence) / 90.0).max(0.0);
        let line_risk = ((candidate.line_value - 50.0).abs() / 100.0).min(0.5);
        let market_risk = MARKET_RISK_BASELINE;
        let overall_risk = (confidence_risk + line_risk + market_risk) / 3.0;

        RiskAssessment {
            overall_risk,
            confidence_risk,
            line_risk,
            market_risk,
            risk_level: risk_level_for(overall_risk),
        }
    }

    /// Default contribution to portfolio variance before optimization runs.
    fn variance_contribution(confidence: f64) -> f64 {
        let confidence_variance = (100.0 - confidence) / 100.0;
        let line_variance = 0.2;
        (confidence_variance + line_variance) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn test_candidate(confidence: f64, line_value: f64) -> Candidate {
        Candidate {
            id: "c1".to_string(),
            player_name: "Test Player".to_string(),
            team: "LAL".to_string(),
            sport: "NBA".to_string(),
            stat_type: "points".to_string(),
            recommendation: "OVER".to_string(),
            confidence,
            line_value,
            weather_impact: None,
            injury_risk: 0.1,
        }
    }

    fn deriver() -> FeatureDeriver {
        FeatureDeriver::new(DEFAULT_KELLY_CAP)
    }

    // =========================================================================
    // Kelly Fraction Tests
    // =========================================================================

    #[test]
    fn test_kelly_fraction_capped_for_high_confidence() {
        // Raw Kelly at 80% confidence: (0.95*0.8 - 0.2)/0.95 ≈ 0.589
        let enhanced = deriver().derive(&test_candidate(80.0, 25.0)).unwrap();
        assert_eq!(enhanced.kelly_fraction, DEFAULT_KELLY_CAP);
    }

    #[test]
    fn test_kelly_fraction_uncapped_value() {
        // Raw Kelly at 60% confidence: (0.95*0.6 - 0.4)/0.95 ≈ 0.17895
        let enhanced = deriver().derive(&test_candidate(60.0, 25.0)).unwrap();
        assert!((enhanced.kelly_fraction - 0.17 / 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_kelly_fraction_floored_at_zero() {
        // 40% confidence has negative edge at 1.95 odds
        let enhanced = deriver().derive(&test_candidate(40.0, 25.0)).unwrap();
        assert_eq!(enhanced.kelly_fraction, 0.0);
    }

    #[test]
    fn test_kelly_fraction_in_range_across_domain() {
        let d = deriver();
        for confidence in (0..=100).map(|c| c as f64) {
            let enhanced = d.derive(&test_candidate(confidence, 25.0)).unwrap();
            assert!(enhanced.kelly_fraction >= 0.0);
            assert!(enhanced.kelly_fraction <= DEFAULT_KELLY_CAP);
        }
    }

    #[test]
    fn test_custom_kelly_cap_respected() {
        let d = FeatureDeriver::new(0.10);
        let enhanced = d.derive(&test_candidate(95.0, 25.0)).unwrap();
        assert_eq!(enhanced.kelly_fraction, 0.10);
    }

    // =========================================================================
    // Expected Value Tests
    // =========================================================================

    #[test]
    fn test_expected_value_scaled_by_kelly() {
        let enhanced = deriver().derive(&test_candidate(60.0, 25.0)).unwrap();
        // EV per unit = 0.6*0.95 - 0.4 = 0.17, scaled by kelly ≈ 0.17895
        let expected = 0.17 * (0.17 / 0.95);
        assert!((enhanced.expected_value - expected).abs() < 1e-10);
    }

    #[test]
    fn test_expected_value_zero_when_kelly_zero() {
        let enhanced = deriver().derive(&test_candidate(30.0, 25.0)).unwrap();
        assert_eq!(enhanced.expected_value, 0.0);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_rejects_confidence_above_100() {
        let err = deriver().derive(&test_candidate(101.0, 25.0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCandidate { .. }));
    }

    #[test]
    fn test_rejects_negative_confidence() {
        let err = deriver().derive(&test_candidate(-1.0, 25.0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCandidate { .. }));
    }

    #[test]
    fn test_rejects_nan_confidence() {
        let err = deriver().derive(&test_candidate(f64::NAN, 25.0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCandidate { .. }));
    }

    #[test]
    fn test_rejects_non_finite_line_value() {
        let err = deriver()
            .derive(&test_candidate(75.0, f64::INFINITY))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCandidate { id, .. } if id == "c1"));
    }

    #[test]
    fn test_boundary_confidence_values_accepted() {
        assert!(deriver().derive(&test_candidate(0.0, 25.0)).is_ok());
        assert!(deriver().derive(&test_candidate(100.0, 25.0)).is_ok());
    }

    // =========================================================================
    // Composite Confidence Tests
    // =========================================================================

    #[test]
    fn test_composite_confidence_bounded() {
        let d = deriver();
        for confidence in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let enhanced = d.derive(&test_candidate(confidence, 25.0)).unwrap();
            assert!(enhanced.composite_confidence >= 50.0);
            assert!(enhanced.composite_confidence <= 99.9);
        }
    }

    #[test]
    fn test_composite_confidence_deterministic() {
        let d = deriver();
        let a = d.derive(&test_candidate(75.0, 25.0)).unwrap();
        let b = d.derive(&test_candidate(75.0, 25.0)).unwrap();
        assert_eq!(a.composite_confidence, b.composite_confidence);
    }

    #[test]
    fn test_composite_confidence_blend_value() {
        // NBA sport signal 88, unknown team "LAL" falls back to neutral 80
        let enhanced = deriver().derive(&test_candidate(75.0, 25.0)).unwrap();
        let expected = 0.60 * 75.0 + 0.25 * 80.0 + 0.15 * 88.0;
        assert!((enhanced.composite_confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn test_table_scorer_neutral_fallback() {
        let scorer = TableScorer;
        assert_eq!(scorer.score("SOMETHING_UNKNOWN"), 80.0);
        assert_eq!(scorer.score(""), 80.0);
        assert_eq!(scorer.score("nba"), 88.0); // case insensitive
    }

    // =========================================================================
    // Risk Assessment Tests
    // =========================================================================

    #[test]
    fn test_risk_components_formulas() {
        let enhanced = deriver().derive(&test_candidate(75.0, 30.0)).unwrap();
        let risk = &enhanced.risk;
        assert!((risk.confidence_risk - (90.0 - 75.0) / 90.0).abs() < 1e-12);
        assert!((risk.line_risk - 0.2).abs() < 1e-12);
        assert_eq!(risk.market_risk, 0.2);
        let mean = (risk.confidence_risk + risk.line_risk + risk.market_risk) / 3.0;
        assert!((risk.overall_risk - mean).abs() < 1e-12);
    }

    #[test]
    fn test_line_risk_capped_at_half() {
        let enhanced = deriver().derive(&test_candidate(75.0, 500.0)).unwrap();
        assert_eq!(enhanced.risk.line_risk, 0.5);
    }

    #[test]
    fn test_confidence_risk_floored_for_high_confidence() {
        let enhanced = deriver().derive(&test_candidate(95.0, 50.0)).unwrap();
        assert_eq!(enhanced.risk.confidence_risk, 0.0);
    }

    #[test]
    fn test_risk_level_boundary_exactly_point_three_is_medium() {
        assert_eq!(risk_level_for(0.3), RiskLevel::Medium);
    }

    #[test]
    fn test_risk_level_boundary_exactly_point_six_is_high() {
        assert_eq!(risk_level_for(0.6), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_buckets() {
        assert_eq!(risk_level_for(0.0), RiskLevel::Low);
        assert_eq!(risk_level_for(0.29), RiskLevel::Low);
        assert_eq!(risk_level_for(0.45), RiskLevel::Medium);
        assert_eq!(risk_level_for(0.95), RiskLevel::High);
    }

    #[test]
    fn test_derived_medium_risk_at_boundary_inputs() {
        // confidence_risk = 0.5 (c=45), line_risk = 0.2 (l=70), market = 0.2
        // overall = 0.9 / 3 = 0.3 -> medium under the inclusive-on-high policy
        let enhanced = deriver().derive(&test_candidate(45.0, 70.0)).unwrap();
        assert_eq!(enhanced.risk.risk_level, RiskLevel::Medium);
    }

    // =========================================================================
    // Default Field Tests
    // =========================================================================

    #[test]
    fn test_single_candidate_stake_default() {
        let enhanced = deriver().derive(&test_candidate(60.0, 25.0)).unwrap();
        assert!((enhanced.optimal_stake - enhanced.kelly_fraction * 0.5).abs() < 1e-12);
        assert_eq!(enhanced.portfolio_impact, 1.0);
    }

    #[test]
    fn test_variance_contribution_default() {
        let enhanced = deriver().derive(&test_candidate(75.0, 25.0)).unwrap();
        assert!((enhanced.variance_contribution - (0.25 + 0.2) / 2.0).abs() < 1e-12);
    }
}
