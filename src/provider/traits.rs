//! Source-agnostic trait for candidate providers.

use crate::error::ProviderError;
use crate::pipeline::types::Candidate;
use async_trait::async_trait;

/// A source of raw wager candidates.
///
/// Implement this trait to plug in a new upstream board. Providers own their
/// transport, timeout, and retry concerns; the pipeline only sees the
/// resulting candidate sequence. An empty sequence is a valid result and
/// must be tolerated by callers.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Fetch current candidates, optionally filtered by sport (case
    /// insensitive) and a minimum confidence threshold.
    async fn fetch_candidates(
        &self,
        sport_filter: Option<&str>,
        min_confidence: f64,
    ) -> Result<Vec<Candidate>, ProviderError>;
}

/// Apply the standard provider-side filters to a candidate list.
///
/// Shared by implementations so filtering semantics stay identical across
/// sources.
pub fn apply_filters(
    candidates: Vec<Candidate>,
    sport_filter: Option<&str>,
    min_confidence: f64,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| {
            if let Some(sport) = sport_filter {
                if !c.sport.eq_ignore_ascii_case(sport) {
                    return false;
                }
            }
            c.confidence >= min_confidence
        })
        .collect()
}
