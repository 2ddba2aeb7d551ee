//! In-memory candidate source for offline runs and tests.

use crate::error::ProviderError;
use crate::pipeline::types::Candidate;
use crate::provider::traits::{apply_filters, CandidateProvider};
use async_trait::async_trait;

/// Serves a fixed candidate list with the standard filtering semantics.
///
/// Used by the CLI's local-file mode and as a deterministic stand-in for a
/// live board in tests.
pub struct StaticSource {
    candidates: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    /// Load candidates from a JSON array file.
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let candidates: Vec<Candidate> =
            serde_json::from_str(json).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(Self::new(candidates))
    }
}

#[async_trait]
impl CandidateProvider for StaticSource {
    async fn fetch_candidates(
        &self,
        sport_filter: Option<&str>,
        min_confidence: f64,
    ) -> Result<Vec<Candidate>, ProviderError> {
        Ok(apply_filters(
            self.candidates.clone(),
            sport_filter,
            min_confidence,
        ))
    }
}
