//! Error taxonomy for the pipeline and the provider layer.

use thiserror::Error;

/// Errors raised while enhancing and allocating a candidate batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A single candidate carries a malformed field. The pipeline drops the
    /// offending candidate and continues with the remainder; callers receive
    /// the dropped ids through the batch report.
    #[error("invalid candidate {id}: {reason}")]
    InvalidCandidate { id: String, reason: String },

    /// Candidate count and correlation matrix dimension disagree. This is an
    /// internal invariant violation and is fatal for the batch.
    #[error("dimension mismatch: {candidates} candidates vs {matrix}x{matrix} correlation matrix")]
    DimensionMismatch { candidates: usize, matrix: usize },
}

/// Errors raised by candidate providers.
///
/// Callers recover from these by running the pipeline on an empty batch,
/// producing zeroed metrics rather than an internal failure.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The upstream data source could not be reached or returned an error.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The upstream response could not be decoded.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}
