//! Candidate providers.
//!
//! Upstream boards are thin collaborators: they deliver raw candidates and
//! own their transport concerns. The pipeline never blocks on them.

mod http;
mod static_source;
mod traits;

pub use http::PropApiClient;
pub use static_source::StaticSource;
pub use traits::{apply_filters, CandidateProvider};
