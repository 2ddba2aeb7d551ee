//! # Prop Portfolio
//!
//! Scores a batch of candidate prop wagers and allocates a risk-limited
//! capital budget across them using Kelly sizing and a correlation-penalized
//! allocation model.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `error`: Typed error taxonomy for pipeline and provider failures
//! - `pipeline`: Feature derivation, correlation estimation, portfolio
//!   optimization, summarization, and explanation records
//! - `provider`: Candidate sources (REST client and in-memory)

pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;

pub use config::Config;
pub use pipeline::{BatchReport, Pipeline, PipelineOptions};
