//! Configuration management for the prop portfolio engine.
//!
//! Loads settings from environment variables and config files.

use crate::pipeline::PipelineOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream prop board connection
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineOptions,
    /// Default candidate filters
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the prop board API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional API key sent as X-Api-Key
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum candidate confidence (0-100) accepted from a provider
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Optional sport restriction, empty = all sports
    #[serde(default)]
    pub sport: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.prizepicks.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_confidence() -> f64 {
    70.0
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("PROP"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.pipeline.max_stake_percentage > 0.0 && self.pipeline.max_stake_percentage <= 1.0,
            "max_stake_percentage must be between 0 and 1"
        );

        anyhow::ensure!(
            self.pipeline.kelly_cap > 0.0 && self.pipeline.kelly_cap <= 1.0,
            "kelly_cap must be between 0 and 1"
        );

        anyhow::ensure!(
            (0.0..=100.0).contains(&self.filters.min_confidence),
            "min_confidence must be between 0 and 100"
        );

        anyhow::ensure!(
            !self.provider.base_url.is_empty(),
            "provider base_url must not be empty"
        );

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            pipeline: PipelineOptions::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            sport: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_stake_budget_rejected() {
        let mut config = Config::default();
        config.pipeline.max_stake_percentage = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_min_confidence_rejected() {
        let mut config = Config::default();
        config.filters.min_confidence = 150.0;
        assert!(config.validate().is_err());
    }
}
