//! REST candidate provider.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::pipeline::types::Candidate;
use crate::provider::traits::{apply_filters, CandidateProvider};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Wire format of one prop record as upstream boards publish it.
///
/// `line_score` is the common field name upstream; `line` appears on some
/// boards. Missing fields fall back to the same defaults the pipeline uses.
#[derive(Debug, Clone, Deserialize)]
struct PropRecord {
    id: String,
    #[serde(default)]
    player_name: String,
    #[serde(default)]
    team: String,
    #[serde(default)]
    sport: String,
    #[serde(default)]
    stat_type: String,
    #[serde(default = "default_recommendation")]
    recommendation: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default, alias = "line")]
    line_score: f64,
    #[serde(default)]
    weather_impact: Option<f64>,
    #[serde(default = "default_injury_risk")]
    injury_risk: f64,
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

impl From<PropRecord> for Candidate {
    fn from(record: PropRecord) -> Self {
        Candidate {
            id: record.id,
            player_name: record.player_name,
            team: record.team,
            sport: record.sport,
            stat_type: record.stat_type,
            recommendation: record.recommendation,
            confidence: record.confidence,
            line_value: record.line_score,
            weather_impact: record.weather_impact,
            injury_risk: record.injury_risk,
        }
    }
}

/// HTTP client for a prop board's REST API.
pub struct PropApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PropApiClient {
    /// Create a new client from configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CandidateProvider for PropApiClient {
    #[instrument(skip(self))]
    async fn fetch_candidates(
        &self,
        sport_filter: Option<&str>,
        min_confidence: f64,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let url = format!("{}/api/props", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(sport) = sport_filter {
            request = request.query(&[("sport", sport)]);
        }
        if !self.api_key.is_empty() {
            request = request.header("X-Api-Key", &self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "upstream returned status {status}"
            )));
        }

        let records: Vec<PropRecord> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        debug!(fetched = records.len(), "Fetched prop records");

        // Filter locally as well; upstream filtering support varies by board.
        let candidates = records.into_iter().map(Candidate::from).collect();
        Ok(apply_filters(candidates, sport_filter, min_confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PropApiClient {
        PropApiClient::new(&ProviderConfig {
            base_url: server.uri(),
            api_key: String::new(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_wire_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/props"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[
                    {"id": "p1", "player_name": "A", "team": "LAL", "sport": "NBA",
                     "stat_type": "points", "confidence": 82.0, "line_score": 27.5},
                    {"id": "p2", "team": "BOS", "sport": "NBA", "line": 8.5}
                ]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let candidates = client_for(&server)
            .fetch_candidates(None, 0.0)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "p1");
        assert_eq!(candidates[0].line_value, 27.5);
        // Defaults for sparse records, including the `line` alias
        assert_eq!(candidates[1].confidence, 75.0);
        assert_eq!(candidates[1].line_value, 8.5);
    }

    #[tokio::test]
    async fn test_min_confidence_applied_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/props"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"[
                    {"id": "p1", "sport": "NBA", "confidence": 85.0, "line_score": 20.0},
                    {"id": "p2", "sport": "NBA", "confidence": 55.0, "line_score": 20.0}
                ]"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let candidates = client_for(&server)
            .fetch_candidates(None, 70.0)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "p1");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/props"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_candidates(None, 70.0).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/props"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_candidates(None, 70.0).await;
        assert!(matches!(result, Err(ProviderError::Malformed(_))));
    }
}
