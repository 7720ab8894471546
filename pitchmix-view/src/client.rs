//! Pitch analytics API client
//!
//! HTTP client for the external analytics service. The `PitchMixApi` trait
//! fronts the reqwest implementation so the session orchestrator can be
//! driven by a fake in tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pitchmix_common::types::{Hand, Pitcher, PitchPoint, Recommendation, Situation, UsageByCount};

const USER_AGENT: &str = "pitchmix-view/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum pitch events requested per location query (server caps at 2000)
pub const DEFAULT_PITCH_LIMIT: u32 = 500;

/// Analytics API client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Usage endpoint response envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsageResponse {
    pub pitcher_id: i64,
    #[serde(default)]
    pub usage_by_count: UsageByCount,
}

/// Pitches endpoint response envelope
///
/// `avg_sz_top`/`avg_sz_bot` are the average strike-zone bounds over the
/// returned events; absent when no event carried zone data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PitchesResponse {
    pub pitcher_id: i64,
    pub balls: u8,
    pub strikes: u8,
    #[serde(default)]
    pub batter_hand: Option<Hand>,
    #[serde(default)]
    pub avg_sz_top: Option<f64>,
    #[serde(default)]
    pub avg_sz_bot: Option<f64>,
    #[serde(default)]
    pub pitches: Vec<PitchPoint>,
}

/// Recommendation endpoint request body
///
/// `last_pitch_type` is reserved for future sequencing logic and is always
/// serialized as null by this client.
#[derive(Debug, Serialize)]
struct RecommendationRequest {
    pitcher_id: i64,
    balls: u8,
    strikes: u8,
    batter_hand: Hand,
    last_pitch_type: Option<String>,
}

/// Health endpoint response
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// The analytics service surface the view pipeline consumes
///
/// One method per endpoint; implementations must not retry automatically.
#[allow(async_fn_in_trait)]
pub trait PitchMixApi {
    /// Probe `GET /health`
    async fn health(&self) -> Result<(), ClientError>;

    /// Fetch the full pitcher roster (`GET /api/pitchers`)
    async fn list_pitchers(&self) -> Result<Vec<Pitcher>, ClientError>;

    /// Fetch count-keyed usage for one pitcher and batter hand
    /// (`GET /api/pitchers/{id}/usage`)
    async fn pitcher_usage(
        &self,
        pitcher_id: i64,
        batter_hand: Hand,
    ) -> Result<UsageByCount, ClientError>;

    /// Fetch the recommended pitch type for a full situation
    /// (`POST /api/recommendation`)
    async fn recommend(
        &self,
        pitcher_id: i64,
        situation: Situation,
    ) -> Result<Recommendation, ClientError>;

    /// Fetch raw pitch events and average zone bounds for a situation
    /// (`GET /api/pitchers/{id}/pitches`)
    async fn pitcher_pitches(
        &self,
        pitcher_id: i64,
        situation: Situation,
    ) -> Result<PitchesResponse, ClientError>;
}

/// Reqwest-backed analytics API client
pub struct PitchMixClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PitchMixClient {
    /// Create a client against the given base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Shared status triage for GET responses
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClientError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

impl PitchMixApi for PitchMixClient {
    async fn health(&self) -> Result<(), ClientError> {
        let url = self.url("/health");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let health: HealthResponse = Self::decode(response).await?;
        if health.status != "ok" {
            return Err(ClientError::Api(200, format!("status: {}", health.status)));
        }
        Ok(())
    }

    async fn list_pitchers(&self) -> Result<Vec<Pitcher>, ClientError> {
        let url = self.url("/api/pitchers");

        tracing::debug!(url = %url, "Fetching pitcher roster");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let pitchers: Vec<Pitcher> = Self::decode(response).await?;

        tracing::info!(count = pitchers.len(), "Retrieved pitcher roster");

        Ok(pitchers)
    }

    async fn pitcher_usage(
        &self,
        pitcher_id: i64,
        batter_hand: Hand,
    ) -> Result<UsageByCount, ClientError> {
        let url = self.url(&format!("/api/pitchers/{}/usage", pitcher_id));

        tracing::debug!(pitcher_id, batter_hand = %batter_hand, "Fetching usage by count");

        let response = self
            .http_client
            .get(&url)
            .query(&[("batter_hand", batter_hand.as_str())])
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let usage: UsageResponse = Self::decode(response).await?;

        tracing::debug!(
            pitcher_id,
            count_keys = usage.usage_by_count.len(),
            "Retrieved usage by count"
        );

        Ok(usage.usage_by_count)
    }

    async fn recommend(
        &self,
        pitcher_id: i64,
        situation: Situation,
    ) -> Result<Recommendation, ClientError> {
        let url = self.url("/api/recommendation");
        let body = RecommendationRequest {
            pitcher_id,
            balls: situation.balls,
            strikes: situation.strikes,
            batter_hand: situation.batter_hand,
            last_pitch_type: None,
        };

        tracing::debug!(
            pitcher_id,
            count = %situation.count_key(),
            batter_hand = %situation.batter_hand,
            "Requesting recommendation"
        );

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let recommendation: Recommendation = Self::decode(response).await?;

        tracing::info!(
            pitcher_id,
            pitch_type = %recommendation.recommended_pitch_type,
            confidence = recommendation.confidence,
            "Retrieved recommendation"
        );

        Ok(recommendation)
    }

    async fn pitcher_pitches(
        &self,
        pitcher_id: i64,
        situation: Situation,
    ) -> Result<PitchesResponse, ClientError> {
        let url = self.url(&format!("/api/pitchers/{}/pitches", pitcher_id));

        tracing::debug!(pitcher_id, count = %situation.count_key(), "Fetching pitch locations");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("balls", situation.balls.to_string()),
                ("strikes", situation.strikes.to_string()),
                ("batter_hand", situation.batter_hand.as_str().to_string()),
                ("limit", DEFAULT_PITCH_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let pitches: PitchesResponse = Self::decode(response).await?;

        tracing::debug!(
            pitcher_id,
            events = pitches.pitches.len(),
            "Retrieved pitch locations"
        );

        Ok(pitches)
    }
}
