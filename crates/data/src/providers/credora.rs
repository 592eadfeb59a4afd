//! Credora borrower risk assessments.

use super::{endpoint, to_decimal};
use crate::config::{ProviderConfig, require};
use crate::error::{ConfigError, FetchError};
use crate::fetcher::{BatchFetcher, BucketConfig};
use crate::http::{client, send_json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const BUCKET: &str = "credora";

pub fn bucket_config() -> BucketConfig {
    BucketConfig::new(BUCKET, 2, Duration::from_secs(1))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub entity: String,
    /// Letter rating, e.g. `A-`.
    pub rating: String,
    /// Probability of default as a fraction.
    pub probability_of_default: Decimal,
}

impl RiskAssessment {
    pub fn probability_of_default_pct(&self) -> Decimal {
        self.probability_of_default * Decimal::ONE_HUNDRED
    }
}

#[derive(Deserialize)]
struct RiskResponse {
    data: Vec<RiskWire>,
}

#[derive(Deserialize)]
struct RiskWire {
    entity: String,
    rating: String,
    pd: f64,
}

fn assessments_from(response: RiskResponse) -> Result<Vec<RiskAssessment>, FetchError> {
    response
        .data
        .into_iter()
        .map(|w| {
            Ok(RiskAssessment {
                probability_of_default: to_decimal(w.pd, "pd")?,
                entity: w.entity,
                rating: w.rating,
            })
        })
        .collect()
}

pub fn parse_risk(body: &str) -> Result<Vec<RiskAssessment>, FetchError> {
    assessments_from(serde_json::from_str(body)?)
}

pub struct CredoraProvider {
    client: reqwest::Client,
    base_url: String,
    token: String,
    fetcher: Arc<BatchFetcher>,
}

impl CredoraProvider {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        fetcher: Arc<BatchFetcher>,
    ) -> Self {
        Self {
            client: client(),
            base_url: base_url.into(),
            token: token.into(),
            fetcher,
        }
    }

    /// # Errors
    /// Requires `CREDORA_API_TOKEN`.
    pub fn from_config(
        config: &ProviderConfig,
        fetcher: Arc<BatchFetcher>,
    ) -> Result<Self, ConfigError> {
        let token = require(&config.credora_api_token, "CREDORA_API_TOKEN")?;
        Ok(Self::new(config.credora_base_url.clone(), token, fetcher))
    }

    /// Risk assessments for the named borrowers.
    pub async fn risk(&self, entities: &[String]) -> Result<Vec<RiskAssessment>, FetchError> {
        let url = endpoint(&self.base_url, "api/v2/risk");
        let body = json!({ "entities": entities });
        let response: RiskResponse = self
            .fetcher
            .enqueue(BUCKET, entities.join(","), || {
                send_json(self.client.post(&url).bearer_auth(&self.token).json(&body))
            })
            .await?;
        assessments_from(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_risk() {
        let body = r#"{
            "data": [
                {"entity": "wintermute", "rating": "A-", "pd": 0.0025},
                {"entity": "folkvang", "rating": "BBB", "pd": 0.01}
            ]
        }"#;
        let risk = parse_risk(body).unwrap();
        assert_eq!(risk.len(), 2);
        assert_eq!(risk[0].rating, "A-");
        assert_eq!(risk[0].probability_of_default_pct(), dec!(0.25));
        assert_eq!(risk[1].entity, "folkvang");
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(parse_risk(r#"{"data": []}"#).unwrap(), Vec::new());
    }
}
