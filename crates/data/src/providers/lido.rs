//! Lido stETH staking APR.

use super::{StakingAprSource, endpoint, to_decimal};
use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::fetcher::{BatchFetcher, BucketConfig};
use crate::http::{client, send_json};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const BUCKET: &str = "lido";

pub fn bucket_config() -> BucketConfig {
    BucketConfig::new(BUCKET, 10, Duration::from_secs(60))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SmaAprData {
    sma_apr: f64,
}

#[derive(Deserialize)]
struct SmaAprResponse {
    data: SmaAprData,
}

fn apr_from(response: SmaAprResponse) -> Result<Decimal, FetchError> {
    Ok(to_decimal(response.data.sma_apr, "smaApr")?.round_dp(4))
}

/// Parses the 7-day moving-average APR, in percent.
pub fn parse_sma_apr(body: &str) -> Result<Decimal, FetchError> {
    apr_from(serde_json::from_str(body)?)
}

pub struct LidoProvider {
    client: reqwest::Client,
    base_url: String,
    fetcher: Arc<BatchFetcher>,
}

impl LidoProvider {
    pub fn new(base_url: impl Into<String>, fetcher: Arc<BatchFetcher>) -> Self {
        Self {
            client: client(),
            base_url: base_url.into(),
            fetcher,
        }
    }

    pub fn from_config(config: &ProviderConfig, fetcher: Arc<BatchFetcher>) -> Self {
        Self::new(config.lido_base_url.clone(), fetcher)
    }

    pub async fn steth_apr(&self) -> Result<Decimal, FetchError> {
        let url = endpoint(&self.base_url, "v1/protocol/steth/apr/sma");
        let response: SmaAprResponse = self
            .fetcher
            .enqueue(BUCKET, "steth-apr", || send_json(self.client.get(&url)))
            .await?;
        apr_from(response)
    }
}

#[async_trait]
impl StakingAprSource for LidoProvider {
    async fn staking_apr(&self) -> Result<Decimal, FetchError> {
        self.steth_apr().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_sma_apr() {
        let body = r#"{
            "data": {
                "aprs": [{"timeUnix": 1700000000, "apr": 3.4}],
                "smaApr": 3.41236
            },
            "meta": {"symbol": "stETH", "chainId": 1}
        }"#;
        assert_eq!(parse_sma_apr(body).unwrap(), dec!(3.4124));
    }

    #[test]
    fn test_missing_field() {
        assert!(matches!(
            parse_sma_apr(r#"{"data": {}}"#),
            Err(FetchError::Decode(_))
        ));
    }
}
