//! Etherscan gas oracle.

use super::{GasOracle, endpoint};
use crate::config::{ProviderConfig, require};
use crate::error::{ConfigError, FetchError};
use crate::fetcher::{BatchFetcher, BucketConfig};
use crate::http::{client, send_json};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const BUCKET: &str = "etherscan";

/// Free-tier keys allow 5 calls per second.
pub fn bucket_config() -> BucketConfig {
    BucketConfig::new(BUCKET, 5, Duration::from_secs(1))
}

/// Gas prices in gwei.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasPrices {
    pub last_block: u64,
    pub safe_gwei: Decimal,
    pub propose_gwei: Decimal,
    pub fast_gwei: Decimal,
    pub base_fee_gwei: Option<Decimal>,
}

#[derive(Deserialize)]
struct OracleResponse {
    status: String,
    message: String,
    result: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OracleResult {
    last_block: String,
    safe_gas_price: String,
    propose_gas_price: String,
    fast_gas_price: String,
    #[serde(rename = "suggestBaseFee")]
    suggest_base_fee: Option<String>,
}

fn gwei(value: &str, field: &str) -> Result<Decimal, FetchError> {
    Decimal::from_str(value.trim())
        .map_err(|e| FetchError::Decode(format!("{field}: {value:?}: {e}")))
}

fn gas_prices_from(response: OracleResponse) -> Result<GasPrices, FetchError> {
    // Etherscan reports errors, including its own rate limit, with HTTP 200
    // and status "0".
    if response.status != "1" {
        let detail = response.result.as_str().unwrap_or_default().to_string();
        if detail.to_ascii_lowercase().contains("rate limit") {
            return Err(FetchError::RateLimited);
        }
        return Err(FetchError::Decode(format!("{}: {detail}", response.message)));
    }

    let result: OracleResult = serde_json::from_value(response.result)?;
    Ok(GasPrices {
        last_block: result
            .last_block
            .trim()
            .parse()
            .map_err(|e| FetchError::Decode(format!("LastBlock: {e}")))?,
        safe_gwei: gwei(&result.safe_gas_price, "SafeGasPrice")?,
        propose_gwei: gwei(&result.propose_gas_price, "ProposeGasPrice")?,
        fast_gwei: gwei(&result.fast_gas_price, "FastGasPrice")?,
        base_fee_gwei: result
            .suggest_base_fee
            .as_deref()
            .map(|v| gwei(v, "suggestBaseFee"))
            .transpose()?,
    })
}

pub fn parse_gas_oracle(body: &str) -> Result<GasPrices, FetchError> {
    gas_prices_from(serde_json::from_str(body)?)
}

pub struct EtherscanProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    fetcher: Arc<BatchFetcher>,
}

impl EtherscanProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        fetcher: Arc<BatchFetcher>,
    ) -> Self {
        Self {
            client: client(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            fetcher,
        }
    }

    /// # Errors
    /// Requires `ETHERSCAN_API_KEY`.
    pub fn from_config(
        config: &ProviderConfig,
        fetcher: Arc<BatchFetcher>,
    ) -> Result<Self, ConfigError> {
        let key = require(&config.etherscan_api_key, "ETHERSCAN_API_KEY")?;
        Ok(Self::new(config.etherscan_base_url.clone(), key, fetcher))
    }

    pub async fn gas_oracle(&self) -> Result<GasPrices, FetchError> {
        let url = endpoint(&self.base_url, "api");
        // Status-"0" rate-limit replies must count as failures for retry.
        self.fetcher
            .enqueue(BUCKET, "gasoracle", || {
                let request = self.client.get(&url).query(&[
                    ("module", "gastracker"),
                    ("action", "gasoracle"),
                    ("apikey", self.api_key.as_str()),
                ]);
                async move { gas_prices_from(send_json(request).await?) }
            })
            .await
    }
}

#[async_trait]
impl GasOracle for EtherscanProvider {
    async fn gas_prices(&self) -> Result<GasPrices, FetchError> {
        self.gas_oracle().await
    }
}
