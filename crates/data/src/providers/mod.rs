//! Clients for the third-party APIs behind the vault and governance apps.
//!
//! Every provider routes its requests through a shared [`BatchFetcher`]
//! using its own rate-limit bucket; [`default_fetcher`] registers all of
//! them with conservative limits.

pub mod airtable;
pub mod credora;
pub mod deribit;
pub mod etherscan;
pub mod lido;

pub use airtable::{AirtableProvider, EarnScheduleEntry};
pub use credora::{CredoraProvider, RiskAssessment};
pub use deribit::{DeribitProvider, OptionInstrument, OptionKind, OptionQuote};
pub use etherscan::{EtherscanProvider, GasPrices};
pub use lido::LidoProvider;

use crate::error::FetchError;
use crate::fetcher::{BatchFetcher, RetryPolicy};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Source of option mark prices.
#[async_trait]
pub trait OptionPricingSource: Send + Sync {
    async fn option_quote(&self, instrument: &str) -> Result<OptionQuote, FetchError>;
}

/// Source of a staking APR, in percent.
#[async_trait]
pub trait StakingAprSource: Send + Sync {
    async fn staking_apr(&self) -> Result<Decimal, FetchError>;
}

/// Source of current gas prices.
#[async_trait]
pub trait GasOracle: Send + Sync {
    async fn gas_prices(&self) -> Result<GasPrices, FetchError>;
}

/// A fetcher with a bucket registered for every provider.
pub fn default_fetcher(retry: RetryPolicy) -> BatchFetcher {
    BatchFetcher::new(retry)
        .with_bucket(deribit::bucket_config())
        .with_bucket(lido::bucket_config())
        .with_bucket(etherscan::bucket_config())
        .with_bucket(credora::bucket_config())
        .with_bucket(airtable::bucket_config())
}

pub(crate) fn to_decimal(value: f64, field: &str) -> Result<Decimal, FetchError> {
    Decimal::from_f64(value)
        .ok_or_else(|| FetchError::Decode(format!("{field}: {value} is not a finite decimal")))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
