//! Market data access for the vault and governance tooling.
//!
//! This crate provides:
//! - A rate-limited batch fetcher with named buckets and fixed-backoff retry
//! - Caller-owned caching and latest-wins publication
//! - Fixed-interval polling
//! - Clients for Deribit, Lido, Etherscan, Credora and Airtable

/// Caching and freshness.
pub mod cache;
/// Provider configuration.
pub mod config;
/// Error types.
pub mod error;
/// Rate-limited batch fetcher.
pub mod fetcher;
/// HTTP helpers shared by providers.
pub mod http;
/// Interval polling.
pub mod poller;
/// External API clients.
pub mod providers;

pub use cache::{LatestValue, TtlCache};
pub use config::ProviderConfig;
pub use error::{ConfigError, FetchError};
pub use fetcher::{BatchFetcher, BucketConfig, BucketStats, PriceFetchJob, RetryPolicy};
pub use poller::{PollEvent, PollOutcome, Poller, PollerHandle};
pub use providers::{GasOracle, OptionPricingSource, StakingAprSource, default_fetcher};
