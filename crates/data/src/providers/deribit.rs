//! Deribit public options API.

use super::{OptionPricingSource, endpoint, to_decimal};
use crate::cache::TtlCache;
use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::fetcher::{BatchFetcher, BucketConfig};
use crate::http::{client, send_json};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const BUCKET: &str = "deribit";

/// Instrument listings change only when new expiries are added.
pub const INSTRUMENT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Deribit allows bursts, but sustained polling above this gets 429s.
pub fn bucket_config() -> BucketConfig {
    BucketConfig::new(BUCKET, 8, Duration::from_secs(10))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    pub fn code(&self) -> char {
        match self {
            OptionKind::Call => 'C',
            OptionKind::Put => 'P',
        }
    }
}

/// Builds an instrument name such as `ETH-27DEC24-2000-C`.
pub fn instrument_name(
    currency: &str,
    expiry: NaiveDate,
    strike: Decimal,
    kind: OptionKind,
) -> String {
    format!(
        "{}-{}-{}-{}",
        currency.to_ascii_uppercase(),
        expiry.format("%-d%b%y").to_string().to_ascii_uppercase(),
        strike.normalize(),
        kind.code()
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionInstrument {
    pub name: String,
    pub currency: String,
    pub strike: Decimal,
    pub kind: OptionKind,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub instrument_name: String,
    /// Mark price in units of the underlying.
    pub mark_price: Decimal,
    /// Mark implied volatility in percent.
    pub mark_iv: Option<Decimal>,
    pub underlying_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl OptionQuote {
    pub fn mark_price_usd(&self) -> Decimal {
        self.mark_price * self.underlying_price
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct InstrumentWire {
    instrument_name: String,
    base_currency: String,
    strike: Option<f64>,
    option_type: Option<String>,
    expiration_timestamp: i64,
}

#[derive(Deserialize)]
struct TickerWire {
    instrument_name: String,
    mark_price: f64,
    mark_iv: Option<f64>,
    underlying_price: Option<f64>,
    index_price: Option<f64>,
    timestamp: i64,
}

fn millis(ts: i64, field: &str) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp_millis(ts)
        .ok_or_else(|| FetchError::Decode(format!("{field}: invalid timestamp {ts}")))
}

impl TryFrom<InstrumentWire> for OptionInstrument {
    type Error = FetchError;

    fn try_from(wire: InstrumentWire) -> Result<Self, Self::Error> {
        let kind = match wire.option_type.as_deref() {
            Some("call") => OptionKind::Call,
            Some("put") => OptionKind::Put,
            other => {
                return Err(FetchError::Decode(format!(
                    "{}: unexpected option_type {other:?}",
                    wire.instrument_name
                )));
            }
        };
        let strike = wire
            .strike
            .ok_or_else(|| FetchError::Decode(format!("{}: missing strike", wire.instrument_name)))?;
        Ok(Self {
            strike: to_decimal(strike, "strike")?,
            expiry: millis(wire.expiration_timestamp, "expiration_timestamp")?,
            kind,
            currency: wire.base_currency,
            name: wire.instrument_name,
        })
    }
}

impl TryFrom<TickerWire> for OptionQuote {
    type Error = FetchError;

    fn try_from(wire: TickerWire) -> Result<Self, Self::Error> {
        let underlying = wire
            .underlying_price
            .or(wire.index_price)
            .ok_or_else(|| {
                FetchError::Decode(format!("{}: missing underlying price", wire.instrument_name))
            })?;
        Ok(Self {
            mark_price: to_decimal(wire.mark_price, "mark_price")?,
            mark_iv: wire.mark_iv.map(|iv| to_decimal(iv, "mark_iv")).transpose()?,
            underlying_price: to_decimal(underlying, "underlying_price")?,
            timestamp: millis(wire.timestamp, "timestamp")?,
            instrument_name: wire.instrument_name,
        })
    }
}

fn convert_instruments(wire: Vec<InstrumentWire>) -> Result<Vec<OptionInstrument>, FetchError> {
    wire.into_iter().map(OptionInstrument::try_from).collect()
}

pub fn parse_instruments(body: &str) -> Result<Vec<OptionInstrument>, FetchError> {
    let envelope: Envelope<Vec<InstrumentWire>> = serde_json::from_str(body)?;
    convert_instruments(envelope.result)
}

pub fn parse_ticker(body: &str) -> Result<OptionQuote, FetchError> {
    let envelope: Envelope<TickerWire> = serde_json::from_str(body)?;
    OptionQuote::try_from(envelope.result)
}

pub struct DeribitProvider {
    client: reqwest::Client,
    base_url: String,
    fetcher: Arc<BatchFetcher>,
    /// Instrument listings keyed by upper-case currency.
    instrument_cache: TtlCache<String, Vec<OptionInstrument>>,
}

impl DeribitProvider {
    pub fn new(base_url: impl Into<String>, fetcher: Arc<BatchFetcher>) -> Self {
        Self {
            client: client(),
            base_url: base_url.into(),
            fetcher,
            instrument_cache: TtlCache::new(INSTRUMENT_CACHE_TTL),
        }
    }

    pub fn from_config(config: &ProviderConfig, fetcher: Arc<BatchFetcher>) -> Self {
        Self::new(config.deribit_base_url.clone(), fetcher)
    }

    /// Active option instruments for `currency` (e.g. `ETH`), cached for
    /// [`INSTRUMENT_CACHE_TTL`]. Failed fetches are not cached.
    pub async fn instruments(&self, currency: &str) -> Result<Vec<OptionInstrument>, FetchError> {
        let currency = currency.to_ascii_uppercase();
        self.instrument_cache
            .get_or_try_insert_with(currency.clone(), || self.fetch_instruments(&currency))
            .await
    }

    /// Drops cached listings so the next call refetches.
    pub async fn refresh_instruments(&self) {
        self.instrument_cache.clear().await;
    }

    async fn fetch_instruments(&self, currency: &str) -> Result<Vec<OptionInstrument>, FetchError> {
        let url = endpoint(&self.base_url, "api/v2/public/get_instruments");
        let wire: Envelope<Vec<InstrumentWire>> = self
            .fetcher
            .enqueue(BUCKET, format!("instruments:{currency}"), || {
                send_json(self.client.get(&url).query(&[
                    ("currency", currency),
                    ("kind", "option"),
                    ("expired", "false"),
                ]))
            })
            .await?;
        let instruments = convert_instruments(wire.result)?;
        debug!(currency = %currency, count = instruments.len(), "Fetched instruments");
        Ok(instruments)
    }

    pub async fn ticker(&self, instrument: &str) -> Result<OptionQuote, FetchError> {
        let url = endpoint(&self.base_url, "api/v2/public/ticker");
        let wire: Envelope<TickerWire> = self
            .fetcher
            .enqueue(BUCKET, instrument, || {
                send_json(
                    self.client
                        .get(&url)
                        .query(&[("instrument_name", instrument)]),
                )
            })
            .await?;
        OptionQuote::try_from(wire.result)
    }

    /// Quotes for many instruments, throttled through the Deribit bucket.
    /// Results come back in input order.
    pub async fn tickers(
        &self,
        instruments: Vec<String>,
    ) -> Vec<(String, Result<OptionQuote, FetchError>)> {
        let url = endpoint(&self.base_url, "api/v2/public/ticker");
        self.fetcher
            .enqueue_batch(BUCKET, instruments, |name| {
                let request = self
                    .client
                    .get(&url)
                    .query(&[("instrument_name", name.as_str())]);
                async move {
                    let wire: Envelope<TickerWire> = send_json(request).await?;
                    OptionQuote::try_from(wire.result)
                }
            })
            .await
    }
}

#[async_trait]
impl OptionPricingSource for DeribitProvider {
    async fn option_quote(&self, instrument: &str) -> Result<OptionQuote, FetchError> {
        self.ticker(instrument).await
    }
}
