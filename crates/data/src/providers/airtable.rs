//! Earn-vault schedule stored in Airtable.
//!
//! Each record holds one round of a principal-protected note: its product,
//! expiry and payoff terms.

use super::{endpoint, to_decimal};
use crate::config::{ProviderConfig, require};
use crate::error::{ConfigError, FetchError};
use crate::fetcher::{BatchFetcher, BucketConfig};
use crate::http::{client, send_json};
use chrono::NaiveDate;
use rbn_lens_domain::payoff::{PayoffTerms, ProductId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const BUCKET: &str = "airtable";

const PAGE_SIZE: &str = "100";

/// Airtable allows 5 requests per second per base.
pub fn bucket_config() -> BucketConfig {
    BucketConfig::new(BUCKET, 5, Duration::from_secs(1))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnScheduleEntry {
    pub record_id: String,
    pub product: ProductId,
    pub expiry: NaiveDate,
    pub terms: PayoffTerms,
}

#[derive(Deserialize)]
struct Page {
    records: Vec<Record>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct Record {
    id: String,
    fields: ScheduleFields,
}

#[derive(Deserialize)]
struct ScheduleFields {
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "Expiry")]
    expiry: NaiveDate,
    #[serde(rename = "Base Yield")]
    base_yield: f64,
    #[serde(rename = "Max Yield")]
    max_yield: f64,
    #[serde(rename = "Lower Barrier")]
    lower_barrier: f64,
    #[serde(rename = "Upper Barrier")]
    upper_barrier: f64,
    #[serde(rename = "Participation Rate", default)]
    participation_rate: f64,
}

impl Record {
    fn into_entry(self) -> Result<EarnScheduleEntry, String> {
        let f = self.fields;
        let product: ProductId = f.product.parse().map_err(|e| format!("{e}"))?;
        let terms = PayoffTerms {
            base_yield: to_decimal(f.base_yield, "Base Yield").map_err(|e| e.to_string())?,
            max_yield: to_decimal(f.max_yield, "Max Yield").map_err(|e| e.to_string())?,
            lower_barrier: to_decimal(f.lower_barrier, "Lower Barrier")
                .map_err(|e| e.to_string())?,
            upper_barrier: to_decimal(f.upper_barrier, "Upper Barrier")
                .map_err(|e| e.to_string())?,
            participation_rate: to_decimal(f.participation_rate, "Participation Rate")
                .map_err(|e| e.to_string())?,
        };
        terms.validate().map_err(|e| e.to_string())?;
        Ok(EarnScheduleEntry {
            record_id: self.id,
            product,
            expiry: f.expiry,
            terms,
        })
    }
}

/// Converts a page, skipping records that do not describe a valid round.
fn entries_from(page: Page) -> (Vec<EarnScheduleEntry>, Option<String>) {
    let entries = page
        .records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match record.into_entry() {
                Ok(entry) => Some(entry),
                Err(reason) => {
                    warn!(record = %id, reason = %reason, "Skipping schedule record");
                    None
                }
            }
        })
        .collect();
    (entries, page.offset)
}

/// Parses one page; returns entries and the next-page offset.
pub fn parse_schedule_page(
    body: &str,
) -> Result<(Vec<EarnScheduleEntry>, Option<String>), FetchError> {
    Ok(entries_from(serde_json::from_str(body)?))
}

pub struct AirtableProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    base_id: String,
    table: String,
    fetcher: Arc<BatchFetcher>,
}

impl AirtableProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        table: impl Into<String>,
        fetcher: Arc<BatchFetcher>,
    ) -> Self {
        Self {
            client: client(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            base_id: base_id.into(),
            table: table.into(),
            fetcher,
        }
    }

    /// # Errors
    /// Requires `AIRTABLE_API_KEY` and `AIRTABLE_BASE_ID`.
    pub fn from_config(
        config: &ProviderConfig,
        fetcher: Arc<BatchFetcher>,
    ) -> Result<Self, ConfigError> {
        let api_key = require(&config.airtable_api_key, "AIRTABLE_API_KEY")?;
        let base_id = require(&config.airtable_base_id, "AIRTABLE_BASE_ID")?;
        Ok(Self::new(
            config.airtable_base_url.clone(),
            api_key,
            base_id,
            config.airtable_table.clone(),
            fetcher,
        ))
    }

    /// All schedule entries, following pagination, sorted by expiry.
    pub async fn schedule(&self) -> Result<Vec<EarnScheduleEntry>, FetchError> {
        let url = endpoint(&self.base_url, &format!("v0/{}/{}", self.base_id, self.table));
        let mut entries = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let key = format!("{}:{}", self.table, offset.as_deref().unwrap_or("start"));
            let page: Page = self
                .fetcher
                .enqueue(BUCKET, key, || {
                    let mut request = self
                        .client
                        .get(&url)
                        .bearer_auth(&self.api_key)
                        .query(&[("pageSize", PAGE_SIZE)]);
                    if let Some(offset) = &offset {
                        request = request.query(&[("offset", offset.as_str())]);
                    }
                    send_json(request)
                })
                .await?;

            let (mut page_entries, next) = entries_from(page);
            debug!(table = %self.table, count = page_entries.len(), "Fetched schedule page");
            entries.append(&mut page_entries);

            match next {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        entries.sort_by_key(|e| e.expiry);
        Ok(entries)
    }

    /// The latest round for `product`, if any.
    pub async fn latest_terms(
        &self,
        product: ProductId,
    ) -> Result<Option<EarnScheduleEntry>, FetchError> {
        Ok(self
            .schedule()
            .await?
            .into_iter()
            .filter(|e| e.product == product)
            .max_by_key(|e| e.expiry))
    }
}
