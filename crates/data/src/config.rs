//! Provider configuration from environment variables.

use crate::error::ConfigError;
use crate::fetcher::RetryPolicy;
use std::env;
use std::time::Duration;

pub const DERIBIT_BASE_URL: &str = "https://www.deribit.com";
pub const LIDO_BASE_URL: &str = "https://eth-api.lido.fi";
pub const ETHERSCAN_BASE_URL: &str = "https://api.etherscan.io";
pub const CREDORA_BASE_URL: &str = "https://platform.credora.io";
pub const AIRTABLE_BASE_URL: &str = "https://api.airtable.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub deribit_base_url: String,
    pub lido_base_url: String,
    pub etherscan_base_url: String,
    pub etherscan_api_key: Option<String>,
    pub credora_base_url: String,
    pub credora_api_token: Option<String>,
    pub airtable_base_url: String,
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_table: String,
    pub retry: RetryPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            deribit_base_url: DERIBIT_BASE_URL.to_string(),
            lido_base_url: LIDO_BASE_URL.to_string(),
            etherscan_base_url: ETHERSCAN_BASE_URL.to_string(),
            etherscan_api_key: None,
            credora_base_url: CREDORA_BASE_URL.to_string(),
            credora_api_token: None,
            airtable_base_url: AIRTABLE_BASE_URL.to_string(),
            airtable_api_key: None,
            airtable_base_id: None,
            airtable_table: "Earn".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ProviderConfig {
    /// Reads configuration from the process environment.
    ///
    /// API keys are optional here; a missing key is reported when the
    /// provider that needs it is built.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for unparsable retry settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`ProviderConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mut retry = defaults.retry;
        if let Some(value) = non_empty("RBN_FETCH_MAX_RETRIES") {
            retry.max_retries = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "RBN_FETCH_MAX_RETRIES",
                value: value.clone(),
            })?;
        }
        if let Some(value) = non_empty("RBN_FETCH_BACKOFF_MS") {
            let ms: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "RBN_FETCH_BACKOFF_MS",
                value: value.clone(),
            })?;
            retry.backoff = Duration::from_millis(ms);
        }

        Ok(Self {
            deribit_base_url: non_empty("DERIBIT_BASE_URL").unwrap_or(defaults.deribit_base_url),
            lido_base_url: non_empty("LIDO_BASE_URL").unwrap_or(defaults.lido_base_url),
            etherscan_base_url: non_empty("ETHERSCAN_BASE_URL")
                .unwrap_or(defaults.etherscan_base_url),
            etherscan_api_key: non_empty("ETHERSCAN_API_KEY"),
            credora_base_url: non_empty("CREDORA_BASE_URL").unwrap_or(defaults.credora_base_url),
            credora_api_token: non_empty("CREDORA_API_TOKEN"),
            airtable_base_url: non_empty("AIRTABLE_BASE_URL")
                .unwrap_or(defaults.airtable_base_url),
            airtable_api_key: non_empty("AIRTABLE_API_KEY"),
            airtable_base_id: non_empty("AIRTABLE_BASE_ID"),
            airtable_table: non_empty("AIRTABLE_TABLE").unwrap_or(defaults.airtable_table),
            retry,
        })
    }
}

/// Returns the value of a required setting or [`ConfigError::Missing`].
pub fn require<'a>(value: &'a Option<String>, var: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(var))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(
            require(&config.etherscan_api_key, "ETHERSCAN_API_KEY"),
            Err(ConfigError::Missing("ETHERSCAN_API_KEY"))
        );
    }

    #[test]
    fn test_overrides() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("ETHERSCAN_API_KEY", "abc"),
            ("AIRTABLE_TABLE", "Schedule"),
            ("LIDO_BASE_URL", "http://localhost:9000"),
            ("RBN_FETCH_MAX_RETRIES", "5"),
            ("RBN_FETCH_BACKOFF_MS", "250"),
            ("CREDORA_API_TOKEN", "  "),
        ]))
        .unwrap();

        assert_eq!(require(&config.etherscan_api_key, "ETHERSCAN_API_KEY"), Ok("abc"));
        assert_eq!(config.airtable_table, "Schedule");
        assert_eq!(config.lido_base_url, "http://localhost:9000");
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff, Duration::from_millis(250));
        assert_eq!(config.credora_api_token, None);
    }

    #[test]
    fn test_invalid_retry_setting() {
        let err = ProviderConfig::from_lookup(lookup(&[("RBN_FETCH_MAX_RETRIES", "many")]));
        assert_eq!(
            err,
            Err(ConfigError::Invalid {
                var: "RBN_FETCH_MAX_RETRIES",
                value: "many".to_string(),
            })
        );
    }
}
