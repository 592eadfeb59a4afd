use thiserror::Error;

/// Errors from outbound fetches.
///
/// Every variant except [`FetchError::UnknownBucket`] and
/// [`FetchError::Exhausted`] is retried by the batch fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited by upstream (HTTP 429)")]
    RateLimited,

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("unknown rate-limit bucket {0:?}")]
    UnknownBucket(String),

    #[error("{key}: gave up after {attempts} attempts: {last}")]
    Exhausted {
        key: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Errors building providers from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env or environment")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}
