//! Shared request execution for providers.

use crate::error::FetchError;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

const MAX_ERROR_BODY: usize = 512;

/// Sends `request` and decodes a JSON body.
///
/// HTTP 429 maps to [`FetchError::RateLimited`] and any other non-success
/// status to [`FetchError::Status`] with a truncated body.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds a shared client with a user agent.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("rbn-lens/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}
