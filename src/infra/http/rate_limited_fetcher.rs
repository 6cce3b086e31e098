use super::rate_limiter::RateLimiter;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// HTTP GET client that shares one rate limit across every caller.
///
/// Clones share the limiter, so handing a clone to each task still keeps the
/// whole process under the ceiling. Nothing is retried.
#[derive(Clone)]
pub struct RateLimitedFetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedFetcher {
    pub fn new(requests_per_second: u32, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sheet_geocoder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::per_second(requests_per_second)),
        })
    }

    /// GET `url` with `query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        // Every request start counts against the ceiling, failed ones included.
        self.limiter.acquire().await;

        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}
