//! Network retrieval of raw source bytes

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};

/// Retrieves raw bytes for one source.
///
/// One attempt per call; retry policy belongs to a wrapper, not to implementations.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `locator`, failing after `timeout`
    async fn fetch(&self, locator: &Url, timeout: Duration) -> std::result::Result<Bytes, FetchError>;
}

/// HTTP fetcher backed by a shared reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher that identifies itself with the configured user agent
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &Url, timeout: Duration) -> std::result::Result<Bytes, FetchError> {
        tracing::debug!("Fetching {} (timeout {:?})", locator, timeout);

        let response = self
            .client
            .get(locator.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), locator);
        Ok(body)
    }
}
