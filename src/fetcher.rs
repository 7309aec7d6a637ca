use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while loading a single feed.
///
/// Every variant is contained at the aggregation boundary: the failing
/// source contributes no items and the rest of the listing is unaffected.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Payload could not be read as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else {
            FeedError::Network(err)
        }
    }
}

/// Retrieves raw feed documents. The inner client is a connection pool and
/// can be shared by concurrent requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_size: usize,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("BoxBoxBox/1.0 (Feed Aggregator)")
            .build()?;

        Ok(Self {
            client,
            max_size: MAX_FEED_SIZE,
        })
    }

    /// Overrides the largest body accepted, in bytes.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Performs a single GET for `url`. No retries.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        let bytes = read_limited_bytes(response, self.max_size).await?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

/// Reads the body chunk by chunk, giving up as soon as it passes `limit`.
async fn read_limited_bytes(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FeedError> {
    // Fast path: check Content-Length header
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(FeedError::ResponseTooLarge);
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FeedError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
