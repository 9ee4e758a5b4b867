use std::time::Duration;

use futures::stream::StreamExt;
use thiserror::Error;

use super::parser::{parse_channel, ParsedChannel};

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching and parsing a feed.
///
/// The pipeline treats every variant the same way (the failing source is
/// skipped for this run); the distinction exists for logging and for
/// callers validating a new subscription.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (fewer bytes than Content-Length promised)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Feed XML could not be parsed as RSS or Atom
    #[error(transparent)]
    Parse(#[from] super::parser::ParseError),
}

/// HTTP client for retrieving and parsing feeds.
///
/// Wraps a shared [`reqwest::Client`]; cheap to clone. Each fetch has a
/// 30-second timeout, a bounded response body, and exponential backoff on
/// 429/5xx responses.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build a feed client over an existing `reqwest::Client`, for custom
    /// configuration (proxies, user agent).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetches a feed URL and parses the body as RSS or Atom.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] / [`FetchError::Timeout`] - request failed
    /// - [`FetchError::HttpStatus`] - non-2xx response (5xx after retries)
    /// - [`FetchError::RateLimited`] - 429 after max retries
    /// - [`FetchError::ResponseTooLarge`] / [`FetchError::IncompleteResponse`]
    ///   - body failed the size/completeness checks
    /// - [`FetchError::Parse`] - body is not valid RSS/Atom
    pub async fn fetch_and_parse(&self, url: &str) -> Result<ParsedChannel, FetchError> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(parse_channel(&bytes)?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut retry_count = 0;

        loop {
            let response = tokio::time::timeout(REQUEST_TIMEOUT, self.client.get(url).send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::Network)?;

            // Rate limiting gets exponential backoff before giving up
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= MAX_RETRIES {
                    return Err(FetchError::RateLimited(MAX_RETRIES));
                }

                let delay_secs = 2u64.pow(retry_count); // 1s, 2s, 4s
                tracing::warn!(
                    feed = %url,
                    retry = retry_count,
                    delay_secs = delay_secs,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
                continue;
            }

            // Server errors are usually transient; same backoff
            if response.status().is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(FetchError::HttpStatus(response.status().as_u16()));
                }

                let delay_secs = 2u64.pow(retry_count);
                tracing::warn!(
                    feed = %url,
                    status = %response.status(),
                    retry = retry_count,
                    delay_secs = delay_secs,
                    "Server error, retrying after delay"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
                continue;
            }

            // Client errors (4xx) fail immediately
            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            match read_limited_bytes(response, MAX_FEED_SIZE).await {
                Ok(bytes) => return Ok(bytes),
                Err(FetchError::IncompleteResponse { expected, received }) => {
                    // Truncated transfers get retried like server errors
                    if retry_count >= MAX_RETRIES {
                        return Err(FetchError::IncompleteResponse { expected, received });
                    }

                    let delay_secs = 2u64.pow(retry_count);
                    tracing::debug!(
                        feed = %url,
                        expected = expected,
                        received = received,
                        delay_secs = delay_secs,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: trust Content-Length for the size check
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // A short read means the transfer was interrupted; callers retry
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
