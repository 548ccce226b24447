// src/repository/client.rs

//! HTTP client for mirror access
//!
//! Wraps an async reqwest client with a timeout and bounded retries for
//! transport failures. Non-success status codes fail immediately: a 404 on
//! a mirror does not get better by asking again.

use crate::compression;
use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum attempts for a request that fails before any response
const MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 1000;

const USER_AGENT: &str = concat!("krawler/", env!("CARGO_PKG_VERSION"));

/// Cheaply cloneable handle shared by all producers of a search
#[derive(Clone)]
pub struct RepositoryClient {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl RepositoryClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Override the retry policy (tests use zero delay)
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Fetch attempt {} for {} failed: {}, retrying...", attempt, url, e);
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
            }
        }
    }

    /// Download a URL to bytes
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::DownloadError(format!("Failed to read body of {url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// Download a URL as UTF-8 text
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url).await?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in response from {url}: {e}")))
    }

    /// Download and decompress an index, detecting gzip/xz/zstd
    pub async fn fetch_decoded(&self, url: &str) -> Result<Vec<u8>> {
        let raw = self.fetch_bytes(url).await?;
        let raw_len = raw.len();
        let name = url.to_string();
        let decoded = tokio::task::spawn_blocking(move || compression::decode(&name, &raw))
            .await
            .map_err(|e| Error::IoError(format!("Decompression task for {url} failed: {e}")))?
            .map_err(|e| Error::ParseError(format!("Failed to decompress {url}: {e}")))?;
        debug!("Decoded {} bytes -> {} bytes from {}", raw_len, decoded.len(), url);
        Ok(decoded)
    }

    /// Download, decompress and decode as UTF-8
    pub async fn fetch_decoded_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_decoded(url).await?;
        String::from_utf8(bytes)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in {url}: {e}")))
    }
}
