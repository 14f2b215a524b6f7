//! HTTP fetcher implementation
//!
//! This module handles all static (non-rendered) HTTP requests, including:
//! - Building the HTTP client with the configured user agent
//! - GET requests that keep the raw body for HTML and PDF alike
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::FetchConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Longest pause between two retries, whatever the attempt number
const MAX_BACKOFF_MS: u64 = 30_000;

/// Redirect hops followed before a fetch fails
const MAX_REDIRECTS: usize = 10;

/// Why one static fetch failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | Timeout, connection failure | yes |
    /// | HTTP 5xx, HTTP 429 | yes |
    /// | Other non-2xx | no |
    /// | Truncated body | yes |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) | Self::Body(_) => true,
            Self::Status(code) => *code >= 500 || *code == StatusCode::TOO_MANY_REQUESTS.as_u16(),
        }
    }

    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// A successful (2xx) static response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,

    pub status: u16,

    /// Lowercased `Content-Type` header, empty when absent
    pub content_type: String,

    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Returns the body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true for text, HTML and XML content types
    ///
    /// A missing header is treated as HTML, which is what browsers do.
    pub fn is_document(&self) -> bool {
        let ct = self.content_type.as_str();
        ct.is_empty() || ct.starts_with("text/") || ct.contains("html") || ct.contains("xml")
    }

    /// Returns true for PDF responses, by header or by `.pdf` path
    pub fn is_pdf(&self) -> bool {
        self.content_type.contains("application/pdf")
            || self.final_url.path().to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Retry schedule for static fetches
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,

    /// Delay before the first retry; doubles for every further retry
    pub base_ms: u64,

    /// Ceiling on any single delay
    pub max_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            retries: config.retries,
            base_ms: config.retry_backoff_ms,
            max_ms: MAX_BACKOFF_MS,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        Duration::from_millis(exponential.min(self.max_ms))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use docsweep::config::FetchConfig;
/// use docsweep::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one GET request
///
/// Non-2xx responses become `FetchError::Status`.
pub async fn fetch_once(client: &Client, url: &Url) -> Result<FetchedPage, FetchError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let body = response.bytes().await?.to_vec();

    Ok(FetchedPage {
        final_url,
        status: status.as_u16(),
        content_type,
        body,
    })
}

/// Fetches a URL, retrying transient failures with backoff
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `policy` - How many retries and how long to wait between them
///
/// # Returns
///
/// The first successful response, or the last error once retries are
/// exhausted or a non-retryable error occurs
pub async fn fetch_with_retries(
    client: &Client,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<FetchedPage, FetchError> {
    let mut attempt = 0;
    loop {
        match fetch_once(client, url).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    "Fetch of {} failed ({}), retry {}/{} in {:?}",
                    url,
                    e,
                    attempt + 1,
                    policy.retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
