//! Cutt.ly stats API client
//!
//! Fetches click statistics for a short-code. The API exposes two query forms
//! for the same lookup and neither is reliable on its own, so each fetch walks
//! the variants in order and returns the first one that answers with JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::{normalize_response, StatsSnapshot};

/// Base URL of the Cutt.ly API
pub const CUTTLY_API_URL: &str = "https://cutt.ly/api/api.php";

/// Domain used to rebuild full short links from a code
pub const CUTTLY_SHORT_DOMAIN: &str = "https://cutt.ly";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause after a 429 before trying the next variant
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

/// Error from a single endpoint variant
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Upstream answered 429
    #[error("rate limited by upstream")]
    RateLimited,

    /// Upstream answered with another non-success status
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    /// Connection, timeout or body read failure
    #[error("HTTP request failed: {0}")]
    Transport(reqwest::Error),

    /// Body was not JSON
    #[error("failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key
        AttemptError::Transport(err.without_url())
    }
}

/// Errors that can occur when fetching stats for a code
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every endpoint variant failed
    #[error("all {attempts} endpoint variants failed for '{code}': {last}")]
    Exhausted {
        code: String,
        attempts: usize,
        last: String,
    },
}

impl FetchError {
    /// The short-code the failed fetch was for
    pub fn code(&self) -> &str {
        match self {
            FetchError::Exhausted { code, .. } => code,
        }
    }
}

/// Anything that can produce a stats snapshot for a short-code
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetches the current stats for `code`
    async fn fetch(&self, code: &str) -> Result<StatsSnapshot, FetchError>;
}

/// Settings for [`CuttlyClient`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// API endpoint all variants are sent to
    pub api_base: String,
    /// Domain prepended to a code for the full-short-link variant
    pub short_domain: String,
    /// Timeout for each HTTP request
    pub timeout: Duration,
    /// Sleep after a 429 before moving to the next variant
    pub rate_limit_backoff: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_base: CUTTLY_API_URL.to_string(),
            short_domain: CUTTLY_SHORT_DOMAIN.to_string(),
            timeout: REQUEST_TIMEOUT,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }
}

/// Client for fetching link statistics from the Cutt.ly API
#[derive(Debug, Clone)]
pub struct CuttlyClient {
    http: Client,
    api_key: String,
    config: FetcherConfig,
}

impl CuttlyClient {
    /// Creates a client with the given API key and settings
    pub fn new(api_key: impl Into<String>, config: FetcherConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }

    /// Query parameters for each endpoint variant, in the order they are tried
    fn endpoint_variants(&self, code: &str) -> Vec<Vec<(&'static str, String)>> {
        let full_short = format!("{}/{}", self.config.short_domain.trim_end_matches('/'), code);
        vec![
            vec![("key", self.api_key.clone()), ("stats", full_short)],
            vec![
                ("key", self.api_key.clone()),
                ("short", code.to_string()),
                ("stats", "true".to_string()),
            ],
        ]
    }

    /// Sends one variant and normalizes its body
    async fn attempt(&self, query: &[(&'static str, String)]) -> Result<StatsSnapshot, AttemptError> {
        let response = self
            .http
            .get(&self.config.api_base)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        Ok(normalize_response(&body))
    }
}

#[async_trait]
impl StatsSource for CuttlyClient {
    /// Tries each endpoint variant in turn
    ///
    /// A 429 sleeps for the configured backoff before the next variant. Any
    /// other failure moves on immediately. The first success is returned
    /// without touching the remaining variants.
    async fn fetch(&self, code: &str) -> Result<StatsSnapshot, FetchError> {
        let variants = self.endpoint_variants(code);
        let attempts = variants.len();
        let mut last = String::from("no endpoint variants");

        for (index, query) in variants.iter().enumerate() {
            match self.attempt(query).await {
                Ok(snapshot) => {
                    debug!(code, variant = index, clicks = snapshot.clicks, "stats fetched");
                    return Ok(snapshot);
                }
                Err(AttemptError::RateLimited) => {
                    warn!(code, variant = index, "rate limited, backing off");
                    last = AttemptError::RateLimited.to_string();
                    tokio::time::sleep(self.config.rate_limit_backoff).await;
                }
                Err(err) => {
                    debug!(code, variant = index, error = %err, "endpoint variant failed");
                    last = err.to_string();
                }
            }
        }

        Err(FetchError::Exhausted {
            code: code.to_string(),
            attempts,
            last,
        })
    }
}
