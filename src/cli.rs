//! Command-line interface parsing for Cuttly Stats
//!
//! This module handles parsing of CLI arguments using clap and the checks
//! that protect the upstream rate limit from a mistyped flag.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_TTL_SECS;
use crate::data::cuttly::CUTTLY_API_URL;

/// Default pause between live calls, in seconds
pub const DEFAULT_DELAY_SECS: u64 = 21;

/// Smallest pause that stays within 3 calls per 60 seconds
pub const MIN_DELAY_SECS: u64 = 20;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The call delay would exceed the free-plan quota
    #[error("Invalid delay: {0}s. The free plan allows 3 calls per minute, use at least 20s")]
    DelayTooShort(u64),

    /// The API base is not an http(s) URL
    #[error("Invalid API base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidApiBase(String),
}

/// Cuttly Stats - click statistics for your Cutt.ly links
#[derive(Parser, Debug)]
#[command(name = "cuttly-stats")]
#[command(about = "Cutt.ly click statistics dashboard, paced for the free-plan rate limit")]
#[command(version)]
pub struct Cli {
    /// JSON file listing the tracked links as [{"name": ..., "short": ...}]
    ///
    /// Defaults to links.json in the user config directory.
    #[arg(long, value_name = "FILE")]
    pub links: Option<PathBuf>,

    /// Cache file location (defaults to the user cache directory)
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Seconds a cached result stays fresh
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub ttl: u64,

    /// Seconds to wait between two live API calls
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_DELAY_SECS)]
    pub delay: u64,

    /// Delete the cache before loading, fetching every link again
    #[arg(long)]
    pub refresh_now: bool,

    /// Print the results as text and exit instead of opening the dashboard
    #[arg(long)]
    pub plain: bool,

    /// Cutt.ly API endpoint
    #[arg(long, value_name = "URL", default_value = CUTTLY_API_URL)]
    pub api_base: String,
}

impl Cli {
    /// Checks the values clap cannot validate on its own.
    ///
    /// # Returns
    /// * `Ok(())` if every flag is usable
    /// * `Err(CliError)` naming the first bad flag
    pub fn validate(&self) -> Result<(), CliError> {
        if self.delay < MIN_DELAY_SECS {
            return Err(CliError::DelayTooShort(self.delay));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(CliError::InvalidApiBase(self.api_base.clone()));
        }
        Ok(())
    }
}
