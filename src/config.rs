//! Runtime configuration
//!
//! Combines parsed CLI flags, the `CUTTLY_API_KEY` secret and XDG default
//! paths into the settings the rest of the application runs with. Every
//! failure here is fatal: nothing is fetched without a key and a link list.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;

use crate::cache::CacheStore;
use crate::cli::Cli;
use crate::data::{FetcherConfig, LinkEntry};
use crate::refresh::RefreshPolicy;

/// Environment variable holding the Cutt.ly API key
pub const API_KEY_VAR: &str = "CUTTLY_API_KEY";

/// Name of the links file in the config directory
const LINKS_FILE_NAME: &str = "links.json";

/// Name of the log file written next to the cache in dashboard mode
const LOG_FILE_NAME: &str = "cuttly-stats.log";

/// Errors that stop the application before any work is done
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key in the environment or `.env`
    #[error("CUTTLY_API_KEY not found. Set it in the environment or in a .env file.")]
    MissingApiKey,

    /// No home directory to derive default paths from
    #[error("Could not determine a default location for {0}; pass it explicitly")]
    NoDefaultPath(&'static str),

    /// The links file could not be read
    #[error("Could not read links file {}: {source}", path.display())]
    LinksUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The links file is not a JSON list of {name, short}
    #[error("Invalid links file {}: {source}", path.display())]
    LinksInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Fully resolved settings for one process
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub links_path: PathBuf,
    pub cache_path: PathBuf,
    pub policy: RefreshPolicy,
    pub fetcher: FetcherConfig,
    pub refresh_now: bool,
    pub plain: bool,
}

impl Settings {
    /// Resolves settings from the CLI and the process environment
    ///
    /// Loads `.env` first so the key may live there.
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::resolve(cli, std::env::var(API_KEY_VAR).ok())
    }

    /// Resolves settings from the CLI and an explicit API key
    pub fn resolve(cli: &Cli, api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let project_dirs = ProjectDirs::from("", "", "cuttly-stats");

        let links_path = match (&cli.links, &project_dirs) {
            (Some(path), _) => path.clone(),
            (None, Some(dirs)) => dirs.config_dir().join(LINKS_FILE_NAME),
            (None, None) => return Err(ConfigError::NoDefaultPath("the links file")),
        };

        let cache_path = match &cli.cache_file {
            Some(path) => path.clone(),
            None => CacheStore::new()
                .map(|store| store.path().to_path_buf())
                .ok_or(ConfigError::NoDefaultPath("the cache file"))?,
        };

        Ok(Self {
            api_key,
            links_path,
            cache_path,
            policy: RefreshPolicy {
                ttl_secs: cli.ttl,
                call_delay: Duration::from_secs(cli.delay),
            },
            fetcher: FetcherConfig {
                api_base: cli.api_base.clone(),
                ..Default::default()
            },
            refresh_now: cli.refresh_now,
            plain: cli.plain,
        })
    }

    /// Log file used while the dashboard owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.cache_path.with_file_name(LOG_FILE_NAME)
    }
}

/// Reads the tracked links, in file order
///
/// # Returns
/// * `Ok(Vec<LinkEntry>)` with one entry per JSON object
/// * `Err(ConfigError)` if the file is missing or malformed
pub fn load_links(path: &Path) -> Result<Vec<LinkEntry>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LinksUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::LinksInvalid {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["cuttly-stats"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let result = Settings::resolve(&cli(&["--cache-file", "c.json"]), None);
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_blank_api_key_is_fatal() {
        let result = Settings::resolve(&cli(&["--cache-file", "c.json"]), Some("  ".to_string()));
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert!(err.to_string().contains("CUTTLY_API_KEY"));
    }

    #[test]
    fn test_resolve_uses_cli_values() {
        let settings = Settings::resolve(
            &cli(&[
                "--links",
                "l.json",
                "--cache-file",
                "/tmp/x/c.json",
                "--ttl",
                "120",
                "--delay",
                "25",
                "--plain",
            ]),
            Some(" secret ".to_string()),
        )
        .unwrap();

        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.links_path, PathBuf::from("l.json"));
        assert_eq!(settings.cache_path, PathBuf::from("/tmp/x/c.json"));
        assert_eq!(settings.policy.ttl_secs, 120);
        assert_eq!(settings.policy.call_delay, Duration::from_secs(25));
        assert_eq!(settings.fetcher.timeout, Duration::from_secs(15));
        assert!(settings.plain);
        assert!(!settings.refresh_now);
        assert_eq!(settings.log_path(), PathBuf::from("/tmp/x/cuttly-stats.log"));
    }

    #[test]
    fn test_load_links_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.json");
        fs::write(
            &path,
            r#"[
                {"name": "Instagram bio", "short": "https://cutt.ly/insta"},
                {"name": "Newsletter", "short": "https://cutt.ly/news"}
            ]"#,
        )
        .unwrap();

        let links = load_links(&path).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0], LinkEntry::new("Instagram bio", "https://cutt.ly/insta"));
        assert_eq!(links[1].code(), "news");
    }

    #[test]
    fn test_load_links_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_links(&temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::LinksUnreadable { .. })));
    }

    #[test]
    fn test_load_links_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.json");
        fs::write(&path, r#"[{"name": "no short"}]"#).unwrap();

        let result = load_links(&path);
        assert!(matches!(result, Err(ConfigError::LinksInvalid { .. })));
    }
}
