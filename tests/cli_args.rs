//! Integration tests for CLI argument handling
//!
//! Runs the binary for flag validation, the fatal missing-key path and the
//! plain output mode. No test here reaches the network: every run either
//! fails before fetching or is served entirely from a fresh cache.

use std::fs;
use std::path::Path;
use std::process::Command;

use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;

/// Helper to run the CLI with given args and API key, inside `dir`
fn run_cli(dir: &Path, api_key: Option<&str>, args: &[&str]) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cuttly-stats"));
    command.current_dir(dir).args(args).env_remove("CUTTLY_API_KEY");
    if let Some(key) = api_key {
        command.env("CUTTLY_API_KEY", key);
    }
    command.output().expect("Failed to execute cuttly-stats")
}

/// Writes a links file and returns the common path flags for it
fn setup(dir: &TempDir, links: serde_json::Value) -> Vec<String> {
    let links_path = dir.path().join("links.json");
    fs::write(&links_path, links.to_string()).unwrap();
    vec![
        "--links".to_string(),
        links_path.to_string_lossy().into_owned(),
        "--cache-file".to_string(),
        dir.path().join("cache.json").to_string_lossy().into_owned(),
        "--api-base".to_string(),
        "http://127.0.0.1:9/api/api.php".to_string(),
    ]
}

#[test]
fn test_help_flag_exits_successfully() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(dir.path(), None, &["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cuttly-stats"), "Help should mention cuttly-stats");
    assert!(stdout.contains("--plain"), "Help should mention --plain flag");
    assert!(stdout.contains("--refresh-now"), "Help should mention --refresh-now flag");
}

#[test]
fn test_missing_api_key_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut args = setup(&dir, json!([]));
    args.push("--plain".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_cli(dir.path(), None, &args);

    assert!(!output.status.success(), "Expected missing key to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CUTTLY_API_KEY"), "stderr: {}", stderr);
    assert!(output.stdout.is_empty(), "No partial output expected");
}

#[test]
fn test_short_delay_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(dir.path(), Some("key"), &["--delay", "5", "--plain"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid delay"), "stderr: {}", stderr);
}

#[test]
fn test_missing_links_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    let cache = dir.path().join("cache.json");
    let output = run_cli(
        dir.path(),
        Some("key"),
        &[
            "--plain",
            "--links",
            missing.to_str().unwrap(),
            "--cache-file",
            cache.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("links file"), "stderr: {}", stderr);
}

#[test]
fn test_plain_output_from_fresh_cache() {
    let dir = TempDir::new().unwrap();
    let mut args = setup(
        &dir,
        json!([{"name": "Landing page", "short": "https://cutt.ly/abc"}]),
    );
    fs::write(
        dir.path().join("cache.json"),
        json!({"abc": {"ts": Utc::now().timestamp(), "data": {"clicks": 9}}}).to_string(),
    )
    .unwrap();
    args.push("--plain".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_cli(dir.path(), Some("key"), &args);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Landing page"));
    assert!(stdout.contains("Total clicks:  9"));
    assert!(stdout.contains("Updated links: 1/1"));
    assert!(stdout.contains("API calls:     0"));
}

#[test]
fn test_plain_output_with_no_links() {
    let dir = TempDir::new().unwrap();
    let mut args = setup(&dir, json!([]));
    args.push("--plain".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = run_cli(dir.path(), Some("key"), &args);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Updated links: 0/0"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use cuttly_stats::cli::{Cli, CliError};

    #[test]
    fn test_cli_no_args_uses_defaults() {
        let cli = Cli::parse_from(["cuttly-stats"]);
        assert_eq!(cli.ttl, 3600);
        assert_eq!(cli.delay, 21);
        assert!(!cli.plain);
    }

    #[test]
    fn test_cli_refresh_now_flag() {
        let cli = Cli::parse_from(["cuttly-stats", "--refresh-now"]);
        assert!(cli.refresh_now);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["cuttly-stats", "--plan"]).is_err());
    }

    #[test]
    fn test_validate_short_delay() {
        let cli = Cli::parse_from(["cuttly-stats", "--delay", "19"]);
        assert!(matches!(cli.validate(), Err(CliError::DelayTooShort(19))));
    }
}
