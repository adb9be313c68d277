//! Tracing subscriber setup
//!
//! Plain mode logs to stderr. The dashboard owns the terminal, so it logs to a
//! file instead. `RUST_LOG` overrides the default level in both cases.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Where log lines go
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    /// Standard error, default level `warn`
    Stderr,
    /// Append to a file, default level `info`
    File(&'a Path),
}

impl LogTarget<'_> {
    /// Level used when `RUST_LOG` is unset
    ///
    /// Plain mode already prints one progress line per link on stderr, so only
    /// warnings are added there by default.
    pub fn default_level(&self) -> &'static str {
        match self {
            LogTarget::Stderr => "warn",
            LogTarget::File(_) => "info",
        }
    }
}

/// Installs the global subscriber.
///
/// Calling it a second time is a no-op.
pub fn init(target: LogTarget<'_>) -> io::Result<()> {
    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter(target.default_level()))
                .with_writer(io::stderr)
                .try_init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter(target.default_level()))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
    }
    Ok(())
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_levels() {
        assert_eq!(LogTarget::Stderr.default_level(), "warn");
        assert_eq!(LogTarget::File(Path::new("x.log")).default_level(), "info");
    }

    #[test]
    fn test_file_target_creates_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("cuttly-stats.log");

        init(LogTarget::File(&path)).expect("init should succeed");

        assert!(path.exists());
    }
}
