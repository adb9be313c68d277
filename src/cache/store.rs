//! Cache store for persisting stats snapshots to disk
//!
//! Provides a `CacheStore` that keeps one `CacheRecord` per short-code in a
//! single JSON document. The whole mapping is loaded at the start of a run and
//! rewritten after every successful update.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Value;
use tracing::debug;

use crate::data::CacheRecord;

/// Default time-to-live for cached snapshots (one hour)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// File name of the cache document inside the cache directory
const CACHE_FILE_NAME: &str = "cuttly_cache.json";

/// In-memory view of the cache file, keyed by short-code
pub type CacheMap = BTreeMap<String, CacheRecord>;

/// Reads and writes the cache file
///
/// The file lives in an XDG-compliant cache directory
/// (`~/.cache/cuttly-stats/cuttly_cache.json` on Linux) unless a path is
/// given explicitly. Only one process is expected to write it at a time.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Path of the cache document
    path: PathBuf,
}

impl CacheStore {
    /// Creates a CacheStore in the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "cuttly-stats")?;
        Some(Self::with_path(project_dirs.cache_dir().join(CACHE_FILE_NAME)))
    }

    /// Creates a CacheStore backed by a specific file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full mapping
    ///
    /// Returns an empty mapping if the file doesn't exist or is not a JSON
    /// object. Records are read one by one: a record without a numeric `ts`
    /// or with a non-object `data` is skipped and the others are kept.
    pub fn load(&self) -> CacheMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return CacheMap::new(),
        };

        let entries: BTreeMap<String, Value> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "ignoring unreadable cache file");
                return CacheMap::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|(code, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some((code, record)),
                Err(err) => {
                    debug!(code = %code, error = %err, "skipping unreadable cache record");
                    None
                }
            })
            .collect()
    }

    /// Overwrites the file with the full mapping
    ///
    /// The JSON is written to a sibling temporary file first and renamed over
    /// the cache file, so an interrupted write leaves the previous version.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if directory creation, writing or renaming fails
    pub fn save(&self, cache: &CacheMap) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)
    }

    /// Deletes the cache file, forcing every link to be fetched again
    ///
    /// A missing file is not an error.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}
