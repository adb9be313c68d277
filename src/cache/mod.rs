//! Cache module for storing stats snapshots to disk
//!
//! This module provides the cache store that persists the latest snapshot of
//! every tracked short-code to a single JSON file. A missing or unreadable
//! file is treated as an empty cache, so a corrupt cache only costs a cold
//! start.

mod store;

pub use store::{CacheMap, CacheStore, DEFAULT_CACHE_TTL_SECS};
