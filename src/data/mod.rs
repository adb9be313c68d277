//! Core data models for Cuttly Stats
//!
//! This module contains the types shared by the cache, the remote fetcher and
//! the refresh loop: tracked links, normalized statistics snapshots, cache
//! records and the rows handed to the presentation layer.

pub mod cuttly;
pub mod normalize;

pub use cuttly::{AttemptError, CuttlyClient, FetchError, FetcherConfig, StatsSource};
pub use normalize::normalize_response;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label shown in place of a timestamp when a link has no usable data
pub const NO_UPDATE_LABEL: &str = "—";

/// A tracked short link, supplied by the links file at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Human-readable label for the link
    pub name: String,
    /// Full short URL (e.g. `https://cutt.ly/abc`)
    pub short: String,
}

impl LinkEntry {
    pub fn new(name: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: short.into(),
        }
    }

    /// Returns the short-code used as cache key and API lookup key
    pub fn code(&self) -> &str {
        code_from_short(&self.short)
    }
}

/// Extracts the short-code (last path segment) from a short URL.
///
/// A trailing slash, query string or fragment is ignored. A string with no
/// `/` at all is returned unchanged.
pub fn code_from_short(short: &str) -> &str {
    let end = short.find(['?', '#']).unwrap_or(short.len());
    let path = short[..end].trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}

/// Canonical click statistics for one short link
///
/// Every field except `clicks` is optional because the upstream API returns
/// different shapes depending on the endpoint variant that answered.
///
/// On disk a snapshot is a flat camelCase object. Stored keys that the typed
/// fields cannot carry (unknown keys, explicit nulls, values of an unexpected
/// type) are kept in `extra` and written back unchanged, so a cache file
/// survives a load/save cycle as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct StatsSnapshot {
    pub status: Option<Value>,
    pub title: Option<String>,
    pub full_link: Option<String>,
    pub short_link: Option<String>,
    /// Total clicks, 0 when the response carried no usable count
    pub clicks: u64,
    pub date: Option<String>,
    pub devices: Option<Value>,
    pub refs: Option<Value>,
    /// The untouched stats object the snapshot was built from
    pub raw: Value,
    /// Stored keys not represented by the fields above
    pub extra: Map<String, Value>,
}

fn take<T>(doc: &mut Map<String, Value>, key: &str, convert: fn(&Value) -> Option<T>) -> Option<T> {
    let converted = doc.get(key).and_then(convert)?;
    doc.remove(key);
    Some(converted)
}

fn non_null(value: &Value) -> Option<Value> {
    Some(value).filter(|v| !v.is_null()).cloned()
}

fn string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl From<Map<String, Value>> for StatsSnapshot {
    fn from(mut doc: Map<String, Value>) -> Self {
        let mut snapshot = StatsSnapshot {
            status: take(&mut doc, "status", non_null),
            title: take(&mut doc, "title", string),
            full_link: take(&mut doc, "fullLink", string),
            short_link: take(&mut doc, "shortLink", string),
            clicks: 0,
            date: take(&mut doc, "date", string),
            devices: take(&mut doc, "devices", non_null),
            refs: take(&mut doc, "refs", non_null),
            raw: take(&mut doc, "raw", non_null).unwrap_or(Value::Null),
            extra: Map::new(),
        };
        // A count stored in another form (e.g. "12") stays in `extra` as written
        snapshot.clicks = take(&mut doc, "clicks", Value::as_u64)
            .or_else(|| doc.get("clicks").and_then(normalize::as_count))
            .unwrap_or(0);
        snapshot.extra = doc;
        snapshot
    }
}

impl From<StatsSnapshot> for Map<String, Value> {
    fn from(snapshot: StatsSnapshot) -> Self {
        let mut doc = snapshot.extra;
        let typed = [
            ("status", snapshot.status),
            ("title", snapshot.title.map(Value::String)),
            ("fullLink", snapshot.full_link.map(Value::String)),
            ("shortLink", snapshot.short_link.map(Value::String)),
            ("date", snapshot.date.map(Value::String)),
            ("devices", snapshot.devices),
            ("refs", snapshot.refs),
            ("raw", non_null(&snapshot.raw)),
        ];
        for (key, value) in typed {
            if let Some(value) = value {
                doc.insert(key.to_string(), value);
            }
        }
        doc.entry("clicks").or_insert_with(|| Value::from(snapshot.clicks));
        doc
    }
}

/// One cached snapshot, keyed by short-code in the cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// When the snapshot was fetched (epoch seconds)
    pub ts: i64,
    /// The snapshot itself
    #[serde(default)]
    pub data: StatsSnapshot,
}

impl CacheRecord {
    pub fn new(ts: i64, data: StatsSnapshot) -> Self {
        Self { ts, data }
    }

    /// A record is fresh iff `now - ts < ttl_secs`
    pub fn is_fresh(&self, now: i64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.ts) < ttl_secs as i64
    }
}

/// One line of the results table, rebuilt on every refresh cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// Label of the tracked link
    pub source_name: String,
    /// Short link as reported upstream, or the configured one
    pub short_url: String,
    /// Click count, 0 when the fetch failed
    pub clicks: u64,
    /// When the underlying snapshot was fetched (epoch seconds)
    pub updated_at: Option<i64>,
}

impl ResultRow {
    /// Builds a row from a snapshot fetched at `ts`
    pub fn from_snapshot(link: &LinkEntry, snapshot: &StatsSnapshot, ts: i64) -> Self {
        Self {
            source_name: link.name.clone(),
            short_url: snapshot
                .short_link
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| link.short.clone()),
            clicks: snapshot.clicks,
            updated_at: Some(ts),
        }
    }

    /// Builds the placeholder row for a link whose fetch failed
    pub fn failed(link: &LinkEntry) -> Self {
        Self {
            source_name: link.name.clone(),
            short_url: link.short.clone(),
            clicks: 0,
            updated_at: None,
        }
    }

    /// Whether the row carries real data
    pub fn is_updated(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Local `HH:MM` of the last update, or "—" when there is none
    pub fn last_updated_label(&self) -> String {
        self.updated_at
            .and_then(|ts| Local.timestamp_opt(ts, 0).single())
            .map(|dt: DateTime<Local>| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| NO_UPDATE_LABEL.to_string())
    }
}
