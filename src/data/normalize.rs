//! Normalization of Cutt.ly stats responses
//!
//! The stats endpoint answers with the interesting object under either a
//! `stats` or a `url` key depending on which query form was used, and the
//! click count appears as `clicks` or `totalClicks`. This module maps every
//! shape onto one [`StatsSnapshot`].

use serde_json::{Map, Value};

use super::StatsSnapshot;

/// Keys that may hold the stats object, in priority order
const STATS_KEYS: [&str; 2] = ["stats", "url"];

/// Keys that may hold the click count, in priority order
const CLICK_KEYS: [&str; 2] = ["clicks", "totalClicks"];

/// Maps one upstream JSON response onto a [`StatsSnapshot`].
///
/// The first of `stats` / `url` holding a non-empty object wins; with
/// neither present the snapshot is built from an empty object. Missing or
/// mistyped fields become `None` and never produce an error.
pub fn normalize_response(response: &Value) -> StatsSnapshot {
    let stats = locate_stats(response);

    StatsSnapshot {
        status: stats.get("status").filter(|v| !v.is_null()).cloned(),
        title: string_field(&stats, "title"),
        full_link: string_field(&stats, "fullLink"),
        short_link: string_field(&stats, "shortLink"),
        clicks: extract_clicks(&stats),
        date: string_field(&stats, "date"),
        devices: stats.get("devices").filter(|v| !v.is_null()).cloned(),
        refs: stats.get("refs").filter(|v| !v.is_null()).cloned(),
        raw: Value::Object(stats),
        extra: Map::new(),
    }
}

fn locate_stats(response: &Value) -> Map<String, Value> {
    STATS_KEYS
        .iter()
        .filter_map(|key| response.get(key).and_then(Value::as_object))
        .find(|obj| !obj.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn string_field(stats: &Map<String, Value>, key: &str) -> Option<String> {
    match stats.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-zero count among [`CLICK_KEYS`], else 0.
///
/// Counts may arrive as numbers or numeric strings. Negative, fractional or
/// non-numeric values are skipped.
fn extract_clicks(stats: &Map<String, Value>) -> u64 {
    CLICK_KEYS
        .iter()
        .filter_map(|key| stats.get(*key).and_then(as_count))
        .find(|&count| count > 0)
        .unwrap_or(0)
}

pub(crate) fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
