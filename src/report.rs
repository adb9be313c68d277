//! Summary metrics and plain-text rendering of refresh results
//!
//! Both front ends (the TUI and `--plain`) show the same three metrics and the
//! same top-10 ranking, computed here from a cycle's rows.

use std::fmt::Write;

use crate::data::ResultRow;

/// Number of links shown in the clicks chart
pub const CHART_LIMIT: usize = 10;

/// Width of the longest bar in the plain-text chart
const PLAIN_BAR_WIDTH: u64 = 40;

/// Headline numbers for one refresh cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Sum of clicks over all rows
    pub total_clicks: u64,
    /// Rows that carry data (cached or freshly fetched)
    pub updated: usize,
    /// Number of configured links
    pub total_links: usize,
    /// Successful live fetches this cycle
    pub live_calls: usize,
}

impl Summary {
    pub fn from_rows(rows: &[ResultRow], live_calls: usize) -> Self {
        Self {
            total_clicks: rows.iter().map(|row| row.clicks).sum(),
            updated: rows.iter().filter(|row| row.is_updated()).count(),
            total_links: rows.len(),
            live_calls,
        }
    }
}

/// Rows with at least one click, most clicked first, at most `limit` of them.
/// Ties keep their configuration order.
pub fn top_by_clicks(rows: &[ResultRow], limit: usize) -> Vec<&ResultRow> {
    let mut ranked: Vec<&ResultRow> = rows.iter().filter(|row| row.clicks > 0).collect();
    ranked.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    ranked.truncate(limit);
    ranked
}

/// Rough duration of a cold run, in whole minutes
pub fn estimated_cold_run_minutes(links: usize, delay_secs: u64) -> u64 {
    links as u64 * delay_secs / 60
}

/// Renders the table, metrics and chart as plain text
pub fn render_plain(rows: &[ResultRow], summary: &Summary) -> String {
    let mut out = String::new();

    let name_width = rows
        .iter()
        .map(|row| row.source_name.chars().count())
        .chain(std::iter::once("Source".len()))
        .max()
        .unwrap_or(0);
    let url_width = rows
        .iter()
        .map(|row| row.short_url.chars().count())
        .chain(std::iter::once("Short URL".len()))
        .max()
        .unwrap_or(0);

    let _ = writeln!(
        out,
        "{:<name_width$}  {:<url_width$}  {:>8}  {}",
        "Source", "Short URL", "Clicks", "Updated"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<url_width$}  {:>8}  {}",
            row.source_name,
            row.short_url,
            row.clicks,
            row.last_updated_label()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total clicks:  {}", summary.total_clicks);
    let _ = writeln!(out, "Updated links: {}/{}", summary.updated, summary.total_links);
    let _ = writeln!(out, "API calls:     {}", summary.live_calls);

    if summary.total_clicks > 0 {
        let top = top_by_clicks(rows, CHART_LIMIT);
        let max = top.first().map(|row| row.clicks).unwrap_or(1).max(1);
        let label_width = top
            .iter()
            .map(|row| row.source_name.chars().count())
            .max()
            .unwrap_or(0);

        let _ = writeln!(out);
        let _ = writeln!(out, "Top {} by clicks", top.len());
        for row in top {
            let len = (row.clicks * PLAIN_BAR_WIDTH).div_ceil(max) as usize;
            let _ = writeln!(
                out,
                "{:<label_width$}  {} {}",
                row.source_name,
                "█".repeat(len),
                row.clicks
            );
        }
    }

    out
}
