//! Rate-limited refresh cycle
//!
//! Walks the tracked links in order, serving fresh cache records directly and
//! fetching everything else one request at a time. The free Cutt.ly plan
//! allows 3 calls per 60 seconds, so every network attempt is followed by a
//! full pause before the next link is processed. Progress is reported over an
//! optional tokio channel so a UI can follow along.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cache::{CacheStore, DEFAULT_CACHE_TTL_SECS};
use crate::data::{CacheRecord, LinkEntry, ResultRow, StatsSource};

/// Pause between two live calls (free plan: 3 calls per 60s)
pub const DEFAULT_CALL_DELAY: Duration = Duration::from_secs(21);

/// Messages sent from a running refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A cycle started over `total` links
    Started { total: usize },
    /// A live fetch is starting for the link at `index`
    Fetching {
        index: usize,
        total: usize,
        name: String,
    },
    /// The link at `index` was served from cache
    CacheHit {
        index: usize,
        total: usize,
        name: String,
    },
    /// A live fetch succeeded
    Updated { name: String, clicks: u64 },
    /// A live fetch failed; the link shows zero clicks this cycle
    Failed { name: String, error: String },
    /// Waiting before the next link
    Throttling { delay: Duration },
    /// The cycle finished
    Completed { live_calls: usize },
}

/// Cache freshness and pacing settings
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Maximum age of a cache record before it is fetched again
    pub ttl_secs: u64,
    /// Pause after a live call when more links remain
    pub call_delay: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            call_delay: DEFAULT_CALL_DELAY,
        }
    }
}

/// Result of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// One row per configured link, in configuration order
    pub rows: Vec<ResultRow>,
    /// Number of successful live fetches this cycle
    pub live_calls: usize,
}

/// Runs refresh cycles against a stats source and the cache store
pub struct Refresher<S> {
    source: S,
    store: CacheStore,
    policy: RefreshPolicy,
    events: Option<mpsc::UnboundedSender<RefreshEvent>>,
}

impl<S: StatsSource> Refresher<S> {
    pub fn new(source: S, store: CacheStore, policy: RefreshPolicy) -> Self {
        Self {
            source,
            store,
            policy,
            events: None,
        }
    }

    /// Reports progress on `sender` during every cycle
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<RefreshEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    fn emit(&self, event: RefreshEvent) {
        if let Some(ref sender) = self.events {
            let _ = sender.send(event);
        }
    }

    /// Runs one full cycle over `links`
    ///
    /// Links are processed strictly in order. A fresh cache record is used
    /// as-is. Anything else is fetched; a success is written to the cache file
    /// immediately, a failure yields a zero-click row and is not cached. After
    /// every network attempt, successful or not, the cycle sleeps for the call
    /// delay unless it was the last link. No per-link failure aborts the cycle.
    pub async fn refresh(&self, links: &[LinkEntry]) -> RefreshOutcome {
        let mut cache = self.store.load();
        let total = links.len();
        let mut rows = Vec::with_capacity(total);
        let mut live_calls = 0;

        self.emit(RefreshEvent::Started { total });

        for (index, link) in links.iter().enumerate() {
            let code = link.code();
            let now = Utc::now().timestamp();

            let cached_row = cache
                .get(code)
                .filter(|record| record.is_fresh(now, self.policy.ttl_secs))
                .map(|record| ResultRow::from_snapshot(link, &record.data, record.ts));
            if let Some(row) = cached_row {
                self.emit(RefreshEvent::CacheHit {
                    index,
                    total,
                    name: link.name.clone(),
                });
                rows.push(row);
                continue;
            }

            self.emit(RefreshEvent::Fetching {
                index,
                total,
                name: link.name.clone(),
            });

            match self.source.fetch(code).await {
                Ok(snapshot) => {
                    info!(name = %link.name, code, clicks = snapshot.clicks, "link updated");
                    self.emit(RefreshEvent::Updated {
                        name: link.name.clone(),
                        clicks: snapshot.clicks,
                    });
                    rows.push(ResultRow::from_snapshot(link, &snapshot, now));
                    cache.insert(code.to_string(), CacheRecord::new(now, snapshot));
                    if let Err(err) = self.store.save(&cache) {
                        warn!(path = %self.store.path().display(), error = %err, "failed to write cache");
                    }
                    live_calls += 1;
                }
                Err(err) => {
                    warn!(name = %link.name, error = %err, "link fetch failed");
                    self.emit(RefreshEvent::Failed {
                        name: link.name.clone(),
                        error: err.to_string(),
                    });
                    rows.push(ResultRow::failed(link));
                }
            }

            if index + 1 < total {
                self.emit(RefreshEvent::Throttling {
                    delay: self.policy.call_delay,
                });
                tokio::time::sleep(self.policy.call_delay).await;
            }
        }

        self.emit(RefreshEvent::Completed { live_calls });
        RefreshOutcome { rows, live_calls }
    }

    /// Deletes the cache file and runs a cycle from scratch
    pub async fn refresh_now(&self, links: &[LinkEntry]) -> RefreshOutcome {
        if let Err(err) = self.store.clear() {
            warn!(path = %self.store.path().display(), error = %err, "failed to clear cache");
        }
        self.refresh(links).await
    }
}
