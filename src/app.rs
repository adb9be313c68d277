//! Application state management for the Cuttly Stats dashboard
//!
//! This module holds the dashboard state, handles keyboard input and folds
//! progress events from the running refresh cycle into what the UI shows.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};

use cuttly_stats::data::{LinkEntry, ResultRow};
use cuttly_stats::refresh::{RefreshEvent, RefreshOutcome, RefreshPolicy};
use cuttly_stats::report::Summary;

/// Whether a refresh cycle is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// A cycle is running; the table shows the previous results, if any
    Refreshing,
    /// The last cycle finished
    Ready,
}

/// Progress of the running cycle
#[derive(Debug, Clone, Default)]
pub struct Progress {
    /// Links processed so far
    pub done: usize,
    /// Links in this cycle
    pub total: usize,
    /// Index of the link being fetched
    current: usize,
    /// Last status message
    pub status: String,
    /// End of the current inter-call pause
    pub throttle_until: Option<Instant>,
}

impl Progress {
    /// Fraction of links processed, 0.0 to 1.0
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.done as f64 / self.total as f64).min(1.0)
        }
    }

    /// Whole seconds left in the current pause
    pub fn throttle_remaining(&self, now: Instant) -> Option<u64> {
        let until = self.throttle_until?;
        let left = until.saturating_duration_since(now);
        (!left.is_zero()).then(|| left.as_secs_f64().ceil() as u64)
    }
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Tracked links, in configuration order
    pub links: Vec<LinkEntry>,
    /// Rows of the last finished cycle
    pub rows: Vec<ResultRow>,
    /// Metrics of the last finished cycle
    pub summary: Option<Summary>,
    /// Progress of the running cycle
    pub progress: Progress,
    /// Index of the highlighted table row
    pub selected_index: usize,
    /// Timestamp of the last finished cycle
    pub last_refresh: Option<DateTime<Local>>,
    /// Flag indicating a manual refresh has been requested
    pub refresh_requested: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Pause between live calls, for the info line
    pub call_delay: Duration,
    /// Cache TTL, for the info line
    pub ttl_secs: u64,
}

impl App {
    /// Creates an App that starts out waiting for its first cycle
    pub fn new(links: Vec<LinkEntry>, policy: &RefreshPolicy) -> Self {
        Self {
            state: AppState::Refreshing,
            links,
            rows: Vec::new(),
            summary: None,
            progress: Progress::default(),
            selected_index: 0,
            last_refresh: None,
            refresh_requested: false,
            show_help: false,
            should_quit: false,
            call_delay: policy.call_delay,
            ttl_secs: policy.ttl_secs,
        }
    }

    /// Number of rows the table shows
    pub fn row_count(&self) -> usize {
        if self.rows.is_empty() {
            self.links.len()
        } else {
            self.rows.len()
        }
    }

    /// Folds one progress event into the state
    pub fn apply_event(&mut self, event: RefreshEvent) {
        match event {
            RefreshEvent::Started { total } => {
                self.state = AppState::Refreshing;
                self.progress = Progress {
                    total,
                    status: "Starting refresh".to_string(),
                    ..Default::default()
                };
            }
            RefreshEvent::Fetching { index, total, name } => {
                self.progress.current = index;
                self.progress.throttle_until = None;
                self.progress.status = format!("Updating: {} ({}/{})", name, index + 1, total);
            }
            RefreshEvent::CacheHit { index, total, name } => {
                self.progress.done = index + 1;
                self.progress.throttle_until = None;
                self.progress.status = format!("From cache: {} ({}/{})", name, index + 1, total);
            }
            RefreshEvent::Updated { name, clicks } => {
                self.progress.done = self.progress.current + 1;
                self.progress.status = format!("{}: {} clicks", name, clicks);
            }
            RefreshEvent::Failed { name, error } => {
                self.progress.done = self.progress.current + 1;
                self.progress.status = format!("Error: {} - {}", name, truncate(&error, 50));
            }
            RefreshEvent::Throttling { delay } => {
                self.progress.throttle_until = Some(Instant::now() + delay);
            }
            RefreshEvent::Completed { .. } => {
                self.progress.throttle_until = None;
            }
        }
    }

    /// Stores the outcome of a finished cycle
    pub fn finish(&mut self, outcome: RefreshOutcome) {
        self.summary = Some(Summary::from_rows(&outcome.rows, outcome.live_calls));
        self.rows = outcome.rows;
        self.selected_index = self.selected_index.min(self.row_count().saturating_sub(1));
        self.last_refresh = Some(Local::now());
        self.state = AppState::Ready;
    }

    /// Marks a cycle as started as soon as it is spawned
    ///
    /// The cycle's own `Started` event may arrive a few frames later; until
    /// then a second `r` must not queue another cycle.
    pub fn begin_cycle(&mut self) {
        self.state = AppState::Refreshing;
        self.refresh_requested = false;
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application (Esc closes help first)
    /// - `Up`/`k`, `Down`/`j`: Move the table selection
    /// - `r`: Clear the cache and refresh every link (only when idle)
    /// - `?`: Toggle the help overlay
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_index + 1 < self.row_count() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Char('r') => {
                // Cycles are never cancelled, so a running one must finish first
                if self.state == AppState::Ready {
                    self.refresh_requested = true;
                }
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        let links = vec![
            LinkEntry::new("One", "https://cutt.ly/one"),
            LinkEntry::new("Two", "https://cutt.ly/two"),
            LinkEntry::new("Three", "https://cutt.ly/three"),
        ];
        App::new(links, &RefreshPolicy::default())
    }

    fn outcome() -> RefreshOutcome {
        RefreshOutcome {
            rows: vec![
                ResultRow {
                    source_name: "One".to_string(),
                    short_url: "https://cutt.ly/one".to_string(),
                    clicks: 4,
                    updated_at: Some(1_700_000_000),
                },
                ResultRow {
                    source_name: "Two".to_string(),
                    short_url: "https://cutt.ly/two".to_string(),
                    clicks: 0,
                    updated_at: None,
                },
            ],
            live_calls: 1,
        }
    }

    #[test]
    fn test_app_starts_refreshing() {
        let app = test_app();
        assert_eq!(app.state, AppState::Refreshing);
        assert!(app.rows.is_empty());
        assert_eq!(app.row_count(), 3);
        assert_eq!(app.call_delay, Duration::from_secs(21));
    }

    #[test]
    fn test_events_update_progress() {
        let mut app = test_app();

        app.apply_event(RefreshEvent::Started { total: 3 });
        app.apply_event(RefreshEvent::CacheHit {
            index: 0,
            total: 3,
            name: "One".to_string(),
        });
        assert_eq!(app.progress.done, 1);

        app.apply_event(RefreshEvent::Fetching {
            index: 1,
            total: 3,
            name: "Two".to_string(),
        });
        assert!(app.progress.status.contains("Updating: Two (2/3)"));

        app.apply_event(RefreshEvent::Updated {
            name: "Two".to_string(),
            clicks: 8,
        });
        assert_eq!(app.progress.done, 2);
        assert!((app.progress.ratio() - 2.0 / 3.0).abs() < 1e-9);

        app.apply_event(RefreshEvent::Throttling {
            delay: Duration::from_secs(21),
        });
        let remaining = app.progress.throttle_remaining(Instant::now()).unwrap();
        assert!(remaining > 0 && remaining <= 21);
    }

    #[test]
    fn test_failed_event_truncates_message() {
        let mut app = test_app();
        app.apply_event(RefreshEvent::Started { total: 1 });
        app.apply_event(RefreshEvent::Failed {
            name: "One".to_string(),
            error: "x".repeat(200),
        });
        assert_eq!(app.progress.done, 1);
        assert!(app.progress.status.len() < 80);
    }

    #[test]
    fn test_finish_stores_rows_and_summary() {
        let mut app = test_app();
        app.selected_index = 2;

        app.finish(outcome());

        assert_eq!(app.state, AppState::Ready);
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.selected_index, 1);
        let summary = app.summary.unwrap();
        assert_eq!(summary.total_clicks, 4);
        assert_eq!(summary.updated, 1);
        assert!(app.last_refresh.is_some());
    }

    #[test]
    fn test_refresh_key_ignored_while_running() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(!app.refresh_requested);

        app.finish(outcome());
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(app.refresh_requested);
    }

    #[test]
    fn test_second_refresh_key_before_cycle_starts_is_ignored() {
        let mut app = test_app();
        app.finish(outcome());
        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(app.refresh_requested);

        // Spawned, but its Started event has not been drained yet
        app.begin_cycle();
        app.handle_key(key_event(KeyCode::Char('r')));

        assert_eq!(app.state, AppState::Refreshing);
        assert!(!app.refresh_requested);
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.selected_index, 0);
        for _ in 0..5 {
            app.handle_key(key_event(KeyCode::Char('j')));
        }
        assert_eq!(app.selected_index, 2);
        app.handle_key(key_event(KeyCode::Char('k')));
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_help_overlay_intercepts_keys() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(!app.should_quit);

        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
