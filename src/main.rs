//! Cuttly Stats - click statistics for Cutt.ly short links
//!
//! Fetches click counts for a list of short links, one call at a time so the
//! free-plan rate limit is never hit, and shows them in a terminal dashboard
//! or as plain text.

mod app;
mod ui;

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use app::App;
use cuttly_stats::cache::CacheStore;
use cuttly_stats::cli::Cli;
use cuttly_stats::config::{load_links, Settings};
use cuttly_stats::data::{CuttlyClient, LinkEntry};
use cuttly_stats::logging::{self, LogTarget};
use cuttly_stats::refresh::{RefreshEvent, RefreshOutcome, Refresher};
use cuttly_stats::report::{render_plain, Summary};

type Dashboard = Refresher<CuttlyClient>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    ui::render_dashboard(frame, app);
    if app.show_help {
        ui::render_help_overlay(frame, app);
    }
}

/// Starts one refresh cycle on its own task
fn spawn_cycle(
    refresher: Arc<Dashboard>,
    links: Arc<Vec<LinkEntry>>,
    clear_first: bool,
) -> JoinHandle<RefreshOutcome> {
    tokio::spawn(async move {
        if clear_first {
            refresher.refresh_now(&links).await
        } else {
            refresher.refresh(&links).await
        }
    })
}

/// Runs one cycle, reporting progress on stderr, and prints the results
async fn run_plain(refresher: Refresher<CuttlyClient>, links: &[LinkEntry], clear_first: bool) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let refresher = refresher.with_events(tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RefreshEvent::Fetching { index, total, name } => {
                    eprintln!("Updating: {} ({}/{})", name, index + 1, total)
                }
                RefreshEvent::CacheHit { index, total, name } => {
                    eprintln!("From cache: {} ({}/{})", name, index + 1, total)
                }
                RefreshEvent::Updated { name, clicks } => eprintln!("{}: {} clicks", name, clicks),
                RefreshEvent::Failed { name, error } => eprintln!("Error: {} - {}", name, error),
                RefreshEvent::Throttling { delay } => {
                    eprintln!("Waiting {}s before the next link...", delay.as_secs())
                }
                RefreshEvent::Started { .. } | RefreshEvent::Completed { .. } => {}
            }
        }
    });

    let outcome = if clear_first {
        refresher.refresh_now(links).await
    } else {
        refresher.refresh(links).await
    };
    // Closing the channel ends the printer
    drop(refresher);
    let _ = printer.await;

    let summary = Summary::from_rows(&outcome.rows, outcome.live_calls);
    print!("{}", render_plain(&outcome.rows, &summary));
}

/// Runs the interactive dashboard until the user quits
async fn run_dashboard(
    refresher: Refresher<CuttlyClient>,
    links: Vec<LinkEntry>,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let refresher = Arc::new(refresher.with_events(tx));
    let links = Arc::new(links);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(links.to_vec(), &settings.policy);
    let mut cycle = Some(spawn_cycle(
        Arc::clone(&refresher),
        Arc::clone(&links),
        settings.refresh_now,
    ));

    // Main event loop
    loop {
        while let Ok(event) = rx.try_recv() {
            app.apply_event(event);
        }

        if cycle.as_ref().is_some_and(|handle| handle.is_finished()) {
            if let Some(handle) = cycle.take() {
                match handle.await {
                    Ok(outcome) => app.finish(outcome),
                    Err(err) => error!(error = %err, "refresh task failed"),
                }
            }
        }

        if app.refresh_requested && cycle.is_none() {
            app.begin_cycle();
            info!("manual refresh requested");
            cycle = Some(spawn_cycle(Arc::clone(&refresher), Arc::clone(&links), true));
        }

        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Err(err) = cli.validate() {
        eprintln!("Error: {}", err);
        return Ok(ExitCode::FAILURE);
    }

    let settings = match Settings::from_env(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    if settings.plain {
        logging::init(LogTarget::Stderr)?;
    } else {
        logging::init(LogTarget::File(&settings.log_path()))?;
    }

    let links = match load_links(&settings.links_path) {
        Ok(links) => links,
        Err(err) => {
            eprintln!("Error: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(links = links.len(), cache = %settings.cache_path.display(), "starting");

    let client = CuttlyClient::new(settings.api_key.clone(), settings.fetcher.clone())?;
    let store = CacheStore::with_path(settings.cache_path.clone());
    let refresher = Refresher::new(client, store, settings.policy.clone());

    if settings.plain {
        run_plain(refresher, &links, settings.refresh_now).await;
    } else {
        run_dashboard(refresher, links, &settings).await?;
    }

    Ok(ExitCode::SUCCESS)
}
