//! Dashboard screen rendering
//!
//! Renders the metrics header, the link table, the top-10 clicks chart and,
//! while a cycle runs, a progress gauge with the current status.

use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame,
};

use cuttly_stats::data::NO_UPDATE_LABEL;
use cuttly_stats::report::{estimated_cold_run_minutes, top_by_clicks, CHART_LIMIT};

use crate::app::{App, AppState};

/// Renders the full dashboard
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let refreshing = app.state == AppState::Refreshing;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(if refreshing { 4 } else { 0 }),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_metrics(frame, app, chunks[1]);
    if refreshing {
        render_progress(frame, app, chunks[2]);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[3]);
    render_table(frame, app, body[0]);
    render_chart(frame, app, body[1]);

    render_footer(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let delay_secs = app.call_delay.as_secs();
    let info = format!(
        "{}s between API calls · cache {}h · first run ~{} min",
        delay_secs,
        app.ttl_secs / 3600,
        estimated_cold_run_minutes(app.links.len(), delay_secs)
    );
    let last = app
        .last_refresh
        .map(|t| format!(" · last refresh {}", t.format("%H:%M:%S")))
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(
            "Cutt.ly Click Dashboard",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{}{}", info, last),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_metrics(frame: &mut Frame, app: &App, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let (total, updated, calls) = match app.summary {
        Some(s) => (
            s.total_clicks.to_string(),
            format!("{}/{}", s.updated, s.total_links),
            s.live_calls.to_string(),
        ),
        None => ("…".to_string(), format!("…/{}", app.links.len()), "…".to_string()),
    };

    let metrics = [
        ("Total clicks", total),
        ("Updated links", updated),
        ("API calls", calls),
    ];
    for ((title, value), cell) in metrics.into_iter().zip(cells.iter()) {
        let paragraph = Paragraph::new(Span::styled(
            value,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)));
        frame.render_widget(paragraph, *cell);
    }
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let progress = &app.progress;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Refreshing "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(progress.ratio())
        .label(format!("{}/{}", progress.done, progress.total));
    frame.render_widget(gauge, chunks[0]);

    let status = match progress.throttle_remaining(Instant::now()) {
        Some(secs) => format!("{} · next link in {}s", progress.status, secs),
        None => progress.status.clone(),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(status, Style::default().fg(Color::Gray))),
        chunks[1],
    );
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = if app.rows.is_empty() {
        app.links
            .iter()
            .map(|link| {
                Row::new(vec![
                    Cell::from(link.name.clone()),
                    Cell::from(link.short.clone()),
                    Cell::from("…"),
                    Cell::from(NO_UPDATE_LABEL),
                ])
            })
            .collect()
    } else {
        app.rows
            .iter()
            .map(|row| {
                let label = row.last_updated_label();
                let label_style = if row.is_updated() {
                    Style::default()
                } else {
                    Style::default().fg(Color::Red)
                };
                Row::new(vec![
                    Cell::from(row.source_name.clone()),
                    Cell::from(row.short_url.clone()),
                    Cell::from(row.clicks.to_string()),
                    Cell::from(Span::styled(label, label_style)),
                ])
            })
            .collect()
    };

    let header = Row::new(vec!["Source", "Short URL", "Clicks", "Updated"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(40),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Link statistics "))
    .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Top {} by clicks ", CHART_LIMIT));

    let top = top_by_clicks(&app.rows, CHART_LIMIT);
    if top.is_empty() {
        let message = Paragraph::new("No click data yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let data: Vec<(&str, u64)> = top
        .iter()
        .map(|row| (row.source_name.as_str(), row.clicks))
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .data(data.as_slice())
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(chart, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh now  "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" select  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
