//! Key help and pacing notes, drawn over the dashboard

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

/// Key column label and what it does
const BINDINGS: [(&str, &str); 4] = [
    ("↑/k  ↓/j", "Select link"),
    ("r", "Clear cache, fetch every link"),
    ("?  Esc", "Close this help"),
    ("q", "Quit"),
];

const WIDTH: u16 = 50;

/// Renders the help box centered over the dashboard
pub fn render(frame: &mut Frame, app: &App) {
    let mut lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!(" {:<10}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(pacing_line(app));
    if app.state == AppState::Refreshing {
        lines.push(Line::from(Span::styled(
            " r is unavailable until this cycle ends.",
            Style::default().fg(Color::Red),
        )));
    }

    // Borders plus the wrapped pacing note
    let height = lines.len() as u16 + 3;
    let area = centered(frame.area(), WIDTH, height);

    let block = Block::default()
        .title(Span::styled(
            " Keys ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn pacing_line(app: &App) -> Line<'static> {
    Line::from(Span::styled(
        format!(
            " Links are fetched one by one, {}s apart. Records younger than {} min come from cache.",
            app.call_delay.as_secs(),
            app.ttl_secs / 60
        ),
        Style::default().fg(Color::DarkGray),
    ))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuttly_stats::refresh::{RefreshOutcome, RefreshPolicy};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_help_lists_keys_and_pacing() {
        let mut app = App::new(Vec::new(), &RefreshPolicy::default());
        app.finish(RefreshOutcome::default());

        let content = draw(&app);

        assert!(content.contains("Keys"));
        assert!(content.contains("Clear cache"));
        assert!(content.contains("21s apart"));
        assert!(!content.contains("unavailable"));
    }

    #[test]
    fn test_help_notes_refresh_blocked_while_running() {
        let app = App::new(Vec::new(), &RefreshPolicy::default());
        assert!(draw(&app).contains("unavailable"));
    }
}
