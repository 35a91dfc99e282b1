//! Common UI components: header bar, selector bar, status bar, help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, ConnectionState};

/// Render the header bar with the latest reading and the anomaly badge.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.metric();

    let state_label = app.state().label();
    let state_style = match app.state() {
        ConnectionState::Live => Style::default().fg(app.theme.healthy),
        ConnectionState::Paused => Style::default().fg(app.theme.warning),
        ConnectionState::Disconnected(_) => {
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
        }
        _ => Style::default().add_modifier(Modifier::DIM),
    };

    let mut spans = vec![
        Span::styled(" ● ", state_style),
        Span::styled("GRIDWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
    ];

    match app.window().last() {
        Ok(sample) => {
            spans.push(Span::styled(
                format!("{:.2} {}", sample.value, config.unit),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            if let Some((delta, percent)) = app.change() {
                let (arrow, style) = if delta >= 0.0 {
                    ("↗", Style::default().fg(app.theme.healthy))
                } else {
                    ("↘", Style::default().fg(app.theme.critical))
                };
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("{} {:+.2} ({:+.2}%)", arrow, delta, percent),
                    style,
                ));
            }
        }
        Err(_) => {
            spans.push(Span::styled("--.--", Style::default().add_modifier(Modifier::DIM)));
        }
    }

    spans.push(Span::raw(" │ "));
    match app.signal() {
        Some(signal) => {
            spans.push(Span::styled(
                format!("{} {} ", signal.severity.symbol(), signal.label),
                app.theme.severity_style(signal.severity),
            ));
            spans.push(Span::styled(
                format!("{}%", signal.confidence),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
        None => {
            spans.push(Span::styled("scoring…", Style::default().add_modifier(Modifier::DIM)));
        }
    }

    spans.push(Span::raw(" │ "));
    spans.push(Span::raw(format!("{} pts", app.window().len())));
    spans.push(Span::raw(" │ "));
    spans.push(Span::styled(state_label, state_style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the metric and time-range selector bar.
pub fn render_selector(frame: &mut Frame, app: &App, area: Rect) {
    let mut titles: Vec<Line> = app
        .catalog()
        .entries()
        .iter()
        .enumerate()
        .map(|(i, m)| Line::from(format!(" {}:{} ", i + 1, m.label)))
        .collect();

    // Time ranges appended after the metrics, visually separated by the
    // tab divider.
    for range in crate::data::TimeRange::ALL {
        let marker = if range == app.range() { "▸" } else { " " };
        titles.push(Line::from(format!("{}{} ", marker, range.label())));
    }

    let tabs = Tabs::new(titles)
        .select(app.metric_index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the data source, freshness, and available controls; temporary
/// status messages take priority.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = match app.state() {
        ConnectionState::Disconnected(reason) => {
            format!(" Offline: {} | r:retry q:quit", reason)
        }
        _ => {
            let freshness = match app.window().last() {
                Ok(sample) => {
                    let age = chrono::Utc::now() - sample.timestamp;
                    format!("{:.1}s ago", age.num_milliseconds() as f64 / 1000.0)
                }
                Err(_) => "waiting".to_string(),
            };
            format!(
                " {} | {} | Space:pause [/]:range 1-{}:metric e:export ?:help q:quit",
                app.source_description(),
                freshness,
                app.catalog().len(),
            )
        }
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the chart.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.tab_active)]),
        Line::from(""),
        Line::from(vec![Span::styled(" Selection", bold)]),
        Line::from("  1-9 ←/→    Switch metric"),
        Line::from("  [ / ]      Cycle time range"),
        Line::from(""),
        Line::from(vec![Span::styled(" Streaming", bold)]),
        Line::from("  Space      Pause / resume live feed"),
        Line::from("  r          Retry when offline"),
        Line::from(""),
        Line::from(vec![Span::styled(" General", bold)]),
        Line::from("  e          Export window to JSON"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 18u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
