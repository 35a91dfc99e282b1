//! Trend chart view: rasterizes a [`RenderFrame`] onto a ratatui canvas.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::Line,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, Borders, Paragraph,
    },
    Frame,
};

use crate::app::{App, ConnectionState};
use crate::chart::RenderFrame;

/// Frame-space dimensions; the canvas maps them onto the widget area.
const FRAME_W: f64 = 100.0;
const FRAME_H: f64 = 100.0;
/// Bezier subdivisions per path segment.
const FLATTEN_STEPS: usize = 6;

/// Render the chart area for the current window.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.metric();
    let title = format!(
        " {} ({}) · {} ",
        config.label,
        config.unit,
        app.range().label()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if let ConnectionState::Disconnected(reason) = app.state() {
        let lines = vec![
            Line::from(""),
            Line::styled(
                "  ⚠ Offline",
                Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
            ),
            Line::from(format!("  {}", reason)),
            Line::from(""),
            Line::styled("  Press r to retry", Style::default().add_modifier(Modifier::DIM)),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let drawable = RenderFrame::build(
        app.window().snapshot(),
        config,
        FRAME_W,
        FRAME_H,
    );
    let Ok(chart) = drawable else {
        // Empty window: backfill still in flight (or feed has no history yet).
        let lines = vec![
            Line::from(""),
            Line::styled("  Waiting for samples…", Style::default().add_modifier(Modifier::DIM)),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    };

    let theme_border = app.theme.border;
    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, FRAME_W])
        .y_bounds([0.0, FRAME_H])
        .paint(move |ctx| {
            // Horizontal grid lines, dashed.
            for i in 1..4 {
                let y = FRAME_H / 4.0 * i as f64;
                let mut x = 0.0;
                while x < FRAME_W {
                    ctx.draw(&CanvasLine {
                        x1: x,
                        y1: y,
                        x2: (x + 2.0).min(FRAME_W),
                        y2: y,
                        color: Color::DarkGray,
                    });
                    x += 5.0;
                }
            }

            let polyline = chart.flatten(FLATTEN_STEPS);

            // Filled area beneath the curve: dimmed columns down to the
            // baseline stand in for a translucent gradient fill.
            let (fr, fg, fb) = chart.gradient.start;
            let fill_color = Color::Rgb(fr / 4, fg / 4, fb / 4);
            for p in &polyline {
                ctx.draw(&CanvasLine {
                    x1: p.x,
                    y1: 0.0,
                    x2: p.x,
                    y2: p.y,
                    color: fill_color,
                });
            }

            ctx.layer();

            // Reference line at the metric target, dashed.
            let mut x = 0.0;
            while x < FRAME_W {
                ctx.draw(&CanvasLine {
                    x1: x,
                    y1: chart.target_y,
                    x2: (x + 3.0).min(FRAME_W),
                    y2: chart.target_y,
                    color: theme_border,
                });
                x += 6.0;
            }

            // The smoothed trend line, gradient-colored along its length.
            for pair in polyline.windows(2) {
                let t = pair[0].x / FRAME_W;
                let (r, g, b) = chart.gradient.color_at(t);
                ctx.draw(&CanvasLine {
                    x1: pair[0].x,
                    y1: pair[0].y,
                    x2: pair[1].x,
                    y2: pair[1].y,
                    color: Color::Rgb(r, g, b),
                });
            }

            ctx.layer();

            // Highlighted marker on the most recent sample.
            let (mr, mg, mb) = chart.gradient.end;
            let marker_color = Color::Rgb(mr, mg, mb);
            ctx.draw(&Circle {
                x: chart.marker.x,
                y: chart.marker.y,
                radius: 1.5,
                color: marker_color,
            });
            ctx.draw(&Points {
                coords: &[(chart.marker.x, chart.marker.y)],
                color: marker_color,
            });

            // Extrema labels along the left edge.
            ctx.print(
                0.0,
                FRAME_H - 2.0,
                Line::styled(format!("{:.1}", chart.max_value), Style::default().fg(Color::Gray)),
            );
            ctx.print(
                0.0,
                2.0,
                Line::styled(format!("{:.1}", chart.min_value), Style::default().fg(Color::Gray)),
            );
        });

    frame.render_widget(canvas, area);
}
