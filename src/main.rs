// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing_subscriber::EnvFilter;

mod app;
mod chart;
mod data;
mod error;
mod events;
mod source;
mod ui;

use app::{App, ConnectionState};
use data::{AnomalyScorer, MetricCatalog, ScorerConfig, TimeRange};
use source::SimulatedSource;

#[derive(Parser, Debug)]
#[command(name = "gridwatch")]
#[command(about = "Diagnostic TUI for streaming substation telemetry")]
struct Args {
    /// Metric to watch (voltage, current, temperature, frequency, or a
    /// config-defined key)
    #[arg(short, long, default_value = "voltage")]
    metric: String,

    /// History span: 15m, 1h, 6h or 24h
    #[arg(long, default_value = "1h")]
    range: String,

    /// Start with the live feed paused (history only)
    #[arg(long)]
    paused: bool,

    /// Seed for the simulated feed and the scorer (deterministic streams)
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML file with metric/scorer overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population variance above which the window is flagged
    #[arg(long, default_value = "100.0")]
    variance_threshold: f64,

    /// Probability of a noise-triggered false alarm per evaluation
    #[arg(long, default_value = "0.03")]
    false_positive_rate: f64,

    /// Re-score after this many live samples
    #[arg(long, default_value = "8")]
    eval_every: usize,

    /// Backfill, score, write JSON to this path, and exit (no TUI)
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Write tracing output to this file (the terminal belongs to the TUI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(ref path) = args.log_file {
        init_tracing(path)?;
    }

    let catalog = MetricCatalog::load(args.config.as_deref())?;
    let range = TimeRange::parse(&args.range)?;
    let scorer_config = ScorerConfig {
        variance_threshold: args.variance_threshold,
        false_positive_rate: args.false_positive_rate,
        eval_every: args.eval_every,
        ..ScorerConfig::default()
    };

    let (source, scorer) = match args.seed {
        Some(seed) => (
            SimulatedSource::with_seed(seed),
            AnomalyScorer::with_seed(scorer_config, seed),
        ),
        None => (SimulatedSource::new(), AnomalyScorer::new(scorer_config)),
    };

    // Producer tasks (live subscriptions) run on this runtime while the
    // TUI loop stays on the main thread.
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    // Headless export mode: backfill once, score, write, exit.
    if let Some(ref export_path) = args.export {
        let mut app = App::new(
            Box::new(source),
            catalog,
            scorer,
            &args.metric,
            range,
            false,
        )?;
        app.connect();
        if let ConnectionState::Disconnected(reason) = app.state() {
            anyhow::bail!("source unavailable: {}", reason);
        }
        app.export_state(export_path)?;
        println!(
            "Exported {} ({}) to {}",
            args.metric,
            range.label(),
            export_path.display()
        );
        return Ok(());
    }

    let app = App::new(
        Box::new(source),
        catalog,
        scorer,
        &args.metric,
        range,
        !args.paused,
    )?;
    run_tui(app)
}

/// Route tracing to a file; the terminal is owned by the TUI.
fn init_tracing(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the TUI with the given app state
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Initial backfill + subscription
    app.connect();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Event poll timeout doubles as the redraw/tick cadence.
    const TICK: Duration = Duration::from_millis(100);

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(0, area.height / 2 - 2, area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Metric / range selector
                Constraint::Min(8),    // Chart
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_selector(frame, app, chunks[1]);
            ui::chart::render(frame, app, chunks[2]);
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(TICK)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Drain live samples and re-score at the configured cadence
        app.on_tick();
    }

    Ok(())
}
