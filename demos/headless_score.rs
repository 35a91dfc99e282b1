//! Example: scoring a backfill without the TUI
//!
//! Runs the simulated source once, evaluates the anomaly scorer, and
//! builds a render frame - the same pipeline the TUI drives, printed as
//! plain text.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example headless_score
//! ```

use gridwatch::{
    AnomalyScorer, MetricCatalog, RenderFrame, RollingWindow, SampleSource, ScorerConfig,
    SimulatedSource, TimeRange,
};

fn main() -> anyhow::Result<()> {
    let catalog = MetricCatalog::builtin();
    let config = catalog.get("voltage")?;
    let range = TimeRange::H1;

    let mut source = SimulatedSource::with_seed(7);
    let mut window = RollingWindow::new(range.points());
    for sample in source.backfill(config, range)? {
        window.append(sample);
    }

    let mut scorer = AnomalyScorer::with_seed(ScorerConfig::default(), 7);
    let signal = scorer.evaluate(&window);

    let frame = RenderFrame::build(window.snapshot(), config, 80.0, 24.0)?;

    println!("metric    : {} ({})", config.label, config.unit);
    println!("range     : {} ({} points)", range.label(), window.len());
    println!("latest    : {:.2}", frame.latest);
    println!("min..max  : {:.2} .. {:.2}", frame.min_value, frame.max_value);
    println!("trend     : {:?}", frame.trend);
    println!(
        "signal    : {} (severity {:?}, confidence {}%)",
        signal.label, signal.severity, signal.confidence
    );

    Ok(())
}
