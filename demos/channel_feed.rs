//! Example: feeding gridwatch from your own collector
//!
//! This example demonstrates how to integrate gridwatch into your own
//! application by pushing samples through a channel feed.
//!
//! This is useful when you want to:
//! - Bridge readings from a real gateway (Modbus poller, MQTT, etc.)
//! - Generate synthetic data for testing
//! - Replay recorded telemetry
//!
//! # Usage
//!
//! ```bash
//! cargo run --example channel_feed
//! ```

use std::time::Duration;

use chrono::Utc;
use gridwatch::{
    AnomalyScorer, App, ChannelSource, MetricCatalog, Sample, ScorerConfig, TimeRange,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Channel feed example");
    println!("Pushing synthetic voltage readings...\n");

    // Create a feed/source pair - the feed side goes to the collector,
    // the source side to the controller.
    let (feed, source) = ChannelSource::create("demo-collector");

    let mut app = App::new(
        Box::new(source),
        MetricCatalog::builtin(),
        AnomalyScorer::with_seed(ScorerConfig::default(), 42),
        "voltage",
        TimeRange::M15,
        true,
    )?;
    app.connect();

    // Push readings from a background task, as a transport bridge would.
    tokio::spawn(async move {
        let mut value = 230.0;
        let mut step = 0u64;
        loop {
            // A little sawtooth so the trend flips now and then
            step += 1;
            value += if (step / 20) % 2 == 0 { 0.4 } else { -0.4 };
            if !feed.send(Sample::new(value, Utc::now())) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    });

    // Drain the controller on the "main loop" and report what it sees.
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        app.on_tick();

        if let Ok(sample) = app.window().last() {
            let signal = app
                .signal()
                .map(|s| format!("{} ({}%)", s.label, s.confidence))
                .unwrap_or_else(|| "scoring…".into());
            println!(
                "{:>8.2} kV  window={:>3}  {}",
                sample.value,
                app.window().len(),
                signal
            );
        }
    }

    Ok(())
}
