//! Simulated telemetry source.
//!
//! Generates bounded, mean-reverting synthetic series resembling sensor
//! jitter: a slow sine carrier, uniform noise scaled to the metric's
//! variation band, and a momentum term pulling each value back toward the
//! nominal target. The same model drives both backfill and the live feed.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use super::{SampleSource, Subscription};
use crate::data::{MetricConfig, Sample, TimeRange};
use crate::error::FeedError;

/// Sine phase advance per backfill index.
const BACKFILL_PHASE_STEP: f64 = 0.05;
/// Carrier/noise/momentum weights for the historical series.
const BACKFILL_TREND: f64 = 0.5;
const BACKFILL_NOISE: f64 = 0.4;
const BACKFILL_MOMENTUM: f64 = 0.05;
/// Carrier/noise/momentum weights for the live feed. Live samples are
/// deliberately noisier than history.
const LIVE_TREND: f64 = 0.4;
const LIVE_NOISE: f64 = 0.6;
const LIVE_MOMENTUM: f64 = 0.1;
/// Seconds per radian of the live sine carrier (period ~94s).
const LIVE_CARRIER_SECS: f64 = 15.0;

/// A seeded synthetic sample generator.
///
/// Two sources built with the same seed produce identical backfills, which
/// is what makes golden-file style assertions possible. Each live
/// subscription draws its own task seed from the source, so re-subscribing
/// does not replay the previous stream.
#[derive(Debug)]
pub struct SimulatedSource {
    rng: StdRng,
    seed: u64,
    description: String,
}

impl SimulatedSource {
    /// Create a generator with an arbitrary seed.
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    /// Create a generator with a fixed seed for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            description: format!("simulated (seed {})", seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for SimulatedSource {
    fn backfill(
        &mut self,
        config: &MetricConfig,
        range: TimeRange,
    ) -> Result<Vec<Sample>, FeedError> {
        let points = range.points();
        let step_ms = range.span().as_millis() as i64 / points as i64;
        let now = Utc::now();

        // Fresh rng per call so the series is a pure function of
        // (seed, config, range).
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut last = config.target;
        let mut samples = Vec::with_capacity(points);

        for i in 0..points {
            let trend = (i as f64 * BACKFILL_PHASE_STEP).sin() * config.variation * BACKFILL_TREND;
            let noise = (rng.gen::<f64>() - 0.5) * config.variation * BACKFILL_NOISE;
            let momentum = (last - config.target) * BACKFILL_MOMENTUM;
            let value = Self::round2(config.target + trend + noise + momentum);
            last = value;

            let timestamp = now - chrono::Duration::milliseconds((points - 1 - i) as i64 * step_ms);
            samples.push(Sample::synthetic(value, timestamp));
        }

        Ok(samples)
    }

    fn subscribe(&mut self, config: &MetricConfig) -> Result<Subscription, FeedError> {
        let (tx, rx) = mpsc::channel(64);
        let task_seed: u64 = self.rng.gen();
        let target = config.target;
        let variation = config.variation;
        let cadence = config.interval;

        let task = tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(task_seed);
            let mut interval = tokio::time::interval(cadence);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick of a tokio interval fires immediately; skip it so
            // the feed honours the cadence from the start.
            interval.tick().await;

            let mut last = target;
            let mut tick: u64 = 0;
            loop {
                interval.tick().await;
                tick += 1;

                let phase = tick as f64 * cadence.as_secs_f64() / LIVE_CARRIER_SECS;
                let trend = phase.sin() * variation * LIVE_TREND;
                let noise = (rng.gen::<f64>() - 0.5) * variation * LIVE_NOISE;
                let momentum = (last - target) * LIVE_MOMENTUM;
                let value = Self::round2(target + trend + noise + momentum);
                last = value;

                if tx.send(Sample::synthetic(value, Utc::now())).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, task))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MetricCatalog;
    use std::time::Duration;

    fn voltage() -> MetricConfig {
        MetricCatalog::builtin().get("voltage").unwrap().clone()
    }

    #[test]
    fn test_backfill_length_per_range() {
        let mut source = SimulatedSource::with_seed(42);
        let config = voltage();
        for range in TimeRange::ALL {
            let samples = source.backfill(&config, range).unwrap();
            assert_eq!(samples.len(), range.points());
        }
    }

    #[test]
    fn test_backfill_is_deterministic_for_a_seed() {
        let config = voltage();
        let a = SimulatedSource::with_seed(7).backfill(&config, TimeRange::M15).unwrap();
        let b = SimulatedSource::with_seed(7).backfill(&config, TimeRange::M15).unwrap();
        let values_a: Vec<f64> = a.iter().map(|s| s.value).collect();
        let values_b: Vec<f64> = b.iter().map(|s| s.value).collect();
        assert_eq!(values_a, values_b);

        let c = SimulatedSource::with_seed(8).backfill(&config, TimeRange::M15).unwrap();
        let values_c: Vec<f64> = c.iter().map(|s| s.value).collect();
        assert_ne!(values_a, values_c);
    }

    #[test]
    fn test_backfill_stays_in_variation_band() {
        // Sanity bound on the generator, not exact values.
        let config = voltage();
        let samples = SimulatedSource::with_seed(1).backfill(&config, TimeRange::M15).unwrap();
        let lo = config.target - config.variation * 1.5;
        let hi = config.target + config.variation * 1.5;
        for sample in &samples {
            assert!(
                sample.value >= lo && sample.value <= hi,
                "value {} outside [{}, {}]",
                sample.value,
                lo,
                hi
            );
            assert!(sample.synthetic);
        }
    }

    #[test]
    fn test_backfill_timestamps_ascend_and_end_now() {
        let config = voltage();
        let samples = SimulatedSource::with_seed(3).backfill(&config, TimeRange::H1).unwrap();
        for pair in samples.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        let age = Utc::now() - samples.last().unwrap().timestamp;
        assert!(age < chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_subscription_delivers_at_cadence() {
        let mut config = voltage();
        config.interval = Duration::from_millis(5);
        let mut source = SimulatedSource::with_seed(9);
        let mut sub = source.subscribe(&config).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut count = 0;
        while let Ok(Some(sample)) = sub.poll() {
            assert!(sample.synthetic);
            count += 1;
        }
        assert!(count >= 5, "expected several ticks, got {}", count);
    }

    #[tokio::test]
    async fn test_subscriptions_are_independent() {
        let mut config = voltage();
        config.interval = Duration::from_millis(5);
        let mut source = SimulatedSource::with_seed(9);
        let mut kept = source.subscribe(&config).unwrap();
        let dropped = source.subscribe(&config).unwrap();

        // Cancelling one subscription must not touch the other.
        drop(dropped);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(kept.poll(), Ok(Some(_))));
    }
}
