//! Metric catalog and time-range definitions.
//!
//! The catalog is a read-only lookup table describing each sensor channel:
//! its nominal target, expected variation band, display unit, and sample
//! cadence. It is built once at startup (defaults, optionally layered with
//! a config file) and never mutated afterwards.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::FeedError;

/// Static configuration for one telemetry metric.
#[derive(Debug, Clone)]
pub struct MetricConfig {
    /// Catalog key (e.g. "voltage").
    pub key: String,
    /// Human-readable label for headers and selectors.
    pub label: String,
    /// Display unit (e.g. "kV").
    pub unit: String,
    /// Nominal target the signal reverts toward.
    pub target: f64,
    /// Expected variation band around the target.
    pub variation: f64,
    /// Live sample cadence.
    pub interval: Duration,
}

/// Selectable history span; fixes the window capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    M15,
    H1,
    H6,
    H24,
}

impl TimeRange {
    /// All ranges in selector order.
    pub const ALL: [TimeRange; 4] = [TimeRange::M15, TimeRange::H1, TimeRange::H6, TimeRange::H24];

    /// Number of backfill points (and window capacity) for this range.
    pub fn points(&self) -> usize {
        match self {
            TimeRange::M15 => 90,
            TimeRange::H1 => 120,
            TimeRange::H6 => 144,
            TimeRange::H24 => 288,
        }
    }

    /// Total span covered by the backfill.
    pub fn span(&self) -> Duration {
        match self {
            TimeRange::M15 => Duration::from_secs(15 * 60),
            TimeRange::H1 => Duration::from_secs(60 * 60),
            TimeRange::H6 => Duration::from_secs(6 * 60 * 60),
            TimeRange::H24 => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Selector label.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::M15 => "15m",
            TimeRange::H1 => "1h",
            TimeRange::H6 => "6h",
            TimeRange::H24 => "24h",
        }
    }

    /// Cycle to the next range.
    pub fn next(self) -> Self {
        match self {
            TimeRange::M15 => TimeRange::H1,
            TimeRange::H1 => TimeRange::H6,
            TimeRange::H6 => TimeRange::H24,
            TimeRange::H24 => TimeRange::M15,
        }
    }

    /// Cycle to the previous range.
    pub fn prev(self) -> Self {
        match self {
            TimeRange::M15 => TimeRange::H24,
            TimeRange::H1 => TimeRange::M15,
            TimeRange::H6 => TimeRange::H1,
            TimeRange::H24 => TimeRange::H6,
        }
    }

    /// Parse a selector label like "15m" or "24h".
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "15m" => Ok(TimeRange::M15),
            "1h" => Ok(TimeRange::H1),
            "6h" => Ok(TimeRange::H6),
            "24h" => Ok(TimeRange::H24),
            other => anyhow::bail!("unknown time range: {} (expected 15m, 1h, 6h or 24h)", other),
        }
    }
}

/// Override block for one metric as it appears in a config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricOverride {
    pub label: Option<String>,
    pub unit: Option<String>,
    pub target: Option<f64>,
    pub variation: Option<f64>,
    pub interval_ms: Option<u64>,
}

/// Read-only lookup table of metric configurations.
///
/// Keyed by string so that a selection coming from the CLI or a config file
/// can genuinely miss, surfacing [`FeedError::UnknownMetric`] instead of
/// silently defaulting.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    entries: Vec<MetricConfig>,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MetricCatalog {
    /// The four built-in substation channels.
    pub fn builtin() -> Self {
        let entries = vec![
            MetricConfig {
                key: "voltage".into(),
                label: "Voltage".into(),
                unit: "kV".into(),
                target: 230.0,
                variation: 8.0,
                interval: Duration::from_millis(500),
            },
            MetricConfig {
                key: "current".into(),
                label: "Current".into(),
                unit: "A".into(),
                target: 150.0,
                variation: 25.0,
                interval: Duration::from_millis(400),
            },
            MetricConfig {
                key: "temperature".into(),
                label: "Temperature".into(),
                unit: "°C".into(),
                target: 45.0,
                variation: 12.0,
                interval: Duration::from_millis(800),
            },
            MetricConfig {
                key: "frequency".into(),
                label: "Frequency".into(),
                unit: "Hz".into(),
                target: 50.0,
                variation: 0.2,
                interval: Duration::from_millis(600),
            },
        ];
        Self { entries }
    }

    /// Load the catalog with overrides from an optional TOML config file.
    ///
    /// File entries layer on top of the built-ins; a `[metrics.<key>]` table
    /// for a key not in the catalog adds a new metric (all fields required
    /// in that case except `label`, which falls back to the key).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let mut catalog = Self::builtin();
        let Some(path) = path else {
            return Ok(catalog);
        };

        #[derive(Debug, Deserialize)]
        struct FileMetrics {
            #[serde(default)]
            metrics: std::collections::BTreeMap<String, MetricOverride>,
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let file: FileMetrics = settings
            .try_deserialize()
            .with_context(|| format!("invalid metric overrides in {}", path.display()))?;

        for (key, over) in file.metrics {
            catalog.apply_override(&key, over)?;
        }
        Ok(catalog)
    }

    fn apply_override(&mut self, key: &str, over: MetricOverride) -> Result<()> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            if let Some(label) = over.label {
                entry.label = label;
            }
            if let Some(unit) = over.unit {
                entry.unit = unit;
            }
            if let Some(target) = over.target {
                entry.target = target;
            }
            if let Some(variation) = over.variation {
                entry.variation = variation;
            }
            if let Some(ms) = over.interval_ms {
                entry.interval = Duration::from_millis(ms);
            }
            return Ok(());
        }

        // New metric: needs the numeric fields to be meaningful.
        let (Some(target), Some(variation)) = (over.target, over.variation) else {
            anyhow::bail!("metric '{}' is not built in; overrides must set target and variation", key);
        };
        self.entries.push(MetricConfig {
            key: key.to_string(),
            label: over.label.unwrap_or_else(|| key.to_string()),
            unit: over.unit.unwrap_or_default(),
            target,
            variation,
            interval: Duration::from_millis(over.interval_ms.unwrap_or(500)),
        });
        Ok(())
    }

    /// Look up a metric by key.
    pub fn get(&self, key: &str) -> Result<&MetricConfig, FeedError> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| FeedError::UnknownMetric(key.to_string()))
    }

    /// All metrics in selector order.
    pub fn entries(&self) -> &[MetricConfig] {
        &self.entries
    }

    /// Metric at a selector position (keys 1..N in the TUI).
    pub fn at(&self, index: usize) -> Option<&MetricConfig> {
        self.entries.get(index)
    }

    /// Selector position of a key, if present.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
