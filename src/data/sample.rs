//! A single timestamped telemetry reading.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One scalar reading for a metric.
///
/// Samples are immutable once created: sources produce them, the rolling
/// window stores them, and nothing mutates them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    /// True when the value came from the simulated generator rather than
    /// a real feed.
    pub synthetic: bool,
}

impl Sample {
    /// Create a reading stamped with the given time.
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            synthetic: false,
        }
    }

    /// Create a generator-produced reading.
    pub fn synthetic(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            synthetic: true,
        }
    }
}
