//! Error types for the telemetry feed.

use thiserror::Error;

/// Errors that can occur while ingesting or summarizing telemetry.
///
/// Every variant is terminal to the current configuration: nothing in this
/// crate retries automatically. `UnknownMetric` is rejected at selection
/// time, `EmptyWindow` is recovered locally by showing a placeholder, and
/// `SourceUnavailable` parks the controller in the `Disconnected` state
/// until the user explicitly retries.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Requested metric has no catalog entry.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// Statistics requested before any sample exists.
    #[error("window is empty")]
    EmptyWindow,

    /// Backfill or subscription setup failed.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}
