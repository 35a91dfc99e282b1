//! Sample source abstraction for telemetry feeds.
//!
//! This module provides a trait-based abstraction over where readings come
//! from - a simulated generator, an in-process channel fed by an external
//! collector, or anything else that can backfill history and stream live
//! samples.

mod channel;
mod simulated;

pub use channel::{ChannelFeed, ChannelSource};
pub use simulated::SimulatedSource;

use std::fmt::Debug;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::data::{MetricConfig, Sample, TimeRange};
use crate::error::FeedError;

/// Trait for producing telemetry samples for a named metric.
///
/// Implementations provide two operations: a bounded historical backfill to
/// initialize a window, and a live subscription delivering samples at the
/// metric's cadence until cancelled.
///
/// # Example
///
/// ```
/// use gridwatch::{MetricCatalog, SampleSource, SimulatedSource, TimeRange};
///
/// let catalog = MetricCatalog::builtin();
/// let mut source = SimulatedSource::with_seed(42);
/// let samples = source
///     .backfill(catalog.get("voltage").unwrap(), TimeRange::H1)
///     .unwrap();
/// assert_eq!(samples.len(), 120);
/// ```
///
/// Live feeds need a tokio runtime for the producer task:
///
/// ```
/// use gridwatch::{MetricCatalog, SampleSource, SimulatedSource};
///
/// let catalog = MetricCatalog::builtin();
/// let mut source = SimulatedSource::with_seed(42);
///
/// # tokio_test::block_on(async {
/// let sub = source.subscribe(catalog.get("voltage").unwrap()).unwrap();
/// // ... poll `sub` from your event loop; dropping it cancels the feed
/// # });
/// ```
pub trait SampleSource: Send + Debug {
    /// Produce the historical series for a metric over a time range.
    ///
    /// The returned sequence is chronologically ordered and ends at the
    /// present. Length is at most the range's point count (exactly that
    /// for generated sources; push-only feeds may have less history).
    fn backfill(
        &mut self,
        config: &MetricConfig,
        range: TimeRange,
    ) -> Result<Vec<Sample>, FeedError>;

    /// Start a live feed for a metric.
    ///
    /// Samples arrive through the returned [`Subscription`] at the metric's
    /// cadence until the subscription is dropped. Callers must hold at most
    /// one subscription at a time per controller; starting a new one only
    /// after the old handle is dropped.
    fn subscribe(&mut self, config: &MetricConfig) -> Result<Subscription, FeedError>;

    /// Human-readable description of the source, for the status bar.
    fn description(&self) -> &str;
}

/// Owned handle to a live sample feed.
///
/// Bundles the receiving end of the feed with the producer task driving it.
/// Dropping the subscription aborts the task, so a stale producer can never
/// outlive the window it was feeding.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<Sample>,
    task: Option<JoinHandle<()>>,
    disconnected: bool,
}

impl Subscription {
    /// Wrap a receiver and its producing task.
    pub fn new(receiver: mpsc::Receiver<Sample>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task: Some(task),
            disconnected: false,
        }
    }

    /// Wrap a receiver whose producer lives outside this process's control
    /// (e.g. an external feed handle).
    pub fn external(receiver: mpsc::Receiver<Sample>) -> Self {
        Self {
            receiver,
            task: None,
            disconnected: false,
        }
    }

    /// Non-blocking poll for the next sample.
    ///
    /// Returns `Ok(Some)` when a sample is ready, `Ok(None)` when the feed
    /// is idle, and `Err(SourceUnavailable)` once the producer has gone
    /// away and all buffered samples have been drained.
    pub fn poll(&mut self) -> Result<Option<Sample>, FeedError> {
        match self.receiver.try_recv() {
            Ok(sample) => Ok(Some(sample)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.disconnected = true;
                Err(FeedError::SourceUnavailable("live feed ended".into()))
            }
        }
    }

    /// Whether the producer has been observed to be gone.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Cancel the subscription, aborting the producer task.
    ///
    /// Equivalent to dropping the handle; provided for call sites where the
    /// cancellation should read explicitly.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
