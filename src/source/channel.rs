//! Channel-based sample source.
//!
//! Receives samples pushed by an external collector through a broadcast
//! channel. This is the integration point for real feeds: whatever owns the
//! actual transport (poll, push, hardware gateway) holds a [`ChannelFeed`]
//! and pushes readings through it.

use std::sync::{Arc, Weak};

use tokio::sync::{broadcast, mpsc};

use super::{SampleSource, Subscription};
use crate::data::{MetricConfig, Sample, TimeRange};
use crate::error::FeedError;

/// Producer handle for pushing samples into a [`ChannelSource`].
///
/// Dropping the feed closes the channel; active subscriptions observe the
/// disconnect and the controller transitions to its offline state.
#[derive(Debug, Clone)]
pub struct ChannelFeed {
    sender: Arc<broadcast::Sender<Sample>>,
}

impl ChannelFeed {
    /// Push a sample to all active subscriptions.
    ///
    /// Returns false when no subscription is currently listening (the
    /// sample is dropped, which is fine - the controller backfills on
    /// reconnect).
    pub fn send(&self, sample: Sample) -> bool {
        self.sender.send(sample).is_ok()
    }
}

/// A sample source backed by an externally driven channel.
///
/// # Example
///
/// ```
/// use gridwatch::ChannelSource;
///
/// let (feed, source) = ChannelSource::create("scada-gw-01");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    sender: Weak<broadcast::Sender<Sample>>,
    history: Vec<Sample>,
    description: String,
}

impl ChannelSource {
    /// Create a feed/source pair with no pre-existing history.
    pub fn create(feed_description: &str) -> (ChannelFeed, Self) {
        Self::create_with_history(feed_description, Vec::new())
    }

    /// Create a feed/source pair seeded with historical samples.
    ///
    /// The history is what `backfill` serves; push-only transports that
    /// cannot replay the past simply pass an empty vector and the window
    /// fills from live samples alone.
    pub fn create_with_history(feed_description: &str, history: Vec<Sample>) -> (ChannelFeed, Self) {
        let (tx, _) = broadcast::channel(256);
        let sender = Arc::new(tx);
        let source = Self {
            sender: Arc::downgrade(&sender),
            history,
            description: format!("channel: {}", feed_description),
        };
        (ChannelFeed { sender }, source)
    }
}

impl SampleSource for ChannelSource {
    fn backfill(
        &mut self,
        _config: &MetricConfig,
        range: TimeRange,
    ) -> Result<Vec<Sample>, FeedError> {
        if self.sender.strong_count() == 0 {
            return Err(FeedError::SourceUnavailable("feed has gone away".into()));
        }
        let points = range.points();
        let skip = self.history.len().saturating_sub(points);
        Ok(self.history[skip..].to_vec())
    }

    fn subscribe(&mut self, _config: &MetricConfig) -> Result<Subscription, FeedError> {
        let Some(sender) = self.sender.upgrade() else {
            return Err(FeedError::SourceUnavailable("feed has gone away".into()));
        };
        let mut feed_rx = sender.subscribe();
        drop(sender);

        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            loop {
                match feed_rx.recv().await {
                    Ok(sample) => {
                        if tx.send(sample).await.is_err() {
                            break;
                        }
                    }
                    // Slow consumer: skip the lagged span, keep streaming.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
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
    use chrono::Utc;
    use std::time::Duration;

    fn voltage() -> MetricConfig {
        MetricCatalog::builtin().get("voltage").unwrap().clone()
    }

    #[tokio::test]
    async fn test_channel_source_forwards_in_order() {
        let (feed, mut source) = ChannelSource::create("test");
        let mut sub = source.subscribe(&voltage()).unwrap();

        for v in [1.0, 2.0, 3.0] {
            feed.send(Sample::new(v, Utc::now()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut values = Vec::new();
        while let Ok(Some(sample)) = sub.poll() {
            values.push(sample.value);
        }
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_dropping_feed_disconnects_subscription() {
        let (feed, mut source) = ChannelSource::create("test");
        let mut sub = source.subscribe(&voltage()).unwrap();

        feed.send(Sample::new(1.0, Utc::now()));
        drop(feed);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Buffered sample still drains, then the disconnect surfaces.
        assert!(matches!(sub.poll(), Ok(Some(_))));
        assert!(matches!(
            sub.poll(),
            Err(FeedError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_after_feed_dropped_fails() {
        let (feed, mut source) = ChannelSource::create("test");
        drop(feed);
        assert!(matches!(
            source.subscribe(&voltage()),
            Err(FeedError::SourceUnavailable(_))
        ));
        assert!(matches!(
            source.backfill(&voltage(), TimeRange::M15),
            Err(FeedError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_backfill_serves_trailing_history() {
        let history: Vec<Sample> =
            (0..200).map(|i| Sample::new(i as f64, Utc::now())).collect();
        let (_feed, mut source) = ChannelSource::create_with_history("test", history);

        let samples = source.backfill(&voltage(), TimeRange::M15).unwrap();
        assert_eq!(samples.len(), 90);
        assert_eq!(samples.first().unwrap().value, 110.0);
        assert_eq!(samples.last().unwrap().value, 199.0);
    }

    #[tokio::test]
    async fn test_send_without_subscribers_reports_dropped() {
        let (feed, _source) = ChannelSource::create("test");
        assert!(!feed.send(Sample::new(1.0, Utc::now())));
    }
}
