//! Application state and stream orchestration.

use std::time::Instant;

use crate::data::{
    AnomalyScorer, AnomalySignal, MetricCatalog, MetricConfig, RollingWindow, TimeRange,
};
use crate::error::FeedError;
use crate::source::{SampleSource, Subscription};
use crate::ui::Theme;

/// Connection state of the stream controller.
///
/// ```text
/// Idle → Loading → Live ⇄ Paused
///          │  ▲
///          ▼  │ (explicit retry / reconfigure)
///      Disconnected
/// ```
///
/// Switching metric or time range from any state re-enters `Loading`.
/// `Disconnected` is only left through an explicit retry; nothing in the
/// controller retries automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No configuration selected yet; no timers active.
    Idle,
    /// Backfill in flight.
    Loading,
    /// Subscription active; samples streaming into the window.
    Live,
    /// Subscription cancelled; window retained as-is.
    Paused,
    /// Backfill or subscription failed; reason kept for display.
    Disconnected(String),
}

impl ConnectionState {
    /// Short status label.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "Idle",
            ConnectionState::Loading => "Loading",
            ConnectionState::Live => "Live",
            ConnectionState::Paused => "Paused",
            ConnectionState::Disconnected(_) => "Offline",
        }
    }
}

/// Main application state: one metric's stream controller plus UI flags.
///
/// Owns the rolling window, the scorer, and at most one live subscription.
/// All mutation happens on the main loop thread; live samples cross from
/// their producer task through the subscription's channel and are drained
/// here each tick, strictly in arrival order.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub theme: Theme,

    source: Box<dyn SampleSource>,
    catalog: MetricCatalog,
    metric_index: usize,
    range: TimeRange,
    live_requested: bool,

    state: ConnectionState,
    window: RollingWindow,
    scorer: AnomalyScorer,
    signal: Option<AnomalySignal>,
    samples_since_eval: usize,
    subscription: Option<Subscription>,

    status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a controller for the given metric key.
    ///
    /// Fails with [`FeedError::UnknownMetric`] if the key has no catalog
    /// entry. No I/O happens here; call [`App::connect`] to backfill and
    /// start streaming.
    pub fn new(
        source: Box<dyn SampleSource>,
        catalog: MetricCatalog,
        scorer: AnomalyScorer,
        metric: &str,
        range: TimeRange,
        live: bool,
    ) -> Result<Self, FeedError> {
        let metric_index = catalog
            .position(metric)
            .ok_or_else(|| FeedError::UnknownMetric(metric.to_string()))?;
        Ok(Self {
            running: true,
            show_help: false,
            theme: Theme::auto_detect(),
            source,
            catalog,
            metric_index,
            range,
            live_requested: live,
            state: ConnectionState::Idle,
            window: RollingWindow::new(range.points()),
            scorer,
            signal: None,
            samples_since_eval: 0,
            subscription: None,
            status_message: None,
        })
    }

    /// Currently selected metric configuration.
    pub fn metric(&self) -> &MetricConfig {
        // Index is validated on every selection change.
        &self.catalog.entries()[self.metric_index]
    }

    pub fn metric_index(&self) -> usize {
        self.metric_index
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn signal(&self) -> Option<&AnomalySignal> {
        self.signal.as_ref()
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// (Re)connect the current configuration: cancel any subscription,
    /// clear the window, backfill, score once, then resume streaming if
    /// live mode is requested.
    pub fn connect(&mut self) {
        // Dropping the handle aborts the producer task before the window
        // is replaced; a stale callback can never land in the new window.
        self.subscription = None;
        self.window = RollingWindow::new(self.range.points());
        self.signal = None;
        self.samples_since_eval = 0;
        self.state = ConnectionState::Loading;

        let config = self.metric().clone();
        match self.source.backfill(&config, self.range) {
            Ok(samples) => {
                for sample in samples {
                    self.window.append(sample);
                }
                self.signal = Some(self.scorer.evaluate(&self.window));
                if self.live_requested {
                    self.start_subscription(&config);
                } else {
                    self.state = ConnectionState::Paused;
                }
            }
            Err(err) => {
                tracing::warn!(metric = %config.key, error = %err, "backfill failed");
                self.state = ConnectionState::Disconnected(err.to_string());
            }
        }
    }

    fn start_subscription(&mut self, config: &MetricConfig) {
        // Idempotent re-subscription: the old producer is cancelled first.
        self.subscription = None;
        match self.source.subscribe(config) {
            Ok(sub) => {
                self.subscription = Some(sub);
                self.state = ConnectionState::Live;
            }
            Err(err) => {
                tracing::warn!(metric = %config.key, error = %err, "subscribe failed");
                self.state = ConnectionState::Disconnected(err.to_string());
            }
        }
    }

    /// Select a metric by selector position (keys 1..N).
    pub fn select_metric(&mut self, index: usize) {
        if index < self.catalog.len() && index != self.metric_index {
            self.metric_index = index;
            self.connect();
        }
    }

    /// Select a metric by catalog key.
    pub fn select_metric_key(&mut self, key: &str) -> Result<(), FeedError> {
        let index = self
            .catalog
            .position(key)
            .ok_or_else(|| FeedError::UnknownMetric(key.to_string()))?;
        self.select_metric(index);
        Ok(())
    }

    /// Switch to a new time range, resizing the window and backfilling.
    pub fn set_range(&mut self, range: TimeRange) {
        if range != self.range {
            self.range = range;
            self.connect();
        }
    }

    pub fn next_range(&mut self) {
        self.set_range(self.range.next());
    }

    pub fn prev_range(&mut self) {
        self.set_range(self.range.prev());
    }

    /// Toggle between live streaming and paused.
    ///
    /// Pausing cancels the subscription but keeps the window; resuming
    /// issues a fresh subscription against the retained window.
    pub fn toggle_live(&mut self) {
        match self.state {
            ConnectionState::Live => {
                self.subscription = None;
                self.live_requested = false;
                self.state = ConnectionState::Paused;
            }
            ConnectionState::Paused => {
                self.live_requested = true;
                let config = self.metric().clone();
                self.start_subscription(&config);
            }
            _ => {}
        }
    }

    /// Explicit user-triggered retry from the disconnected state.
    pub fn retry(&mut self) {
        if matches!(self.state, ConnectionState::Disconnected(_)) {
            self.connect();
        }
    }

    /// Drain pending live samples and re-score at the configured cadence.
    ///
    /// Called once per main-loop tick. Samples are appended in arrival
    /// order; the scorer re-evaluates after every `eval_every` appends.
    pub fn on_tick(&mut self) {
        if self.state != ConnectionState::Live {
            return;
        }
        let Some(sub) = self.subscription.as_mut() else {
            return;
        };

        let mut failure = None;
        loop {
            match sub.poll() {
                Ok(Some(sample)) => {
                    self.window.append(sample);
                    self.samples_since_eval += 1;
                    if self.samples_since_eval >= self.scorer.config().eval_every {
                        self.samples_since_eval = 0;
                        self.signal = Some(self.scorer.evaluate(&self.window));
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            tracing::warn!(error = %err, "live feed lost");
            self.subscription = None;
            self.state = ConnectionState::Disconnected(err.to_string());
        }
    }

    /// Value change between the two most recent samples: (delta, percent).
    pub fn change(&self) -> Option<(f64, f64)> {
        let last = self.window.last().ok()?.value;
        let prev = self.window.previous()?.value;
        let delta = last - prev;
        let percent = if prev != 0.0 { delta / prev * 100.0 } else { 0.0 };
        Some((delta, percent))
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < std::time::Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current window and signal to a JSON file.
    pub fn export_state(&self, path: &std::path::Path) -> anyhow::Result<()> {
        use std::io::Write;

        if self.window.is_empty() {
            anyhow::bail!("no samples to export");
        }

        let config = self.metric();
        let samples: Vec<serde_json::Value> = self
            .window
            .snapshot()
            .map(|s| {
                serde_json::json!({
                    "value": s.value,
                    "timestamp": s.timestamp.to_rfc3339(),
                    "synthetic": s.synthetic,
                })
            })
            .collect();

        let export = serde_json::json!({
            "metric": config.key,
            "unit": config.unit,
            "range": self.range.label(),
            "target": config.target,
            "min": self.window.min().ok(),
            "max": self.window.max().ok(),
            "signal": self.signal,
            "samples": samples,
        });

        let json = serde_json::to_string_pretty(&export)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Sample, ScorerConfig};
    use crate::source::{ChannelSource, SimulatedSource};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Source that records backfill requests and counts live producers.
    #[derive(Debug)]
    struct MockSource {
        backfills: Arc<Mutex<Vec<(String, TimeRange)>>>,
        active_producers: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                backfills: Arc::new(Mutex::new(Vec::new())),
                active_producers: Arc::new(AtomicUsize::new(0)),
                fail: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct ProducerGuard(Arc<AtomicUsize>);
    impl Drop for ProducerGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl SampleSource for MockSource {
        fn backfill(
            &mut self,
            config: &MetricConfig,
            range: TimeRange,
        ) -> Result<Vec<Sample>, FeedError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(FeedError::SourceUnavailable("mock outage".into()));
            }
            self.backfills.lock().unwrap().push((config.key.clone(), range));
            Ok((0..range.points())
                .map(|i| Sample::new(config.target + i as f64 * 0.001, Utc::now()))
                .collect())
        }

        fn subscribe(&mut self, _config: &MetricConfig) -> Result<Subscription, FeedError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(FeedError::SourceUnavailable("mock outage".into()));
            }
            let (tx, rx) = tokio::sync::mpsc::channel(4);
            self.active_producers.fetch_add(1, Ordering::SeqCst);
            let guard = ProducerGuard(self.active_producers.clone());
            let task = tokio::spawn(async move {
                let _guard = guard;
                // Idle producer: stays alive until aborted.
                let _tx = tx;
                std::future::pending::<()>().await;
            });
            Ok(Subscription::new(rx, task))
        }

        fn description(&self) -> &str {
            "mock"
        }
    }

    fn quiet_scorer() -> AnomalyScorer {
        AnomalyScorer::with_seed(
            ScorerConfig {
                false_positive_rate: 0.0,
                ..ScorerConfig::default()
            },
            5,
        )
    }

    fn mock_app(live: bool) -> (App, Arc<Mutex<Vec<(String, TimeRange)>>>, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let source = MockSource::new();
        let backfills = source.backfills.clone();
        let active = source.active_producers.clone();
        let fail = source.fail.clone();
        let app = App::new(
            Box::new(source),
            MetricCatalog::builtin(),
            quiet_scorer(),
            "voltage",
            TimeRange::H1,
            live,
        )
        .unwrap();
        (app, backfills, active, fail)
    }

    #[test]
    fn test_unknown_metric_rejected_at_construction() {
        let err = App::new(
            Box::new(SimulatedSource::with_seed(1)),
            MetricCatalog::builtin(),
            quiet_scorer(),
            "phase_angle",
            TimeRange::H1,
            true,
        )
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, FeedError::UnknownMetric(_)));
    }

    #[tokio::test]
    async fn test_connect_backfills_and_goes_live() {
        let (mut app, backfills, active, _) = mock_app(true);
        assert_eq!(*app.state(), ConnectionState::Idle);

        app.connect();
        assert_eq!(*app.state(), ConnectionState::Live);
        assert_eq!(app.window().len(), 120);
        assert!(app.signal().is_some());
        assert_eq!(backfills.lock().unwrap().len(), 1);
        assert_eq!(active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_range_switch_cancels_old_subscription() {
        let (mut app, backfills, active, _) = mock_app(true);
        app.connect();
        assert_eq!(active.load(Ordering::SeqCst), 1);

        app.set_range(TimeRange::H24);
        // Old producer aborted, new backfill of exactly 288 points issued.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(active.load(Ordering::SeqCst), 1);
        assert_eq!(app.window().len(), 288);
        assert_eq!(app.window().capacity(), 288);

        let calls = backfills.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], ("voltage".to_string(), TimeRange::H24));
    }

    #[tokio::test]
    async fn test_metric_switch_clears_window() {
        let (mut app, backfills, _, _) = mock_app(true);
        app.connect();
        let old_last = app.window().last().unwrap().value;

        app.select_metric_key("current").unwrap();
        assert_eq!(app.metric().key, "current");
        // Window rebuilt from the new metric's backfill, not carried over.
        assert_ne!(app.window().last().unwrap().value, old_last);
        assert_eq!(backfills.lock().unwrap()[1].0, "current");
    }

    #[tokio::test]
    async fn test_pause_retains_window_and_cancels_producer() {
        let (mut app, _, active, _) = mock_app(true);
        app.connect();
        let len_before = app.window().len();

        app.toggle_live();
        assert_eq!(*app.state(), ConnectionState::Paused);
        assert_eq!(app.window().len(), len_before);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(active.load(Ordering::SeqCst), 0);

        app.toggle_live();
        assert_eq!(*app.state(), ConnectionState::Live);
        assert_eq!(active.load(Ordering::SeqCst), 1);
        // Resume does not re-backfill; the retained window continues.
        assert_eq!(app.window().len(), len_before);
    }

    #[tokio::test]
    async fn test_disconnected_recovers_only_on_retry() {
        let (mut app, _, _, fail) = mock_app(true);
        fail.store(true, Ordering::SeqCst);
        app.connect();
        assert!(matches!(app.state(), ConnectionState::Disconnected(_)));
        assert_eq!(app.state().label(), "Offline");

        // Ticks do not retry by themselves.
        app.on_tick();
        assert!(matches!(app.state(), ConnectionState::Disconnected(_)));

        fail.store(false, Ordering::SeqCst);
        app.retry();
        assert_eq!(*app.state(), ConnectionState::Live);
    }

    #[tokio::test]
    async fn test_live_samples_append_and_rescore_on_cadence() {
        let (feed, source) = ChannelSource::create("test");
        let mut app = App::new(
            Box::new(source),
            MetricCatalog::builtin(),
            quiet_scorer(),
            "voltage",
            TimeRange::M15,
            true,
        )
        .unwrap();
        app.connect();
        assert_eq!(*app.state(), ConnectionState::Live);
        assert_eq!(app.window().len(), 0); // channel feeds carry no history

        let eval_every = app.scorer.config().eval_every;
        for i in 0..eval_every {
            feed.send(Sample::new(230.0 + i as f64, Utc::now()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.on_tick();

        assert_eq!(app.window().len(), eval_every);
        // Cadence reached: counter reset and a fresh signal computed.
        assert_eq!(app.samples_since_eval, 0);
        assert!(app.signal().is_some());

        feed.send(Sample::new(240.0, Utc::now()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.on_tick();
        assert_eq!(app.samples_since_eval, 1);
    }

    #[tokio::test]
    async fn test_feed_loss_goes_offline() {
        let (feed, source) = ChannelSource::create("test");
        let mut app = App::new(
            Box::new(source),
            MetricCatalog::builtin(),
            quiet_scorer(),
            "voltage",
            TimeRange::M15,
            true,
        )
        .unwrap();
        app.connect();

        feed.send(Sample::new(230.0, Utc::now()));
        drop(feed);
        tokio::time::sleep(Duration::from_millis(50)).await;

        app.on_tick();
        // Buffered sample was appended before the disconnect surfaced.
        assert_eq!(app.window().len(), 1);
        assert!(matches!(app.state(), ConnectionState::Disconnected(_)));
    }

    #[tokio::test]
    async fn test_export_writes_snapshot() {
        let (mut app, _, _, _) = mock_app(false);
        app.connect();
        assert_eq!(*app.state(), ConnectionState::Paused);

        let file = tempfile::NamedTempFile::new().unwrap();
        app.export_state(file.path()).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["metric"], "voltage");
        assert_eq!(doc["unit"], "kV");
        assert_eq!(doc["samples"].as_array().unwrap().len(), 120);
        assert!(doc["signal"]["severity"].is_string());
    }

    #[tokio::test]
    async fn test_change_reports_delta_and_percent() {
        let (feed, source) = ChannelSource::create("test");
        let mut app = App::new(
            Box::new(source),
            MetricCatalog::builtin(),
            quiet_scorer(),
            "voltage",
            TimeRange::M15,
            true,
        )
        .unwrap();
        app.connect();
        assert!(app.change().is_none());

        feed.send(Sample::new(200.0, Utc::now()));
        feed.send(Sample::new(210.0, Utc::now()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.on_tick();

        let (delta, percent) = app.change().unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
        assert!((percent - 5.0).abs() < 1e-9);
    }
}
