//! Data models and statistics for the telemetry stream.
//!
//! ## Submodules
//!
//! - [`metric`]: Metric catalog ([`MetricConfig`], [`MetricCatalog`]) and [`TimeRange`]
//! - [`sample`]: The immutable [`Sample`] reading
//! - [`window`]: Fixed-capacity [`RollingWindow`] FIFO buffer
//! - [`anomaly`]: Rolling-statistics [`AnomalyScorer`] and its [`AnomalySignal`]
//!
//! ## Data Flow
//!
//! ```text
//! SampleSource (backfill / live feed)
//!        │
//!        ▼
//! RollingWindow::append()
//!        │
//!        ├──▶ AnomalyScorer::evaluate()  (every eval_every samples)
//!        │
//!        └──▶ chart::RenderFrame::build() (every tick)
//! ```

pub mod anomaly;
pub mod metric;
pub mod sample;
pub mod window;

pub use anomaly::{AnomalyScorer, AnomalySignal, ScorerConfig, Severity};
pub use metric::{MetricCatalog, MetricConfig, TimeRange};
pub use sample::Sample;
pub use window::RollingWindow;
