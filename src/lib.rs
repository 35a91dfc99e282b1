// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # gridwatch
//!
//! A diagnostic TUI and library for streaming substation telemetry.
//!
//! This crate ingests live sensor readings for a selected metric, keeps a
//! bounded rolling history, flags volatility anomalies over that history,
//! and draws a continuously updating trend chart in the terminal.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Application                           │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐ │
//! │  │  app    │───▶│   data   │───▶│  chart  │───▶│ ui/      │ │
//! │  │ (state) │    │ (window, │    │ (frame) │    │ Terminal │ │
//! │  └────┬────┘    │  scorer) │    └─────────┘    └──────────┘ │
//! │       │         └──────────┘                                 │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── SimulatedSource | ChannelSource             │
//! │  │ (feed)  │                                                 │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: The stream controller - connection state machine,
//!   metric/range switching, live/paused toggling, export
//! - **[`source`]**: Sample source abstraction ([`SampleSource`] trait) with
//!   a seeded synthetic generator and a channel source for external feeds
//! - **[`data`]**: Metric catalog, the immutable [`Sample`], the
//!   fixed-capacity [`RollingWindow`], and the [`AnomalyScorer`]
//! - **[`chart`]**: Renderer-agnostic [`RenderFrame`] (smoothed path, fill,
//!   reference line, marker) built from the current window
//! - **[`ui`]**: Terminal rendering using ratatui - chart canvas, header,
//!   selector, theme support
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch simulated voltage over the last hour
//! gridwatch --metric voltage --range 1h
//!
//! # Deterministic stream for demos
//! gridwatch --metric frequency --seed 42
//! ```
//!
//! ### As a library with the simulated source
//!
//! ```
//! use gridwatch::{
//!     AnomalyScorer, App, MetricCatalog, ScorerConfig, SimulatedSource, TimeRange,
//! };
//!
//! let source = Box::new(SimulatedSource::with_seed(42));
//! let app = App::new(
//!     source,
//!     MetricCatalog::builtin(),
//!     AnomalyScorer::with_seed(ScorerConfig::default(), 42),
//!     "voltage",
//!     TimeRange::H1,
//!     true,
//! )
//! .unwrap();
//! ```
//!
//! ### As a library with a channel feed (external collector integration)
//!
//! ```
//! use gridwatch::ChannelSource;
//!
//! // Create a feed/source pair; push Samples through `feed` from your
//! // transport of choice.
//! let (feed, source) = ChannelSource::create("scada-gw-01");
//! ```

pub mod app;
pub mod chart;
pub mod data;
pub mod error;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, ConnectionState};
pub use chart::{Gradient, PathSegment, Point, RenderFrame, Trend};
pub use data::{
    AnomalyScorer, AnomalySignal, MetricCatalog, MetricConfig, RollingWindow, Sample,
    ScorerConfig, Severity, TimeRange,
};
pub use error::FeedError;
pub use source::{ChannelFeed, ChannelSource, SampleSource, SimulatedSource, Subscription};
