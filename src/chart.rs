//! Renderer-agnostic chart frame.
//!
//! A [`RenderFrame`] is a pure function of the current window snapshot, the
//! metric configuration, and the frame dimensions: a list of drawing
//! primitives (smoothed path, fill polygon, reference line, marker) plus the
//! summary numbers the surrounding view displays. Any 2-D surface can
//! consume it; the ratatui adapter in [`crate::ui::chart`] is one such
//! consumer.

use crate::data::{MetricConfig, Sample};
use crate::error::FeedError;

/// Fraction of the frame height used by the plot band.
const PLOT_BAND: f64 = 0.8;
/// Margin above and below the plot band.
const PLOT_MARGIN: f64 = 0.1;

/// A position in frame space (origin bottom-left, y pointing up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One step of the chart path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    /// Cubic bezier to `to` via two control points.
    CubicTo {
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
}

/// Overall direction of the windowed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
}

/// Two-stop color gradient, RGB per stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gradient {
    pub start: (u8, u8, u8),
    pub end: (u8, u8, u8),
}

impl Gradient {
    const GREEN: Gradient = Gradient {
        start: (0x10, 0xB9, 0x81),
        end: (0x34, 0xD3, 0x99),
    };
    const RED: Gradient = Gradient {
        start: (0xEF, 0x44, 0x44),
        end: (0xF8, 0x71, 0x71),
    };

    /// Linear interpolation between the two stops at `t` in [0,1].
    pub fn color_at(&self, t: f64) -> (u8, u8, u8) {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        (
            lerp(self.start.0, self.end.0),
            lerp(self.start.1, self.end.1),
            lerp(self.start.2, self.end.2),
        )
    }
}

/// A complete drawable chart frame plus its summary values.
///
/// Ephemeral: rebuilt on every redraw, never persisted.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub width: f64,
    pub height: f64,
    /// Smoothed curve through all plotted points.
    pub path: Vec<PathSegment>,
    /// Plot-space position of each sample, chronological.
    pub points: Vec<Point>,
    /// Closed polygon for the area beneath the curve.
    pub fill: Vec<Point>,
    /// Height of the horizontal reference line at the metric's target.
    pub target_y: f64,
    /// Highlighted marker at the most recent point.
    pub marker: Point,
    pub min_value: f64,
    pub max_value: f64,
    pub latest: f64,
    pub trend: Trend,
    pub gradient: Gradient,
}

impl RenderFrame {
    /// Build a frame from a chronological snapshot.
    ///
    /// Fails with [`FeedError::EmptyWindow`] when there is nothing to plot;
    /// callers render a loading placeholder instead.
    pub fn build<'a>(
        snapshot: impl Iterator<Item = &'a Sample>,
        config: &MetricConfig,
        width: f64,
        height: f64,
    ) -> Result<Self, FeedError> {
        let values: Vec<f64> = snapshot.map(|s| s.value).collect();
        if values.is_empty() {
            return Err(FeedError::EmptyWindow);
        }

        let min_value = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max_value = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Degenerate span (all values equal) falls back to 1.0 so the
        // mapping below never divides by zero.
        let span = if max_value > min_value {
            max_value - min_value
        } else {
            1.0
        };

        let plot_y =
            |v: f64| height * (PLOT_MARGIN + PLOT_BAND * ((v - min_value) / span));

        let count = values.len();
        let points: Vec<Point> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = if count > 1 {
                    i as f64 / (count - 1) as f64 * width
                } else {
                    0.0
                };
                Point { x, y: plot_y(v) }
            })
            .collect();

        // Smooth the curve with piecewise cubics: both control points sit
        // at the horizontal midpoint between neighbours, each at its
        // endpoint's height. Avoids the jagged look of a raw polyline.
        let mut path = Vec::with_capacity(count);
        path.push(PathSegment::MoveTo(points[0]));
        for pair in points.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let mid_x = (prev.x + cur.x) / 2.0;
            path.push(PathSegment::CubicTo {
                ctrl1: Point { x: mid_x, y: prev.y },
                ctrl2: Point { x: mid_x, y: cur.y },
                to: cur,
            });
        }

        let first = values[0];
        let latest = values[count - 1];
        let trend = if latest > first {
            Trend::Rising
        } else {
            Trend::Falling
        };
        let gradient = match trend {
            Trend::Rising => Gradient::GREEN,
            Trend::Falling => Gradient::RED,
        };

        let mut fill = points.clone();
        fill.push(Point {
            x: points[count - 1].x,
            y: 0.0,
        });
        fill.push(Point { x: points[0].x, y: 0.0 });

        Ok(Self {
            width,
            height,
            path,
            marker: points[count - 1],
            fill,
            target_y: plot_y(config.target).clamp(0.0, height),
            points,
            min_value,
            max_value,
            latest,
            trend,
            gradient,
        })
    }

    /// Flatten the cubic path into a polyline with `steps` subdivisions per
    /// segment. Used by rasterizing backends.
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut out = Vec::new();
        let mut cursor = None;

        for segment in &self.path {
            match *segment {
                PathSegment::MoveTo(p) => {
                    out.push(p);
                    cursor = Some(p);
                }
                PathSegment::CubicTo { ctrl1, ctrl2, to } => {
                    let from = cursor.unwrap_or(to);
                    for step in 1..=steps {
                        let t = step as f64 / steps as f64;
                        out.push(cubic_at(from, ctrl1, ctrl2, to, t));
                    }
                    cursor = Some(to);
                }
            }
        }
        out
    }
}

fn cubic_at(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point {
        x: b0 * p0.x + b1 * c1.x + b2 * c2.x + b3 * p3.x,
        y: b0 * p0.y + b1 * c1.y + b2 * c2.y + b3 * p3.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MetricCatalog;
    use chrono::Utc;

    fn voltage() -> MetricConfig {
        MetricCatalog::builtin().get("voltage").unwrap().clone()
    }

    fn samples(values: &[f64]) -> Vec<Sample> {
        values.iter().map(|&v| Sample::new(v, Utc::now())).collect()
    }

    fn build(values: &[f64]) -> RenderFrame {
        RenderFrame::build(samples(values).iter(), &voltage(), 100.0, 100.0).unwrap()
    }

    #[test]
    fn test_empty_snapshot_is_an_error() {
        let empty: Vec<Sample> = Vec::new();
        let result = RenderFrame::build(empty.iter(), &voltage(), 100.0, 100.0);
        assert!(matches!(result, Err(FeedError::EmptyWindow)));
    }

    #[test]
    fn test_points_respect_margins() {
        let frame = build(&[0.0, 100.0]);
        // Min maps to the bottom margin, max to the top of the band.
        assert!((frame.points[0].y - 10.0).abs() < 1e-9);
        assert!((frame.points[1].y - 90.0).abs() < 1e-9);
        assert!((frame.points[0].x - 0.0).abs() < 1e-9);
        assert!((frame.points[1].x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_falls_back_to_unit_span() {
        let frame = build(&[50.0, 50.0, 50.0]);
        // span=1.0, all values at the bottom of the band; no NaN anywhere.
        for p in &frame.points {
            assert!((p.y - 10.0).abs() < 1e-9);
        }
        assert_eq!(frame.min_value, 50.0);
        assert_eq!(frame.max_value, 50.0);
    }

    #[test]
    fn test_path_is_one_cubic_per_gap() {
        let frame = build(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frame.path.len(), 4); // MoveTo + 3 cubics
        assert!(matches!(frame.path[0], PathSegment::MoveTo(_)));
        let cubics = frame.path.iter().filter(|s| matches!(s, PathSegment::CubicTo { .. })).count();
        assert_eq!(cubics, 3);
    }

    #[test]
    fn test_control_points_sit_on_midpoints() {
        let frame = build(&[0.0, 100.0]);
        let PathSegment::CubicTo { ctrl1, ctrl2, to } = frame.path[1] else {
            panic!("expected cubic");
        };
        assert!((ctrl1.x - 50.0).abs() < 1e-9);
        assert!((ctrl2.x - 50.0).abs() < 1e-9);
        assert!((ctrl1.y - frame.points[0].y).abs() < 1e-9);
        assert!((ctrl2.y - to.y).abs() < 1e-9);
    }

    #[test]
    fn test_trend_picks_gradient() {
        assert_eq!(build(&[1.0, 2.0]).trend, Trend::Rising);
        assert_eq!(build(&[2.0, 1.0]).trend, Trend::Falling);
        // Flat counts as falling (red).
        assert_eq!(build(&[2.0, 2.0]).trend, Trend::Falling);
    }

    #[test]
    fn test_marker_is_latest_point() {
        let frame = build(&[1.0, 2.0, 3.0]);
        assert_eq!(frame.marker, *frame.points.last().unwrap());
        assert_eq!(frame.latest, 3.0);
    }

    #[test]
    fn test_target_line_maps_and_clamps() {
        // Target 230 inside [220, 240]: halfway up the band.
        let frame = build(&[220.0, 240.0]);
        assert!((frame.target_y - 50.0).abs() < 1e-9);

        // Series far above the target: reference line clamps to the frame.
        let frame = build(&[500.0, 510.0]);
        assert_eq!(frame.target_y, 0.0);
    }

    #[test]
    fn test_fill_closes_to_baseline() {
        let frame = build(&[1.0, 2.0, 3.0]);
        let n = frame.fill.len();
        assert_eq!(n, frame.points.len() + 2);
        assert_eq!(frame.fill[n - 2].y, 0.0);
        assert_eq!(frame.fill[n - 1].y, 0.0);
        assert_eq!(frame.fill[n - 1].x, frame.points[0].x);
    }

    #[test]
    fn test_single_point_frame() {
        let frame = build(&[42.0]);
        assert_eq!(frame.points.len(), 1);
        assert_eq!(frame.path.len(), 1);
        assert_eq!(frame.marker, frame.points[0]);
    }

    #[test]
    fn test_flatten_interpolates_endpoints() {
        let frame = build(&[0.0, 100.0]);
        let polyline = frame.flatten(8);
        assert_eq!(polyline.len(), 9); // MoveTo + 8 steps
        let last = polyline.last().unwrap();
        assert!((last.x - frame.points[1].x).abs() < 1e-9);
        assert!((last.y - frame.points[1].y).abs() < 1e-9);
    }

    #[test]
    fn test_gradient_interpolation() {
        let g = Gradient {
            start: (0, 0, 0),
            end: (100, 200, 50),
        };
        assert_eq!(g.color_at(0.0), (0, 0, 0));
        assert_eq!(g.color_at(1.0), (100, 200, 50));
        assert_eq!(g.color_at(0.5), (50, 100, 25));
    }
}
