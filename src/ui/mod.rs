//! Terminal rendering using ratatui.
//!
//! - [`chart`]: the trend chart view consuming [`crate::chart::RenderFrame`]
//! - [`common`]: header, selector bar, status bar, and help overlay
//! - [`theme`]: light/dark themes with terminal auto-detection

pub mod chart;
pub mod common;
pub mod theme;

pub use theme::Theme;
