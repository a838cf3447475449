//! Terminal output.
//!
//! - [`FlowTheme`] - console styles, plain under `NO_COLOR` / `--no-color`
//! - [`render_report`] - styled run summary

pub mod report;
pub mod theme;

pub use report::{render_outcome, render_report};
pub use theme::{should_use_colors, FlowTheme};
