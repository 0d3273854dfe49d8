//! Terminal output for the CLI.
//!
//! - [`PipegraphTheme`] for colors and icons
//! - [`Output`] gated by [`OutputMode`]
//! - [`ProgressPrinter`] rendering executor events

pub mod output;
pub mod progress;
pub mod theme;

pub use output::{Output, OutputMode};
pub use progress::{format_duration, format_summary, ProgressPrinter};
pub use theme::{should_use_colors, PipegraphTheme};
