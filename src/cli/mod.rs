//! CLI output formatting
//!
//! Provides human-readable terminal display for pipeline runs.

pub mod display;

pub use display::render_run_summary;
pub use display::RunDisplay;
