//! Report documents and renderers for traffic-stop statistics.
//!
//! The rollup document is both written to disk as JSON and rendered as a
//! text report; index and scan summaries are rendered for the CLI.

pub mod document;
pub mod render;

pub use document::{CategoryRates, IndexSummary, RateSummary, RollupReport, ScanSummary};
pub use render::{
    format_count, format_pct, render_index_summary, render_rollup, render_scan_summary,
};
