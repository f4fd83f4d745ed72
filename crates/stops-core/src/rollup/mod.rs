//! Statewide rollup for a single target year (Pipeline A).
//!
//! Rows are filtered by year and metric catalog, summed per category across
//! all agencies, and turned into rates:
//!
//! ```text
//! records ─▶ accumulate (per entity, parallel) ─▶ merge ─▶ rates ─▶ RollupReport
//! ```

pub mod accumulator;
pub mod rates;

pub use accumulator::{
    accumulate, accumulate_entity, Accumulator, CategorySums, MetricCatalog, RollupScan,
    SkippedEntity,
};
pub use rates::{build_report, compute_category_rates, compute_summary, rate};
