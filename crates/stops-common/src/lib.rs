//! Traffic-stop statistics common types and errors.
//!
//! This crate provides foundational types shared across the stopstats crates:
//! - The closed set of demographic categories and their column order
//! - Logical rollup metrics and their default metric keys
//! - Common error types
//! - Output format selection

pub mod category;
pub mod error;
pub mod metric;
pub mod output;
pub mod schema;

pub use category::{Category, CategoryMap};
pub use error::{Error, Result};
pub use metric::{RollupMetric, DEFAULT_KEY_PREFIX, INDEX_KEY_SUFFIXES};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
