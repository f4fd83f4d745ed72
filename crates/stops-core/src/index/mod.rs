//! Compact agency/year index for scatterplots (Pipeline B).
//!
//! Two passes over the same records: the first assigns dense agency and year
//! indices, the second re-encodes allow-listed rows as fixed-width arrays.

pub mod compact;
pub mod tables;

pub use compact::{build_index, compact_record, CompactIndex, CompactRow, CompactStats, ROW_WIDTH};
pub use tables::{IndexBuilder, IndexTables};
