//! stopstats core library.
//!
//! Loads per-agency traffic-stop documents and derives two artifacts from
//! them: a statewide rollup for one year, and a compact multi-year index
//! for scatterplots.

pub mod exit_codes;
pub mod index;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod rollup;
pub mod source;

pub use exit_codes::ExitCode;
pub use pipeline::{run_all, run_index, run_rollup, IndexOutcome, RollupOutcome, RunOutcome};
pub use source::{load_directory, EntityRecord, SourceSet};
