//! End-to-end runs of the two pipelines over a loaded source.
//!
//! Both pipelines read the same [`SourceSet`] and never mutate it, so `run_all`
//! executes them concurrently.

use crate::index::{build_index, CompactIndex, CompactStats};
use crate::output::{write_index, write_rollup};
use crate::rollup::{accumulate, build_report, MetricCatalog, SkippedEntity};
use crate::source::SourceSet;
use serde::Serialize;
use std::path::PathBuf;
use stops_common::Result;
use stops_config::Config;
use stops_report::{IndexSummary, RollupReport};
use tracing::info;

/// A computed rollup, before it is written.
#[derive(Debug)]
pub struct RollupBuild {
    pub report: RollupReport,
    pub skipped: Vec<SkippedEntity>,
}

/// Result of a written rollup.
#[derive(Debug, Clone, Serialize)]
pub struct RollupOutcome {
    pub path: PathBuf,
    pub report: RollupReport,
    /// Files left out of the sums because of invalid values.
    pub skipped_files: Vec<PathBuf>,
}

/// Result of a written compact index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexOutcome {
    pub path: PathBuf,
    pub summary: IndexSummary,
    pub rows_kept: usize,
    pub rows_excluded: usize,
    pub invalid_cells: usize,
}

/// Both outcomes of a combined run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub rollup: RollupOutcome,
    pub index: IndexOutcome,
}

/// Compute the rollup for the configured year without writing it.
pub fn build_rollup(config: &Config, source: &SourceSet) -> RollupBuild {
    let catalog = MetricCatalog::from_config(config);
    let scan = accumulate(&source.records, config.rollup.year, &catalog);
    RollupBuild {
        report: build_report(&scan.accumulator),
        skipped: scan.skipped,
    }
}

/// Compute the compact index without writing it.
pub fn build_compact_index(config: &Config, source: &SourceSet) -> (CompactIndex, CompactStats) {
    build_index(&source.records, &config.index_keys())
}

/// Compute and write the rollup report.
pub fn run_rollup(config: &Config, source: &SourceSet) -> Result<RollupOutcome> {
    let build = build_rollup(config, source);
    let path = config.rollup_output_path();
    write_rollup(&path, &build.report)?;

    info!(
        path = %path.display(),
        year = build.report.year,
        agencies = build.report.agency_count,
        skipped = build.skipped.len(),
        "rollup written"
    );
    Ok(RollupOutcome {
        path,
        report: build.report,
        skipped_files: build.skipped.into_iter().map(|s| s.source).collect(),
    })
}

/// Compute and write the compact index.
pub fn run_index(config: &Config, source: &SourceSet) -> Result<IndexOutcome> {
    let (index, stats) = build_compact_index(config, source);
    let path = config.index_output_path();
    write_index(&path, &index)?;

    let summary = index.summary();
    info!(
        path = %path.display(),
        agencies = summary.agency_count,
        years = summary.year_count,
        rows = stats.rows_kept,
        "compact index written"
    );
    Ok(IndexOutcome {
        path,
        summary,
        rows_kept: stats.rows_kept,
        rows_excluded: stats.rows_excluded,
        invalid_cells: stats.invalid_cells,
    })
}

/// Run both pipelines concurrently over the same source.
///
/// The rollup error wins when both fail.
pub fn run_all(config: &Config, source: &SourceSet) -> Result<RunOutcome> {
    let (rollup, index) = rayon::join(|| run_rollup(config, source), || run_index(config, source));
    Ok(RunOutcome {
        rollup: rollup?,
        index: index?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CellValue, EntityRecord, Row};
    use stops_common::{Category, Error, RollupMetric};
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.key_prefix = String::new();
        config.output_dir = dir.to_path_buf();
        config.rollup.year = 2024;
        config
    }

    fn source() -> SourceSet {
        let stops = |total: f64, white: f64| {
            Row::new("totals--all-stops", 2024)
                .with(Category::Total, CellValue::Present(total))
                .with(Category::White, CellValue::Present(white))
        };
        SourceSet::from_records(vec![
            EntityRecord::new("A", vec![stops(100.0, 80.0)]),
            EntityRecord::new("B", vec![stops(50.0, 30.0)]),
        ])
    }

    #[test]
    fn build_rollup_does_not_touch_disk() {
        let dir = tempdir().unwrap();
        let config = config_in(&dir.path().join("out"));
        let build = build_rollup(&config, &source());
        assert_eq!(build.report.total_stops, 150.0);
        assert_eq!(build.report.sum(RollupMetric::AllStops, Category::White), 110.0);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn run_all_writes_both_artifacts() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let outcome = run_all(&config, &source()).unwrap();

        assert!(outcome.rollup.path.ends_with("homepage_2024_stats.json"));
        assert!(outcome.rollup.path.exists());
        assert!(outcome.index.path.ends_with("metric_year_subset.json"));
        assert_eq!(outcome.index.summary.agency_count, 2);
        assert_eq!(outcome.index.rows_kept, 2);
        assert!(outcome.rollup.skipped_files.is_empty());
    }

    #[test]
    fn skipped_files_are_reported() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let mut source = source();
        source.records.push(EntityRecord::new(
            "Bad",
            vec![Row::new("totals--all-stops", 2024)
                .with(Category::Total, CellValue::Invalid("n/a".into()))],
        ));

        let outcome = run_rollup(&config, &source).unwrap();
        assert_eq!(outcome.report.agency_count, 2);
        assert_eq!(outcome.skipped_files, vec![PathBuf::from("Bad.json")]);
    }

    #[test]
    fn unwritable_output_fails_the_run() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let config = config_in(&blocker);

        let err = run_all(&config, &source()).unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
    }
}
