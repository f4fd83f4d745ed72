//! Metric filtering and per-category accumulation for one target year.
//!
//! Each entity is accumulated into its own partial [`Accumulator`]; partials
//! merge by addition (sums) and union (counted entities), so the result does
//! not depend on the order entities are visited in.

use crate::source::{CellValue, EntityRecord};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use stops_common::{Category, CategoryMap, Error, RollupMetric};
use stops_config::Config;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Logical metrics paired with the metric keys that feed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCatalog {
    entries: Vec<(RollupMetric, String)>,
}

impl MetricCatalog {
    /// Entries are checked in the given order; the first match wins.
    pub fn new(entries: Vec<(RollupMetric, String)>) -> Self {
        Self { entries }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rollup_catalog())
    }

    /// The metric a row key feeds, if any.
    pub fn match_key(&self, key: &str) -> Option<RollupMetric> {
        self.entries
            .iter()
            .find(|(_, k)| k == key)
            .map(|(metric, _)| *metric)
    }
}

// ---------------------------------------------------------------------------
// Category sums
// ---------------------------------------------------------------------------

/// Running sums for one metric.
///
/// A category starts untouched (`None`) and becomes `Some(0.0)` on its first
/// present value, so "never reported" stays distinguishable from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategorySums {
    sums: CategoryMap<Option<f64>>,
}

impl CategorySums {
    pub fn add(&mut self, category: Category, value: f64) {
        let slot = &mut self.sums[category];
        *slot = Some(slot.unwrap_or(0.0) + value);
    }

    /// Sum for a category, `0` when nothing was reported.
    pub fn get(&self, category: Category) -> f64 {
        self.sums[category].unwrap_or(0.0)
    }

    /// Sum for a category, `None` when nothing was reported.
    pub fn reported(&self, category: Category) -> Option<f64> {
        self.sums[category]
    }

    pub fn merge(&mut self, other: &CategorySums) {
        for (category, value) in other.sums.iter() {
            if let Some(v) = value {
                self.add(category, *v);
            }
        }
    }

    /// Reported categories only, in column order.
    pub fn to_map(&self) -> BTreeMap<Category, f64> {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.reported(c).map(|v| (c, v)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Accumulated rollup state for one target year.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    year: i32,
    /// One entry per [`RollupMetric`], indexed by declaration order.
    metrics: [CategorySums; RollupMetric::COUNT],
    /// Entities with a reported primary-metric `Total`.
    counted: BTreeSet<String>,
}

impl Accumulator {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            metrics: [CategorySums::default(); RollupMetric::COUNT],
            counted: BTreeSet::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn sums(&self, metric: RollupMetric) -> &CategorySums {
        &self.metrics[metric as usize]
    }

    pub fn sum(&self, metric: RollupMetric, category: Category) -> f64 {
        self.sums(metric).get(category)
    }

    /// Number of distinct entities that reported the primary metric.
    pub fn entity_count(&self) -> usize {
        self.counted.len()
    }

    /// Combine two partial states for the same year.
    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        debug_assert_eq!(self.year, other.year);
        for (mine, theirs) in self.metrics.iter_mut().zip(other.metrics.iter()) {
            mine.merge(theirs);
        }
        self.counted.extend(other.counted);
        self
    }
}

/// Accumulate a single entity into a fresh partial state.
pub fn accumulate_entity(
    record: &EntityRecord,
    year: i32,
    catalog: &MetricCatalog,
) -> Result<Accumulator, Error> {
    let mut acc = Accumulator::new(year);

    for row in record.rows.iter().filter(|r| r.year == year) {
        let Some(metric) = row.key().and_then(|k| catalog.match_key(k)) else {
            continue;
        };

        let sums = &mut acc.metrics[metric as usize];
        for (category, cell) in row.cells.iter() {
            match cell {
                CellValue::Present(v) => sums.add(category, *v),
                CellValue::Absent => {}
                CellValue::Invalid(raw) => {
                    return Err(Error::InvalidValue {
                        entity: record.entity_id.clone(),
                        category: category.to_string(),
                        value: raw.clone(),
                    });
                }
            }
        }

        if metric.is_primary() && row.cells[Category::Total].is_present() {
            acc.counted.insert(record.entity_id.clone());
        }
    }

    Ok(acc)
}

/// An entity left out of the rollup.
#[derive(Debug)]
pub struct SkippedEntity {
    pub entity_id: String,
    pub source: PathBuf,
    pub error: Error,
}

/// Result of accumulating a whole source.
#[derive(Debug)]
pub struct RollupScan {
    pub accumulator: Accumulator,
    pub skipped: Vec<SkippedEntity>,
}

/// Accumulate every record in parallel.
///
/// A record with an invalid value in a matching row contributes nothing;
/// it is logged and listed in `skipped`.
pub fn accumulate(records: &[EntityRecord], year: i32, catalog: &MetricCatalog) -> RollupScan {
    let (accumulator, mut skipped) = records
        .par_iter()
        .fold(
            || (Accumulator::new(year), Vec::new()),
            |(acc, mut skipped), record| match accumulate_entity(record, year, catalog) {
                Ok(partial) => (acc.merge(partial), skipped),
                Err(error) => {
                    warn!(
                        entity = %record.entity_id,
                        path = %record.source.display(),
                        error = %error,
                        "skipping file in rollup"
                    );
                    skipped.push(SkippedEntity {
                        entity_id: record.entity_id.clone(),
                        source: record.source.clone(),
                        error,
                    });
                    (acc, skipped)
                }
            },
        )
        .reduce(
            || (Accumulator::new(year), Vec::new()),
            |(a, mut sa), (b, sb)| {
                sa.extend(sb);
                (a.merge(b), sa)
            },
        );

    skipped.sort_by(|a, b| a.source.cmp(&b.source));
    debug!(
        year,
        entities = accumulator.entity_count(),
        skipped = skipped.len(),
        "rollup accumulation complete"
    );
    RollupScan {
        accumulator,
        skipped,
    }
}
