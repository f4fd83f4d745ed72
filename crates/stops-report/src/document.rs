//! Report documents.
//!
//! Plain data consumed by both the JSON writer and the text renderers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stops_common::{Category, RollupMetric};

/// Statewide rollup for one target year.
///
/// Serialized as the homepage statistics file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupReport {
    pub year: i32,
    /// `all_stops` total across every agency.
    pub total_stops: f64,
    /// Agencies with a reported `Total` for `all_stops` in the target year.
    pub agency_count: usize,
    /// Summed values; categories no row reported are omitted.
    pub by_race: BTreeMap<RollupMetric, BTreeMap<Category, f64>>,
    pub summary: RateSummary,
    /// Per-category rates for every category except `Total`.
    pub race_rates: BTreeMap<Category, CategoryRates>,
}

impl RollupReport {
    /// Summed value for a metric and category, `0` when unreported.
    pub fn sum(&self, metric: RollupMetric, category: Category) -> f64 {
        self.by_race
            .get(&metric)
            .and_then(|m| m.get(&category))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Overall rates, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    /// searches / all_stops
    pub search_rate: f64,
    /// contraband / searches
    pub hit_rate: f64,
    pub citation_rate: f64,
    pub arrest_rate: f64,
    pub warning_rate: f64,
}

/// Rates for a single category, as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRates {
    /// Category searches / category all_stops.
    pub search_rate: f64,
    /// Category contraband / category searches.
    pub hit_rate: f64,
    /// Category all_stops / total all_stops.
    pub stop_share: f64,
}

/// Shape of a written compact index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub agency_count: usize,
    pub year_count: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    /// Compact rows per metric key.
    pub rows_by_key: BTreeMap<String, usize>,
}

/// What the record source produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// `.json` files discovered in the data directory.
    pub files_found: usize,
    /// Files parsed into entity records.
    pub files_loaded: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_skipped: usize,
}
