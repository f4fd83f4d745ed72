//! Logical metrics summed by the statewide rollup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every metric key in the published agency files.
pub const DEFAULT_KEY_PREFIX: &str = "rates-by-race--";

/// A logical metric tracked by the rollup.
///
/// Declaration order is the order in which catalog entries are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupMetric {
    AllStops,
    Searches,
    Contraband,
    Citations,
    Arrests,
    Warnings,
}

impl RollupMetric {
    /// Number of logical metrics.
    pub const COUNT: usize = 6;

    pub const ALL: [RollupMetric; RollupMetric::COUNT] = [
        RollupMetric::AllStops,
        RollupMetric::Searches,
        RollupMetric::Contraband,
        RollupMetric::Citations,
        RollupMetric::Arrests,
        RollupMetric::Warnings,
    ];

    /// The metric representing total stop volume; drives the agency count.
    pub const PRIMARY: RollupMetric = RollupMetric::AllStops;

    pub fn name(self) -> &'static str {
        match self {
            RollupMetric::AllStops => "all_stops",
            RollupMetric::Searches => "searches",
            RollupMetric::Contraband => "contraband",
            RollupMetric::Citations => "citations",
            RollupMetric::Arrests => "arrests",
            RollupMetric::Warnings => "warnings",
        }
    }

    /// Metric key suffix, appended to the configured key prefix.
    pub fn key_suffix(self) -> &'static str {
        match self {
            RollupMetric::AllStops => "totals--all-stops",
            RollupMetric::Searches => "totals--searches",
            RollupMetric::Contraband => "totals--contraband",
            RollupMetric::Citations => "totals--citations",
            RollupMetric::Arrests => "totals--arrests",
            RollupMetric::Warnings => "totals--warnings",
        }
    }

    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }
}

impl fmt::Display for RollupMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RollupMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RollupMetric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown rollup metric: {s}"))
    }
}

/// Metric key suffixes kept in the compact scatterplot index.
///
/// Includes the per-race rate rows, which the rollup never sums.
pub const INDEX_KEY_SUFFIXES: [&str; 8] = [
    "totals--all-stops",
    "totals--searches",
    "rates--search-rate",
    "totals--contraband",
    "rates--contraband-hit-rate",
    "totals--citations",
    "totals--arrests",
    "totals--warnings",
];
