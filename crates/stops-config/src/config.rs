//! Configuration types.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! configuration that reproduces the published data layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use stops_common::{RollupMetric, DEFAULT_KEY_PREFIX, INDEX_KEY_SUFFIXES, SCHEMA_VERSION};

/// Default directory holding one JSON document per agency.
pub const DEFAULT_DATA_DIR: &str = "static/data/agency_year";

/// Default directory receiving both derived artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "static/data";

/// Default rollup target year.
pub const DEFAULT_YEAR: i32 = 2024;

/// Default compact index file name.
pub const DEFAULT_INDEX_FILE: &str = "metric_year_subset.json";

/// Complete stopstats configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Directory scanned for per-agency `.json` documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory the rollup report and compact index are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Prefix prepended to every default metric key suffix.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default)]
    pub rollup: RollupConfig,

    #[serde(default)]
    pub index: IndexConfig,
}

/// Statewide rollup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Target year; rows from any other year are ignored.
    #[serde(default = "default_year")]
    pub year: i32,

    /// Output file name. Defaults to `homepage_<year>_stats.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Full metric keys overriding `key_prefix + suffix`, keyed by logical
    /// metric name (`all_stops`, `searches`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metric_keys: BTreeMap<String, String>,
}

/// Compact scatterplot index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_file")]
    pub output_file: String,

    /// Full allow-list of metric keys. Replaces the default list when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_keys: Option<Vec<String>>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_year() -> i32 {
    DEFAULT_YEAR
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            key_prefix: default_key_prefix(),
            rollup: RollupConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            output_file: None,
            metric_keys: BTreeMap::new(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            output_file: default_index_file(),
            metric_keys: None,
        }
    }
}

impl Config {
    /// The rollup catalog: every logical metric paired with its metric key,
    /// in matching order.
    ///
    /// Overrides naming an unknown metric are ignored here; validation
    /// reports them.
    pub fn rollup_catalog(&self) -> Vec<(RollupMetric, String)> {
        RollupMetric::ALL
            .into_iter()
            .map(|metric| {
                let key = self
                    .rollup
                    .metric_keys
                    .get(metric.name())
                    .cloned()
                    .unwrap_or_else(|| format!("{}{}", self.key_prefix, metric.key_suffix()));
                (metric, key)
            })
            .collect()
    }

    /// Metric keys kept in the compact index.
    pub fn index_keys(&self) -> Vec<String> {
        match &self.index.metric_keys {
            Some(keys) => keys.clone(),
            None => INDEX_KEY_SUFFIXES
                .iter()
                .map(|suffix| format!("{}{}", self.key_prefix, suffix))
                .collect(),
        }
    }

    /// Rollup output file name for the configured year.
    pub fn rollup_file_name(&self) -> String {
        self.rollup
            .output_file
            .clone()
            .unwrap_or_else(|| format!("homepage_{}_stats.json", self.rollup.year))
    }

    pub fn rollup_output_path(&self) -> PathBuf {
        self.output_dir.join(self.rollup_file_name())
    }

    pub fn index_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.index.output_file)
    }
}
