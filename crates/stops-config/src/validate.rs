//! Semantic validation of a resolved configuration.

use crate::config::Config;
use std::collections::HashSet;
use std::fmt;
use stops_common::schema::is_compatible;
use stops_common::RollupMetric;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }
}

/// Validate a configuration.
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !is_compatible(&config.schema_version) {
        result.push(
            "schema_version",
            format!("incompatible schema version {}", config.schema_version),
        );
    }

    for name in config.rollup.metric_keys.keys() {
        if name.parse::<RollupMetric>().is_err() {
            result.push(format!("rollup.metric_keys.{name}"), "unknown rollup metric");
        }
    }

    let mut seen = HashSet::new();
    for (metric, key) in config.rollup_catalog() {
        if key.is_empty() {
            result.push(format!("rollup.metric_keys.{metric}"), "metric key is empty");
        } else if !seen.insert(key.clone()) {
            result.push(
                format!("rollup.metric_keys.{metric}"),
                format!("metric key {key:?} is used by more than one metric"),
            );
        }
    }

    let index_keys = config.index_keys();
    if index_keys.is_empty() {
        result.push("index.metric_keys", "allow-list is empty");
    }
    if index_keys.iter().any(String::is_empty) {
        result.push("index.metric_keys", "allow-list contains an empty key");
    }

    if config.rollup_file_name().trim().is_empty() {
        result.push("rollup.output_file", "file name is empty");
    }
    if config.index.output_file.trim().is_empty() {
        result.push("index.output_file", "file name is empty");
    }

    result
}
