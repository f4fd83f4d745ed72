//! Entity records and best-effort numeric coercion of category cells.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stops_common::{Category, CategoryMap, Error, Result};
use tracing::warn;

/// A single category cell after coercion.
///
/// The published files only distinguish `number | null`; `Invalid` keeps
/// track of values that were present but could not be read as a number.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    Present(f64),
    #[default]
    Absent,
    /// Raw text of a value that is neither empty nor a finite number.
    Invalid(String),
}

impl CellValue {
    /// Coerce a raw JSON cell.
    ///
    /// Missing, `null`, and `""` are absent. Numbers and numeric strings
    /// are present when finite, with `-0` read as `0`. Everything else is
    /// invalid.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Absent,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => CellValue::Present(v + 0.0),
                _ => CellValue::Invalid(n.to_string()),
            },
            Some(Value::String(s)) if s.is_empty() => CellValue::Absent,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => CellValue::Present(v + 0.0),
                _ => CellValue::Invalid(s.clone()),
            },
            Some(other) => CellValue::Invalid(other.to_string()),
        }
    }

    /// The number, if present. Invalid cells read as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Present(v) => Some(*v),
            CellValue::Absent | CellValue::Invalid(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, CellValue::Present(_))
    }
}

/// One observation: a metric for one entity in one year.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// `None` when the source row has no `row_key`; such rows match nothing.
    pub metric_key: Option<String>,
    pub year: i32,
    pub cells: CategoryMap<CellValue>,
}

impl Row {
    pub fn new(metric_key: impl Into<String>, year: i32) -> Self {
        Self {
            metric_key: Some(metric_key.into()),
            year,
            cells: CategoryMap::default(),
        }
    }

    /// Builder-style setter used when assembling rows by hand.
    pub fn with(mut self, category: Category, value: CellValue) -> Self {
        self.cells[category] = value;
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.metric_key.as_deref()
    }
}

/// All rows reported by one entity, as read from one source document.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub entity_id: String,
    /// Document the record was read from.
    pub source: PathBuf,
    pub rows: Vec<Row>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>, rows: Vec<Row>) -> Self {
        let entity_id = entity_id.into();
        Self {
            source: PathBuf::from(format!("{entity_id}.json")),
            entity_id,
            rows,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    agency: String,
    #[serde(default)]
    rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    row_key: Option<String>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(flatten)]
    cells: HashMap<String, Value>,
}

/// Read a row year. Whole-number floats such as `2024.0` are accepted;
/// anything else (missing, fractional, text, out of range) is `None`.
fn coerce_year(value: Option<&Value>) -> Option<i32> {
    let n = match value? {
        Value::Number(n) => n,
        _ => return None,
    };
    if let Some(year) = n.as_i64() {
        return i32::try_from(year).ok();
    }
    n.as_f64()
        .filter(|v| v.fract() == 0.0 && *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX))
        .map(|v| v as i32)
}

impl RawRow {
    fn into_row(self) -> Option<Row> {
        let year = coerce_year(self.year.as_ref())?;
        Some(Row {
            metric_key: self.row_key,
            year,
            cells: CategoryMap::from_fn(|c| CellValue::from_json(self.cells.get(c.as_str()))),
        })
    }
}

/// Parse one agency document.
pub fn parse_document(path: &Path, content: &str) -> Result<EntityRecord> {
    let raw: RawDocument =
        serde_json::from_str(content).map_err(|e| Error::SourceMalformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let total = raw.rows.len();
    let rows: Vec<Row> = raw.rows.into_iter().filter_map(RawRow::into_row).collect();
    if rows.len() < total {
        warn!(
            path = %path.display(),
            agency = %raw.agency,
            dropped = total - rows.len(),
            "rows without a whole-number year ignored"
        );
    }
    Ok(EntityRecord {
        entity_id: raw.agency,
        source: path.to_path_buf(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(v: Value) -> CellValue {
        CellValue::from_json(Some(&v))
    }

    #[test]
    fn numbers_and_numeric_strings_are_present() {
        assert_eq!(coerce(json!(12)), CellValue::Present(12.0));
        assert_eq!(coerce(json!(0)), CellValue::Present(0.0));
        assert_eq!(coerce(json!(3.5)), CellValue::Present(3.5));
        assert_eq!(coerce(json!("42")), CellValue::Present(42.0));
        assert_eq!(coerce(json!(" 7.25 ")), CellValue::Present(7.25));
    }

    #[test]
    fn missing_null_and_empty_are_absent() {
        assert_eq!(CellValue::from_json(None), CellValue::Absent);
        assert_eq!(coerce(Value::Null), CellValue::Absent);
        assert_eq!(coerce(json!("")), CellValue::Absent);
    }

    #[test]
    fn non_numeric_values_are_invalid_not_absent() {
        assert_eq!(coerce(json!("n/a")), CellValue::Invalid("n/a".to_string()));
        assert_eq!(coerce(json!("1,234")), CellValue::Invalid("1,234".to_string()));
        assert_eq!(coerce(json!("   ")), CellValue::Invalid("   ".to_string()));
        assert!(matches!(coerce(json!(true)), CellValue::Invalid(_)));
        assert!(matches!(coerce(json!([1])), CellValue::Invalid(_)));
        assert_eq!(coerce(json!("n/a")).as_number(), None);
    }

    #[test]
    fn non_finite_strings_are_invalid() {
        assert!(matches!(coerce(json!("NaN")), CellValue::Invalid(_)));
        assert!(matches!(coerce(json!("inf")), CellValue::Invalid(_)));
    }

    #[test]
    fn parse_document_maps_categories() {
        let content = r#"{
            "agency": "Springfield PD",
            "rows": [
                {"row_key": "k", "year": 2024, "Total": 10, "Native American": "2", "Asian": ""},
                {"year": 2023, "Total": null, "Notes": "ignored"}
            ]
        }"#;
        let record = parse_document(Path::new("springfield.json"), content).unwrap();
        assert_eq!(record.entity_id, "Springfield PD");
        assert_eq!(record.rows.len(), 2);

        let first = &record.rows[0];
        assert_eq!(first.key(), Some("k"));
        assert_eq!(first.cells[Category::Total], CellValue::Present(10.0));
        assert_eq!(first.cells[Category::NativeAmerican], CellValue::Present(2.0));
        assert_eq!(first.cells[Category::Asian], CellValue::Absent);
        assert_eq!(first.cells[Category::White], CellValue::Absent);

        let second = &record.rows[1];
        assert_eq!(second.key(), None);
        assert_eq!(second.year, 2023);
    }

    #[test]
    fn missing_rows_is_empty() {
        let record = parse_document(Path::new("a.json"), r#"{"agency": "A"}"#).unwrap();
        assert!(record.rows.is_empty());
    }

    #[test]
    fn missing_agency_is_malformed() {
        let err = parse_document(Path::new("a.json"), r#"{"rows": []}"#).unwrap_err();
        assert_eq!(err.code(), 21);
        assert!(matches!(err, Error::SourceMalformed { .. }));
    }

    #[test]
    fn rows_without_usable_year_are_dropped_not_the_file() {
        let content = r#"{"agency": "A", "rows": [
            {"row_key": "totals--all-stops", "year": 2024, "Total": 100},
            {"row_key": "notes"},
            {"row_key": "k", "year": null},
            {"row_key": "k", "year": 2024.5},
            {"row_key": "k", "year": "2024"},
            {"row_key": "k", "year": 99999999999}
        ]}"#;
        let record = parse_document(Path::new("a.json"), content).unwrap();
        assert_eq!(record.entity_id, "A");
        assert_eq!(record.rows.len(), 1);
        assert_eq!(record.rows[0].year, 2024);
        assert_eq!(record.rows[0].cells[Category::Total], CellValue::Present(100.0));
    }

    #[test]
    fn whole_number_float_year_is_accepted() {
        let content = r#"{"agency": "A", "rows": [{"row_key": "k", "year": 2024.0, "Total": 5}]}"#;
        let record = parse_document(Path::new("a.json"), content).unwrap();
        assert_eq!(record.rows[0].year, 2024);
    }

    #[test]
    fn negative_zero_reads_as_zero() {
        match coerce(json!(-0.0)) {
            CellValue::Present(v) => assert!(v == 0.0 && v.is_sign_positive()),
            other => panic!("expected present, got {other:?}"),
        }
        match coerce(json!("-0")) {
            CellValue::Present(v) => assert!(v.is_sign_positive()),
            other => panic!("expected present, got {other:?}"),
        }
    }

    #[test]
    fn truncated_json_is_malformed() {
        let err = parse_document(Path::new("c.json"), r#"{"agency": "C", "rows": ["#).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("c.json"));
    }
}
