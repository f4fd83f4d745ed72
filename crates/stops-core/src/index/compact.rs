//! Columnar row compaction (Pipeline B, pass two).
//!
//! Each kept row becomes `[agency, year, Total, White, Black, Hispanic,
//! Native American, Asian, Other]`, with `null` for any value that is
//! missing, empty, or not a number.
//!
//! Ordering within a group is lexicographic over the full array. `null`
//! sorts before every number, and numbers compare by IEEE total order.

use super::tables::IndexTables;
use crate::source::{CellValue, EntityRecord};
use rayon::prelude::*;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use stops_common::Category;
use stops_report::IndexSummary;
use tracing::debug;

/// Width of a compact row: two index slots plus one per category.
pub const ROW_WIDTH: usize = 2 + Category::COUNT;

/// One fixed-width compact row.
#[derive(Debug, Clone, Copy)]
pub struct CompactRow {
    pub agency: u32,
    pub year: u32,
    /// Category values in column order; `None` is the null sentinel.
    pub values: [Option<f64>; Category::COUNT],
}

fn cmp_cell(a: &Option<f64>, b: &Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(y),
    }
}

impl Ord for CompactRow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.agency
            .cmp(&other.agency)
            .then(self.year.cmp(&other.year))
            .then_with(|| {
                self.values
                    .iter()
                    .zip(other.values.iter())
                    .map(|(a, b)| cmp_cell(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl PartialOrd for CompactRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CompactRow {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CompactRow {}

/// Largest magnitude at which every integer is exactly representable.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Whole, exactly representable, and not `-0.0`.
fn is_plain_integer(v: f64) -> bool {
    v.fract() == 0.0 && v.abs() <= MAX_EXACT_INT && !(v == 0.0 && v.is_sign_negative())
}

/// Serializes whole numbers without a trailing `.0`. `-0.0` keeps its sign.
struct Cell(Option<f64>);

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            None => serializer.serialize_none(),
            Some(v) if is_plain_integer(v) => serializer.serialize_i64(v as i64),
            Some(v) => serializer.serialize_f64(v),
        }
    }
}

impl Serialize for CompactRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(ROW_WIDTH))?;
        seq.serialize_element(&self.agency)?;
        seq.serialize_element(&self.year)?;
        for value in &self.values {
            seq.serialize_element(&Cell(*value))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for CompactRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = CompactRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array of {ROW_WIDTH} numbers or nulls")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CompactRow, A::Error> {
                let agency = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let year = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let mut values = [None; Category::COUNT];
                for (i, slot) in values.iter_mut().enumerate() {
                    *slot = seq
                        .next_element::<Option<f64>>()?
                        .ok_or_else(|| de::Error::invalid_length(i + 2, &self))?;
                }
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(ROW_WIDTH + 1, &self));
                }
                Ok(CompactRow {
                    agency,
                    year,
                    values,
                })
            }
        }

        deserializer.deserialize_seq(RowVisitor)
    }
}

/// The compact scatterplot index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactIndex {
    /// Position is the agency index.
    pub agencies: Vec<String>,
    /// Ascending; position is the year index.
    pub years: Vec<i32>,
    /// Column order of the value slots.
    pub columns: Vec<Category>,
    /// Metric key to its rows, each group sorted ascending.
    pub rows: BTreeMap<String, Vec<CompactRow>>,
}

impl CompactIndex {
    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            agency_count: self.agencies.len(),
            year_count: self.years.len(),
            first_year: self.years.first().copied(),
            last_year: self.years.last().copied(),
            rows_by_key: self
                .rows
                .iter()
                .map(|(key, rows)| (key.clone(), rows.len()))
                .collect(),
        }
    }
}

/// Counters from a compaction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactStats {
    pub rows_kept: usize,
    /// Rows whose metric key is not on the allow-list.
    pub rows_excluded: usize,
    /// Cells present in the source but not readable as numbers.
    pub invalid_cells: usize,
}

impl CompactStats {
    fn add(self, other: CompactStats) -> CompactStats {
        CompactStats {
            rows_kept: self.rows_kept + other.rows_kept,
            rows_excluded: self.rows_excluded + other.rows_excluded,
            invalid_cells: self.invalid_cells + other.invalid_cells,
        }
    }
}

/// Compact one entity's allow-listed rows, in row order.
pub fn compact_record(
    record: &EntityRecord,
    tables: &IndexTables,
    allow: &HashSet<String>,
) -> (Vec<(String, CompactRow)>, CompactStats) {
    let mut stats = CompactStats::default();
    let Some(agency) = tables.agency_index(&record.entity_id) else {
        return (Vec::new(), stats);
    };

    let mut out = Vec::new();
    for row in &record.rows {
        let Some(key) = row.key().filter(|k| allow.contains(*k)) else {
            stats.rows_excluded += 1;
            continue;
        };
        let Some(year) = tables.year_index(row.year) else {
            stats.rows_excluded += 1;
            continue;
        };

        let mut values = [None; Category::COUNT];
        for ((_, cell), slot) in row.cells.iter().zip(values.iter_mut()) {
            if matches!(cell, CellValue::Invalid(_)) {
                stats.invalid_cells += 1;
            }
            *slot = cell.as_number();
        }
        out.push((
            key.to_string(),
            CompactRow {
                agency,
                year,
                values,
            },
        ));
        stats.rows_kept += 1;
    }
    (out, stats)
}

/// Build the compact index: pass one for the tables, pass two for the rows.
pub fn build_index(records: &[EntityRecord], allow_list: &[String]) -> (CompactIndex, CompactStats) {
    let tables = IndexTables::build(records);
    let allow: HashSet<String> = allow_list.iter().cloned().collect();

    let compacted: Vec<(Vec<(String, CompactRow)>, CompactStats)> = records
        .par_iter()
        .map(|record| compact_record(record, &tables, &allow))
        .collect();

    let mut rows: BTreeMap<String, Vec<CompactRow>> = BTreeMap::new();
    let mut stats = CompactStats::default();
    for (entries, record_stats) in compacted {
        stats = stats.add(record_stats);
        for (key, row) in entries {
            rows.entry(key).or_default().push(row);
        }
    }
    rows.par_iter_mut().for_each(|(_, group)| group.sort());

    debug!(
        agencies = tables.agencies().len(),
        years = tables.years().len(),
        kept = stats.rows_kept,
        excluded = stats.rows_excluded,
        invalid_cells = stats.invalid_cells,
        "compact index built"
    );

    let (agencies, years) = tables.into_parts();
    let index = CompactIndex {
        agencies,
        years,
        columns: Category::ALL.to_vec(),
        rows,
    };
    (index, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Row;
    use serde_json::json;

    fn row(agency: u32, year: u32, values: [Option<f64>; Category::COUNT]) -> CompactRow {
        CompactRow {
            agency,
            year,
            values,
        }
    }

    fn allow(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn null_sorts_before_numbers() {
        let mut low = [None; Category::COUNT];
        let mut high = [None; Category::COUNT];
        low[0] = Some(5.0);
        high[0] = Some(5.0);
        high[1] = Some(-100.0);
        assert!(row(0, 0, low) < row(0, 0, high));
    }

    #[test]
    fn index_columns_dominate_values() {
        let big = [Some(1e9); Category::COUNT];
        let small = [None; Category::COUNT];
        assert!(row(0, 1, big) < row(1, 0, small));
        assert!(row(0, 0, big) < row(0, 1, small));
    }

    #[test]
    fn serializes_as_flat_array() {
        let mut values = [None; Category::COUNT];
        values[0] = Some(100.0);
        values[2] = Some(40.5);
        let json = serde_json::to_value(row(3, 1, values)).unwrap();
        assert_eq!(json, json!([3, 1, 100, null, 40.5, null, null, null, null]));
        assert_eq!(json.to_string(), "[3,1,100,null,40.5,null,null,null,null]");

        let back: CompactRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row(3, 1, values));
    }

    #[test]
    fn negative_zero_survives_reparse() {
        let mut values = [None; Category::COUNT];
        values[0] = Some(-0.0);
        values[1] = Some(0.0);
        let original = row(0, 0, values);
        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(text, "[0,0,-0.0,0,null,null,null,null,null]");

        let back: CompactRow = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
        assert!(back.values[0].unwrap().is_sign_negative());
    }

    #[test]
    fn wrong_width_fails_to_parse() {
        assert!(serde_json::from_value::<CompactRow>(json!([0, 0, 1.0])).is_err());
        assert!(serde_json::from_value::<CompactRow>(json!([0, 0, 1, 2, 3, 4, 5, 6, 7, 8])).is_err());
    }

    #[test]
    fn invalid_cells_become_null_and_are_counted() {
        let record = EntityRecord::new(
            "A",
            vec![Row::new("k", 2024)
                .with(Category::Total, CellValue::Present(9.0))
                .with(Category::White, CellValue::Invalid("redacted".to_string()))
                .with(Category::Black, CellValue::Absent)],
        );
        let (index, stats) = build_index(&[record], &allow(&["k"]));
        let compact = index.rows["k"][0];
        assert_eq!(compact.values[Category::Total.column()], Some(9.0));
        assert_eq!(compact.values[Category::White.column()], None);
        assert_eq!(compact.values[Category::Black.column()], None);
        assert_eq!(stats.invalid_cells, 1);
        assert_eq!(stats.rows_kept, 1);
    }

    #[test]
    fn unknown_keys_are_excluded_but_their_years_indexed() {
        let record = EntityRecord::new(
            "A",
            vec![
                Row::new("keep", 2022).with(Category::Total, CellValue::Present(1.0)),
                Row::new("drop", 2019).with(Category::Total, CellValue::Present(2.0)),
            ],
        );
        let (index, stats) = build_index(&[record], &allow(&["keep"]));
        assert_eq!(index.years, vec![2019, 2022]);
        assert_eq!(index.rows.len(), 1);
        assert_eq!(index.rows["keep"][0].year, 1);
        assert_eq!(stats.rows_excluded, 1);
    }

    #[test]
    fn groups_are_sorted() {
        let records = vec![
            EntityRecord::new(
                "B",
                vec![
                    Row::new("k", 2024).with(Category::Total, CellValue::Present(1.0)),
                    Row::new("k", 2020).with(Category::Total, CellValue::Present(2.0)),
                ],
            ),
            EntityRecord::new(
                "A",
                vec![Row::new("k", 2022).with(Category::Total, CellValue::Present(3.0))],
            ),
        ];
        let (index, _) = build_index(&records, &allow(&["k"]));
        let keys: Vec<(u32, u32)> = index.rows["k"].iter().map(|r| (r.agency, r.year)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 2), (1, 1)]);
        assert_eq!(index.columns, Category::ALL.to_vec());
    }

    #[test]
    fn summary_reports_shape() {
        let records = vec![EntityRecord::new(
            "A",
            vec![Row::new("k", 2018), Row::new("k", 2023), Row::new("j", 2020)],
        )];
        let (index, _) = build_index(&records, &allow(&["k", "j"]));
        let summary = index.summary();
        assert_eq!(summary.agency_count, 1);
        assert_eq!(summary.year_count, 3);
        assert_eq!(summary.first_year, Some(2018));
        assert_eq!(summary.last_year, Some(2023));
        assert_eq!(summary.rows_by_key["k"], 2);
        assert_eq!(summary.rows_by_key["j"], 1);
    }
}
