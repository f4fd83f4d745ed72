//! Dense lookup tables for agencies and years.
//!
//! Agencies are indexed in the order they are first seen; years are indexed
//! by their position in ascending order. The asymmetry is part of the output
//! contract: consumers resolve agency indices through the `agencies` list,
//! but may rely on `years` being sorted.

use crate::source::EntityRecord;
use std::collections::{BTreeSet, HashMap};

/// Agency and year lookup tables built by the first pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexTables {
    agencies: Vec<String>,
    agency_index: HashMap<String, u32>,
    years: Vec<i32>,
    year_index: HashMap<i32, u32>,
}

/// Pass-one state: agencies in discovery order plus the set of years seen.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    agencies: Vec<String>,
    agency_index: HashMap<String, u32>,
    years: BTreeSet<i32>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity and every year in its rows.
    ///
    /// Rows are considered whatever their metric key, so the year table
    /// covers every row of every entity.
    pub fn observe(&mut self, record: &EntityRecord) {
        if !self.agency_index.contains_key(&record.entity_id) {
            let idx = self.agencies.len() as u32;
            self.agency_index.insert(record.entity_id.clone(), idx);
            self.agencies.push(record.entity_id.clone());
        }
        self.years.extend(record.rows.iter().map(|r| r.year));
    }

    /// Freeze the tables; years are indexed in ascending order.
    pub fn finish(self) -> IndexTables {
        let years: Vec<i32> = self.years.into_iter().collect();
        let year_index = years
            .iter()
            .enumerate()
            .map(|(idx, year)| (*year, idx as u32))
            .collect();
        IndexTables {
            agencies: self.agencies,
            agency_index: self.agency_index,
            years,
            year_index,
        }
    }
}

impl IndexTables {
    /// Run pass one over records in enumeration order.
    pub fn build(records: &[EntityRecord]) -> Self {
        let mut builder = IndexBuilder::new();
        for record in records {
            builder.observe(record);
        }
        builder.finish()
    }

    pub fn agency_index(&self, entity_id: &str) -> Option<u32> {
        self.agency_index.get(entity_id).copied()
    }

    pub fn year_index(&self, year: i32) -> Option<u32> {
        self.year_index.get(&year).copied()
    }

    /// Agencies; position is the dense index.
    pub fn agencies(&self) -> &[String] {
        &self.agencies
    }

    /// Years ascending; position is the dense index.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<i32>) {
        (self.agencies, self.years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Row;

    fn record(id: &str, years: &[i32]) -> EntityRecord {
        EntityRecord::new(id, years.iter().map(|y| Row::new("k", *y)).collect())
    }

    #[test]
    fn agencies_keep_discovery_order_years_sort() {
        let records = vec![
            record("Zeta", &[2022, 2020]),
            record("Alpha", &[2024]),
            record("Mid", &[2021, 2020]),
        ];
        let tables = IndexTables::build(&records);
        assert_eq!(tables.agencies(), &["Zeta", "Alpha", "Mid"]);
        assert_eq!(tables.years(), &[2020, 2021, 2022, 2024]);
        assert_eq!(tables.agency_index("Zeta"), Some(0));
        assert_eq!(tables.agency_index("Mid"), Some(2));
        assert_eq!(tables.year_index(2020), Some(0));
        assert_eq!(tables.year_index(2024), Some(3));
        assert_eq!(tables.year_index(1999), None);
    }

    #[test]
    fn reordering_sources_moves_agencies_but_not_years() {
        let forward = IndexTables::build(&[record("A", &[2019]), record("B", &[2018])]);
        let backward = IndexTables::build(&[record("B", &[2018]), record("A", &[2019])]);

        assert_eq!(forward.agency_index("A"), Some(0));
        assert_eq!(backward.agency_index("A"), Some(1));
        assert_eq!(forward.years(), backward.years());
        assert_eq!(forward.year_index(2019), backward.year_index(2019));
    }

    #[test]
    fn duplicate_agencies_share_an_index() {
        let tables = IndexTables::build(&[
            record("A", &[2020]),
            record("B", &[2020]),
            record("A", &[2021]),
        ]);
        assert_eq!(tables.agencies().len(), 2);
        assert_eq!(tables.agency_index("A"), Some(0));
        assert_eq!(tables.years(), &[2020, 2021]);
    }

    #[test]
    fn entity_without_rows_is_still_indexed() {
        let tables = IndexTables::build(&[record("Empty", &[])]);
        assert_eq!(tables.agencies(), &["Empty"]);
        assert!(tables.years().is_empty());
    }
}
