//! Immutable, shareable record tables.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use super::family::Family;
use super::record::Record;
use crate::errors::SchemaError;

/// A resolved numeric column of a record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Category(usize),
    Total,
    Month,
    Day,
    Weekday,
}

impl Column {
    /// Read this column from a record; missing counts stay `None`.
    pub fn read(&self, record: &Record) -> Option<f64> {
        match self {
            Self::Category(idx) => record.count(*idx).map(|c| c as f64),
            Self::Total => Some(record.total() as f64),
            Self::Month => Some(record.month() as f64),
            Self::Day => Some(record.day() as f64),
            Self::Weekday => Some(record.weekday() as f64),
        }
    }
}

/// A harmonized in-memory table for one family.
///
/// Rows live behind an `Arc`, so clones are cheap and every consumer sees
/// the same read-only rows. Filtering returns a new table.
#[derive(Debug, Clone)]
pub struct RecordTable {
    family: Family,
    records: Arc<[Record]>,
}

impl RecordTable {
    /// Build a table, checking every record against the family schema.
    pub fn new(family: Family, records: Vec<Record>) -> Result<Self, SchemaError> {
        let expected = family.categories().len();
        if let Some((row, rec)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.counts().len() != expected)
        {
            return Err(SchemaError::CountArity {
                row,
                family: family.to_string(),
                expected,
                actual: rec.counts().len(),
            });
        }
        Ok(Self {
            family,
            records: records.into(),
        })
    }

    pub fn empty(family: Family) -> Self {
        Self {
            family,
            records: Vec::<Record>::new().into(),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a column name: a category, the family total (or `total`),
    /// `month`, `day`, or `weekday`.
    pub fn column(&self, name: &str) -> Result<Column, SchemaError> {
        if let Some(idx) = self.family.category_index(name) {
            return Ok(Column::Category(idx));
        }
        match name {
            "total" => Ok(Column::Total),
            "month" => Ok(Column::Month),
            "day" => Ok(Column::Day),
            "weekday" => Ok(Column::Weekday),
            n if n == self.family.total_name() => Ok(Column::Total),
            _ => Err(SchemaError::UnknownField {
                field: name.to_string(),
                family: self.family.to_string(),
            }),
        }
    }

    /// Column values with missing cells read as 0.
    pub fn values(&self, name: &str) -> Result<Vec<f64>, SchemaError> {
        let col = self.column(name)?;
        Ok(self
            .records
            .iter()
            .map(|r| col.read(r).unwrap_or(0.0))
            .collect())
    }

    /// Column values with missing cells preserved.
    pub fn raw_values(&self, name: &str) -> Result<Vec<Option<f64>>, SchemaError> {
        let col = self.column(name)?;
        Ok(self.records.iter().map(|r| col.read(r)).collect())
    }

    /// Category columns followed by the total column.
    pub fn metric_names(&self) -> Vec<String> {
        self.family
            .categories()
            .iter()
            .copied()
            .chain(std::iter::once(self.family.total_name()))
            .map(str::to_string)
            .collect()
    }

    /// Rows whose date falls in `[from, to]`.
    pub fn filter_dates(&self, from: NaiveDate, to: NaiveDate) -> Self {
        self.filter(|r| r.date >= from && r.date <= to)
    }

    /// Rows from the given states. An empty selection keeps every row.
    pub fn filter_states(&self, states: &[&str]) -> Self {
        if states.is_empty() {
            return self.clone();
        }
        self.filter(|r| states.contains(&r.region.state.as_str()))
    }

    pub fn filter(&self, keep: impl Fn(&Record) -> bool) -> Self {
        Self {
            family: self.family,
            records: self.records.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }

    /// Earliest and latest date present.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    pub fn states(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.region.state.as_str()).collect()
    }

    /// Sum of the family total across all rows.
    pub fn grand_total(&self) -> u64 {
        self.records.iter().map(Record::total).sum()
    }

    /// Sum of one category across all rows, missing read as 0.
    pub fn category_total(&self, name: &str) -> Result<u64, SchemaError> {
        match self.column(name)? {
            Column::Category(idx) => Ok(self
                .records
                .iter()
                .map(|r| r.count(idx).unwrap_or(0))
                .sum()),
            Column::Total => Ok(self.grand_total()),
            _ => Err(SchemaError::UnknownField {
                field: name.to_string(),
                family: self.family.to_string(),
            }),
        }
    }
}

/// The three family tables handed over by the ingestion collaborator.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub biometric: RecordTable,
    pub demographic: RecordTable,
    pub enrollment: RecordTable,
}

impl Dataset {
    pub fn new(biometric: RecordTable, demographic: RecordTable, enrollment: RecordTable) -> Self {
        Self {
            biometric,
            demographic,
            enrollment,
        }
    }

    pub fn get(&self, family: Family) -> &RecordTable {
        match family {
            Family::Biometric => &self.biometric,
            Family::Demographic => &self.demographic,
            Family::Enrollment => &self.enrollment,
        }
    }

    pub fn tables(&self) -> [&RecordTable; 3] {
        [&self.biometric, &self.demographic, &self.enrollment]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn table() -> RecordTable {
        RecordTable::new(
            Family::Enrollment,
            vec![
                Record::with_counts(Region::new("Bihar", "Patna"), d(1), &[1, 2, 3]),
                Record::with_counts(Region::new("Bihar", "Gaya"), d(2), &[4, 5, 6]),
                Record::with_counts(Region::new("Assam", "Cachar"), d(3), &[7, 8, 9]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let err = RecordTable::new(
            Family::Biometric,
            vec![Record::with_counts(Region::new("A", "B"), d(1), &[1, 2, 3])],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::CountArity { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn test_column_resolution() {
        let t = table();
        assert_eq!(t.values("total_enroll").unwrap(), vec![6.0, 15.0, 24.0]);
        assert_eq!(t.values("total").unwrap(), vec![6.0, 15.0, 24.0]);
        assert_eq!(t.values("age_5_17").unwrap(), vec![2.0, 5.0, 8.0]);
        assert_eq!(t.values("day").unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            t.values("bio_age_17_"),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_filters_return_new_tables() {
        let t = table();
        let bihar = t.filter_states(&["Bihar"]);
        assert_eq!(bihar.len(), 2);
        assert_eq!(t.len(), 3);
        let window = t.filter_dates(d(2), d(3));
        assert_eq!(window.len(), 2);
        assert_eq!(window.date_range(), Some((d(2), d(3))));
        assert_eq!(t.filter_states(&[]).len(), 3);
    }

    #[test]
    fn test_totals() {
        let t = table();
        assert_eq!(t.grand_total(), 45);
        assert_eq!(t.category_total("age_18_greater").unwrap(), 18);
        assert_eq!(t.states().len(), 2);
    }
}
