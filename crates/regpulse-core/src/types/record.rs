//! Regions and immutable records.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::collections::CountVec;
use super::key::{KeyField, KeyValue};

/// A (state, district) pair identifying where a record originated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    pub state: String,
    pub district: String,
}

impl Region {
    pub fn new(state: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.district, self.state)
    }
}

/// One harmonized row of a record table.
///
/// Counts are positional and follow the owning family's category order.
/// A `None` count is a missing cell; it contributes 0 to the total.
/// The total is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub region: Region,
    pub date: NaiveDate,
    pub pincode: Option<u32>,
    counts: CountVec,
}

impl Record {
    pub fn new(region: Region, date: NaiveDate, pincode: Option<u32>, counts: CountVec) -> Self {
        Self {
            region,
            date,
            pincode,
            counts,
        }
    }

    /// Convenience constructor for fully-populated counts.
    pub fn with_counts(region: Region, date: NaiveDate, counts: &[u64]) -> Self {
        Self::new(region, date, None, counts.iter().map(|&c| Some(c)).collect())
    }

    pub fn counts(&self) -> &[Option<u64>] {
        &self.counts
    }

    /// Count at category position `idx`, `None` when missing or out of range.
    pub fn count(&self, idx: usize) -> Option<u64> {
        self.counts.get(idx).copied().flatten()
    }

    /// Sum of the declared category counts, missing counts read as 0.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.unwrap_or(0)).sum()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Day of week, 0 = Monday.
    pub fn weekday(&self) -> u32 {
        self.date.weekday().num_days_from_monday()
    }

    pub fn key_value(&self, field: KeyField) -> KeyValue {
        match field {
            KeyField::State => KeyValue::Text(self.region.state.clone()),
            KeyField::District => KeyValue::Text(self.region.district.clone()),
            KeyField::Date => KeyValue::Date(self.date),
            KeyField::Month => KeyValue::Int(self.month() as i64),
            KeyField::Weekday => KeyValue::Int(self.weekday() as i64),
            KeyField::Pincode => self
                .pincode
                .map(|p| KeyValue::Int(p as i64))
                .unwrap_or(KeyValue::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_total_treats_missing_as_zero() {
        let rec = Record::new(
            Region::new("Kerala", "Kollam"),
            date(2025, 3, 1),
            None,
            [Some(4), None, Some(6)].into_iter().collect(),
        );
        assert_eq!(rec.total(), 10);
        assert_eq!(rec.count(1), None);
        assert_eq!(rec.count(7), None);
    }

    #[test]
    fn test_date_derived_fields() {
        // 2025-03-03 is a Monday.
        let rec = Record::with_counts(Region::new("Goa", "North Goa"), date(2025, 3, 3), &[1]);
        assert_eq!(rec.month(), 3);
        assert_eq!(rec.day(), 3);
        assert_eq!(rec.weekday(), 0);
        assert_eq!(rec.key_value(KeyField::Pincode), KeyValue::Missing);
    }
}
