//! Date-ordered series extracted from date-keyed aggregates.

use chrono::NaiveDate;
use regpulse_core::errors::SchemaError;
use regpulse_core::KeyField;
use serde::{Deserialize, Serialize};

use super::types::AggregateTable;

/// A time-ordered sequence of (date, value) points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(d, _)| *d);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }
}

impl AggregateTable {
    /// Daily sums of `metric` for a table grouped by `date` alone.
    ///
    /// With `dense`, every day between the first and last date is present
    /// and days without rows read as 0.
    pub fn time_series(&self, metric: &str, dense: bool) -> Result<TimeSeries, SchemaError> {
        if self.key_fields != [KeyField::Date] {
            return Err(SchemaError::NotATimeSeries {
                keys: self.key_names(),
            });
        }
        let idx = self.metric_index(metric)?;
        let sparse: Vec<(NaiveDate, f64)> = self
            .rows
            .iter()
            .filter_map(|row| Some((row.key[0].as_date()?, row.metrics[idx].sum)))
            .collect();

        if !dense || sparse.is_empty() {
            return Ok(TimeSeries::new(sparse));
        }

        let (first, last) = (sparse[0].0, sparse[sparse.len() - 1].0);
        let mut points = Vec::with_capacity((last - first).num_days() as usize + 1);
        let mut present = sparse.into_iter().peekable();
        for day in first.iter_days().take_while(|d| *d <= last) {
            match present.peek() {
                Some((d, _)) if *d == day => {
                    if let Some(point) = present.next() {
                        points.push(point);
                    }
                }
                _ => points.push((day, 0.0)),
            }
        }
        Ok(TimeSeries { points })
    }
}
