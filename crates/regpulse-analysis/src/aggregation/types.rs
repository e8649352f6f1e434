//! Aggregate table types.

use regpulse_core::errors::SchemaError;
use regpulse_core::types::collections::KeyVec;
use regpulse_core::{Family, KeyField, KeyValue};
use serde::{Deserialize, Serialize};

/// Summary of one numeric field within one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub sum: f64,
    pub mean: f64,
    /// Sample (N-1) standard deviation; `None` for single-row groups.
    pub std_dev: Option<f64>,
}

/// One group of an aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Key values, aligned with the table's key fields.
    pub key: KeyVec<KeyValue>,
    /// Rows that fell in this group; always at least 1.
    pub row_count: usize,
    /// Summaries aligned with the table's metric names.
    pub metrics: Vec<MetricSummary>,
    /// Distinct-value counts aligned with the table's distinct fields.
    pub distinct: Vec<usize>,
}

/// Extra outputs requested from the aggregator.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Key fields whose distinct values are counted per group.
    pub distinct: Vec<KeyField>,
}

impl AggregateOptions {
    pub fn with_distinct(fields: &[KeyField]) -> Self {
        Self {
            distinct: fields.to_vec(),
        }
    }
}

/// Result of one aggregation call. Rows are sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    pub(crate) family: Option<Family>,
    pub(crate) key_fields: Vec<KeyField>,
    pub(crate) metric_names: Vec<String>,
    pub(crate) distinct_fields: Vec<KeyField>,
    pub(crate) rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// Build a table directly from rows, e.g. for a collaborator that
    /// aggregates elsewhere. Rows are sorted by key.
    pub fn from_rows(
        family: Option<Family>,
        key_fields: Vec<KeyField>,
        metric_names: Vec<String>,
        mut rows: Vec<AggregateRow>,
    ) -> Self {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            family,
            key_fields,
            metric_names,
            distinct_fields: Vec::new(),
            rows,
        }
    }

    /// Family the rows were aggregated from, if a single one.
    pub fn family(&self) -> Option<Family> {
        self.family
    }

    pub fn key_fields(&self) -> &[KeyField] {
        &self.key_fields
    }

    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    pub fn distinct_fields(&self) -> &[KeyField] {
        &self.distinct_fields
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for an exact key, if that combination was present in the input.
    pub fn get(&self, key: &[KeyValue]) -> Option<&AggregateRow> {
        self.rows
            .binary_search_by(|row| row.key.as_slice().cmp(key))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    pub fn metric_index(&self, metric: &str) -> Result<usize, SchemaError> {
        self.metric_names
            .iter()
            .position(|m| m == metric)
            .ok_or_else(|| SchemaError::UnknownMetric {
                metric: metric.to_string(),
            })
    }

    pub fn distinct_index(&self, field: KeyField) -> Option<usize> {
        self.distinct_fields.iter().position(|f| *f == field)
    }

    /// Per-group sums of one metric, in row order.
    pub fn sums(&self, metric: &str) -> Result<Vec<f64>, SchemaError> {
        let idx = self.metric_index(metric)?;
        Ok(self.rows.iter().map(|r| r.metrics[idx].sum).collect())
    }

    /// Per-group summaries of one metric, in row order.
    pub fn summaries(&self, metric: &str) -> Result<Vec<&MetricSummary>, SchemaError> {
        let idx = self.metric_index(metric)?;
        Ok(self.rows.iter().map(|r| &r.metrics[idx]).collect())
    }

    /// Sum of a metric over every group.
    pub fn total(&self, metric: &str) -> Result<f64, SchemaError> {
        Ok(self.sums(metric)?.iter().sum())
    }

    pub(crate) fn key_names(&self) -> String {
        self.key_fields
            .iter()
            .map(KeyField::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
