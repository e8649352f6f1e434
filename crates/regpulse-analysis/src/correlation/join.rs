//! Dense outer join of aggregates on a shared key.

use std::collections::BTreeMap;

use regpulse_core::errors::{AnalysisError, AnalysisResult, SchemaError};
use regpulse_core::types::collections::{FxHashSet, KeyVec};
use regpulse_core::{KeyField, KeyValue};

use crate::aggregation::AggregateTable;

/// Column-major joined table: one column per metric of every input.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub keys: Vec<KeyVec<KeyValue>>,
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn key_list(fields: &[KeyField]) -> String {
    fields.iter().map(KeyField::name).collect::<Vec<_>>().join(", ")
}

/// Outer-join `tables` on `join_keys`, taking each metric's group sum.
/// A key absent from one table contributes 0 to that table's columns, so
/// "no activity" is an observation rather than a gap.
pub fn outer_join(
    tables: &[&AggregateTable],
    join_keys: &[KeyField],
) -> AnalysisResult<JoinedTable> {
    if tables.is_empty() {
        return Err(AnalysisError::invalid("tables", "at least one aggregate is required"));
    }
    let mut names = Vec::new();
    let mut seen = FxHashSet::default();
    for table in tables {
        if table.key_fields() != join_keys {
            return Err(SchemaError::KeyMismatch {
                left: key_list(join_keys),
                right: key_list(table.key_fields()),
            }
            .into());
        }
        for metric in table.metric_names() {
            if !seen.insert(metric.as_str()) {
                return Err(SchemaError::DuplicateMetric {
                    metric: metric.clone(),
                }
                .into());
            }
            names.push(metric.clone());
        }
    }

    let width = names.len();
    let mut joined: BTreeMap<KeyVec<KeyValue>, Vec<f64>> = BTreeMap::new();
    let mut offset = 0;
    for table in tables {
        let n_metrics = table.metric_names().len();
        for row in table.rows() {
            let cells = joined
                .entry(row.key.clone())
                .or_insert_with(|| vec![0.0; width]);
            for (m, summary) in row.metrics.iter().enumerate() {
                cells[offset + m] = summary.sum;
            }
        }
        offset += n_metrics;
    }

    let mut columns = vec![Vec::with_capacity(joined.len()); width];
    let mut keys = Vec::with_capacity(joined.len());
    for (key, cells) in joined {
        keys.push(key);
        for (col, v) in columns.iter_mut().zip(cells) {
            col.push(v);
        }
    }
    Ok(JoinedTable {
        keys,
        names,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{AggregateRow, MetricSummary};

    fn table(metric: &str, keys: &[(&str, f64)]) -> AggregateTable {
        AggregateTable::from_rows(
            None,
            vec![KeyField::State],
            vec![metric.to_string()],
            keys.iter()
                .map(|(k, v)| AggregateRow {
                    key: [KeyValue::Text(k.to_string())].into_iter().collect(),
                    row_count: 1,
                    metrics: vec![MetricSummary {
                        sum: *v,
                        mean: *v,
                        std_dev: None,
                    }],
                    distinct: Vec::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_outer_join_zero_fills() {
        let a = table("a", &[("X", 1.0), ("Y", 2.0)]);
        let b = table("b", &[("Y", 5.0), ("Z", 7.0)]);
        let joined = outer_join(&[&a, &b], &[KeyField::State]).unwrap();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.columns[0], vec![1.0, 2.0, 0.0]);
        assert_eq!(joined.columns[1], vec![0.0, 5.0, 7.0]);
    }

    #[test]
    fn test_key_mismatch() {
        let a = table("a", &[("X", 1.0)]);
        let err = outer_join(&[&a], &[KeyField::State, KeyField::Date]).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(SchemaError::KeyMismatch { .. })));
    }

    #[test]
    fn test_duplicate_metric() {
        let a = table("a", &[("X", 1.0)]);
        let b = table("a", &[("Y", 1.0)]);
        let err = outer_join(&[&a, &b], &[KeyField::State]).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(SchemaError::DuplicateMetric { .. })));
    }
}
