//! Group-by over record tables.

use std::collections::BTreeMap;

use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::types::collections::{FxHashSet, KeyVec};
use regpulse_core::types::table::Column;
use regpulse_core::{KeyField, KeyValue, RecordTable};
use tracing::debug;

use super::types::{AggregateOptions, AggregateRow, AggregateTable, MetricSummary};
use crate::stats;

/// Per-group accumulator.
struct GroupAcc {
    rows: usize,
    values: Vec<Vec<f64>>,
    distinct: Vec<FxHashSet<KeyValue>>,
}

/// Aggregate `metrics` of `table` by the ordered key fields `group_by`.
///
/// Only key combinations present in the input produce a row; nothing is
/// zero-filled. Missing counts read as 0.
pub fn aggregate(
    table: &RecordTable,
    group_by: &[KeyField],
    metrics: &[&str],
) -> AnalysisResult<AggregateTable> {
    aggregate_with(table, group_by, metrics, &AggregateOptions::default())
}

/// [`aggregate`] with distinct-subkey counts. Missing key values are not
/// counted.
pub fn aggregate_with(
    table: &RecordTable,
    group_by: &[KeyField],
    metrics: &[&str],
    options: &AggregateOptions,
) -> AnalysisResult<AggregateTable> {
    if group_by.is_empty() {
        return Err(AnalysisError::invalid("group_by", "at least one key field is required"));
    }
    let columns: Vec<Column> = metrics
        .iter()
        .map(|m| table.column(m))
        .collect::<Result<_, _>>()?;

    let mut groups: BTreeMap<KeyVec<KeyValue>, GroupAcc> = BTreeMap::new();
    for record in table.records() {
        let key: KeyVec<KeyValue> = group_by.iter().map(|f| record.key_value(*f)).collect();
        let acc = groups.entry(key).or_insert_with(|| GroupAcc {
            rows: 0,
            values: vec![Vec::new(); columns.len()],
            distinct: vec![FxHashSet::default(); options.distinct.len()],
        });
        acc.rows += 1;
        for (slot, col) in acc.values.iter_mut().zip(&columns) {
            slot.push(col.read(record).unwrap_or(0.0));
        }
        for (set, field) in acc.distinct.iter_mut().zip(&options.distinct) {
            match record.key_value(*field) {
                KeyValue::Missing => {}
                value => {
                    set.insert(value);
                }
            }
        }
    }

    let rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(key, acc)| AggregateRow {
            key,
            row_count: acc.rows,
            metrics: acc.values.iter().map(|v| summarize(v)).collect(),
            distinct: acc.distinct.iter().map(FxHashSet::len).collect(),
        })
        .collect();

    debug!(
        family = %table.family(),
        keys = ?group_by,
        groups = rows.len(),
        input_rows = table.len(),
        "aggregated"
    );

    Ok(AggregateTable {
        family: Some(table.family()),
        key_fields: group_by.to_vec(),
        metric_names: metrics.iter().map(|m| m.to_string()).collect(),
        distinct_fields: options.distinct.clone(),
        rows,
    })
}

fn summarize(values: &[f64]) -> MetricSummary {
    let sum: f64 = values.iter().sum();
    MetricSummary {
        sum,
        mean: sum / values.len() as f64,
        std_dev: stats::sample_std_dev(values),
    }
}
