//! Top-N groups by a metric.

use regpulse_core::errors::SchemaError;
use regpulse_core::types::collections::KeyVec;
use regpulse_core::KeyValue;
use serde::{Deserialize, Serialize};

use crate::aggregation::AggregateTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub key: KeyVec<KeyValue>,
    pub value: f64,
}

/// The `n` groups with the largest `metric` sum. Equal sums keep key order.
pub fn top_n(
    aggregate: &AggregateTable,
    metric: &str,
    n: usize,
) -> Result<Vec<RankedGroup>, SchemaError> {
    let sums = aggregate.sums(metric)?;
    let mut ranked: Vec<RankedGroup> = aggregate
        .rows()
        .iter()
        .zip(sums)
        .map(|(row, value)| RankedGroup {
            key: row.key.clone(),
            value,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(n);
    Ok(ranked)
}
