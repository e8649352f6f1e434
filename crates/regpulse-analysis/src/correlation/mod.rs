//! Correlation engine: Pearson correlation across family aggregates that
//! share a region/date key.

pub mod join;
pub mod matrix;
pub mod pearson;

pub use join::{outer_join, JoinedTable};
pub use matrix::{CorrelationMatrix, CorrelationPair};
pub use pearson::pearson;

use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::KeyField;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::AggregateTable;

/// Matrix plus the derived strong-correlation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub join_keys: Vec<KeyField>,
    pub matrix: CorrelationMatrix,
    pub threshold: f64,
    pub strong: Vec<CorrelationPair>,
}

/// Outer-join `tables` on `join_keys` (zero-filled) and correlate every
/// metric column pair.
pub fn correlate(
    tables: &[&AggregateTable],
    join_keys: &[KeyField],
) -> AnalysisResult<CorrelationMatrix> {
    let joined = outer_join(tables, join_keys)?;
    if joined.is_empty() {
        return Err(AnalysisError::insufficient("correlation", "join produced no rows"));
    }
    debug!(rows = joined.len(), metrics = joined.names.len(), "aggregates joined");
    Ok(CorrelationMatrix::from_columns(joined.names, &joined.columns))
}

/// [`correlate`] plus pairs whose |r| exceeds `threshold`.
pub fn correlate_with_threshold(
    tables: &[&AggregateTable],
    join_keys: &[KeyField],
    threshold: f64,
) -> AnalysisResult<CorrelationReport> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AnalysisError::invalid("correlation_threshold", "must be between 0.0 and 1.0"));
    }
    let matrix = correlate(tables, join_keys)?;
    let strong = matrix.strong_pairs(threshold);
    Ok(CorrelationReport {
        join_keys: join_keys.to_vec(),
        matrix,
        threshold,
        strong,
    })
}
