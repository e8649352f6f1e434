//! Schema errors: a required field is absent or join keys disagree.

use super::error_code::{self, RegpulseErrorCode};

/// Fatal for the artifact that requested the field; other artifacts proceed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Field `{field}` is not defined for {family} records")]
    UnknownField { field: String, family: String },

    #[error("Column `{column}` missing from {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Record at row {row} has {actual} counts, {family} declares {expected}")]
    CountArity {
        row: usize,
        family: String,
        expected: usize,
        actual: usize,
    },

    #[error("Metric `{metric}` is not present in the aggregate")]
    UnknownMetric { metric: String },

    #[error("Join key mismatch: [{left}] vs [{right}]")]
    KeyMismatch { left: String, right: String },

    #[error("Metric `{metric}` appears in more than one joined table")]
    DuplicateMetric { metric: String },

    #[error("Time series requires an aggregate grouped by date alone, got [{keys}]")]
    NotATimeSeries { keys: String },
}

impl RegpulseErrorCode for SchemaError {
    fn error_code(&self) -> &'static str {
        error_code::SCHEMA_MISMATCH
    }
}
