//! Ingestion errors raised while reading raw record files.

use super::error_code::{self, RegpulseErrorCode};
use super::SchemaError;

/// Errors that can occur while loading record tables from CSV.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: invalid date `{value}` (expected {format})")]
    InvalidDate {
        path: String,
        line: u64,
        value: String,
        format: String,
    },

    #[error("{path}:{line}: invalid count `{value}` in column `{column}`")]
    InvalidCount {
        path: String,
        line: u64,
        column: String,
        value: String,
    },

    #[error("{path}:{line}: invalid pincode `{value}`")]
    InvalidPincode {
        path: String,
        line: u64,
        value: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl RegpulseErrorCode for IngestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(e) => e.error_code(),
            _ => error_code::INGEST_ERROR,
        }
    }
}
