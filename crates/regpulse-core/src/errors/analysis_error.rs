//! Analysis errors, scoped to a single analytic artifact.

use super::error_code::{self, RegpulseErrorCode};
use super::SchemaError;

/// Errors that end the computation of one artifact.
///
/// `InsufficientData` is the well-defined "not computable" outcome for a
/// unit of work; the pipeline records it and keeps producing the others.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Schema mismatch: {0}")]
    Schema(#[from] SchemaError),

    #[error("Insufficient data for {unit}: {reason}")]
    InsufficientData { unit: String, reason: String },

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Analysis budget of {budget_ms}ms exceeded")]
    BudgetExceeded { budget_ms: u64 },

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn insufficient(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

impl RegpulseErrorCode for AnalysisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(e) => e.error_code(),
            Self::InsufficientData { .. } => error_code::INSUFFICIENT_DATA,
            Self::InvalidParameter { .. } => error_code::INVALID_PARAMETER,
            Self::BudgetExceeded { .. } => error_code::BUDGET_EXCEEDED,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
