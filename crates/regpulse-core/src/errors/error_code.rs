//! RegpulseErrorCode trait for reporting collaborators.

/// Trait for attaching a stable error code to regpulse errors.
/// Every error enum implements this so that report writers can
/// key on a code string instead of parsing messages.
pub trait RegpulseErrorCode {
    /// Returns the error code string (e.g., "SCHEMA_MISMATCH").
    fn error_code(&self) -> &'static str;

    /// Returns the tagged error string: `[ERROR_CODE] message`.
    fn tagged(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SCHEMA_MISMATCH: &str = "SCHEMA_MISMATCH";
pub const INGEST_ERROR: &str = "INGEST_ERROR";
pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
pub const INVALID_PARAMETER: &str = "INVALID_PARAMETER";
pub const BUDGET_EXCEEDED: &str = "BUDGET_EXCEEDED";
pub const CANCELLED: &str = "CANCELLED";
