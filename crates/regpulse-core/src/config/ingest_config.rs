//! Ingestion configuration.

use serde::{Deserialize, Serialize};

/// Where the raw record files live and how their dates are written.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IngestConfig {
    /// `chrono` format string for the `date` column. Default: `%d-%m-%Y`.
    pub date_format: Option<String>,
    pub biometric_files: Vec<String>,
    pub demographic_files: Vec<String>,
    pub enrollment_files: Vec<String>,
}

impl IngestConfig {
    pub fn effective_date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or("%d-%m-%Y")
    }
}
