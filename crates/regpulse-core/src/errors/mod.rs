//! Error handling for regpulse.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod analysis_error;
pub mod config_error;
pub mod error_code;
pub mod ingest_error;
pub mod schema_error;

pub use analysis_error::{AnalysisError, AnalysisResult};
pub use config_error::ConfigError;
pub use error_code::RegpulseErrorCode;
pub use ingest_error::IngestError;
pub use schema_error::SchemaError;
