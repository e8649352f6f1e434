//! regpulse-core: shared foundation for the regpulse analytics engine.
//!
//! Provides the record data model, per-subsystem errors, layered
//! configuration, tracing setup, cancellation, and the CSV ingestion
//! collaborator that produces harmonized record tables.

pub mod config;
pub mod errors;
pub mod ingest;
pub mod tracing;
pub mod traits;
pub mod types;

pub use types::{Family, KeyField, KeyValue, Record, RecordTable, Region};
