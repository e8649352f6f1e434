//! Aggregation: group-level summaries of record tables.
//!
//! Groups by any ordered list of key fields and reports sum, mean, sample
//! standard deviation, row count, and distinct-subkey counts per group.
//! Every call returns a fresh table; inputs are never touched.

pub mod grouper;
pub mod series;
pub mod types;

pub use grouper::{aggregate, aggregate_with};
pub use series::TimeSeries;
pub use types::{AggregateOptions, AggregateRow, AggregateTable, MetricSummary};
