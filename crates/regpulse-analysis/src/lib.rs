//! regpulse-analysis: the statistical analytics engine.
//!
//! Dependency chain: Aggregation → (Outliers ∥ Clustering ∥ Correlation ∥ Trends),
//! with Insights reading aggregates and the Pipeline running every artifact
//! side by side over the same read-only dataset.

pub mod aggregation;
pub mod clustering;
pub mod correlation;
pub mod insights;
pub mod outliers;
pub mod pipeline;
pub mod stats;
pub mod trends;

pub use aggregation::{aggregate, AggregateTable, TimeSeries};
pub use pipeline::{AnalyticsPipeline, AnalyticsReport};
