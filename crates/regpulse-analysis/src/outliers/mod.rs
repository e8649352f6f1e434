//! Outlier detection with two independent methods:
//! - IQR with Tukey fences over one numeric field
//! - Isolation ensemble over a multi-column feature matrix
//!
//! Each method reports its own flags; a row may carry one flag per method
//! and no cross-method deduplication is performed.

pub mod iqr;
pub mod isolation;
pub mod types;

pub use iqr::IqrReport;
pub use isolation::{FeatureMatrix, IsolationForest, IsolationParams, IsolationReport};
pub use types::{DeviationScore, OutlierFlag, OutlierMethod, SignificanceTier};
