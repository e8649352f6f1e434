//! The plain-data result of a pipeline run.

use regpulse_core::errors::{AnalysisError, RegpulseErrorCode};
use regpulse_core::Family;
use serde::Serialize;

use crate::aggregation::AggregateTable;
use crate::clustering::ClusterResult;
use crate::correlation::CorrelationReport;
use crate::insights::{HighVarianceGroups, KpiSummary, RankedGroup, ServiceRatios};
use crate::outliers::{IqrReport, IsolationReport};
use crate::trends::TrendSummary;

/// An artifact that could not be produced.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFailure {
    pub artifact: String,
    pub code: &'static str,
    pub message: String,
    #[serde(skip)]
    pub error: AnalysisError,
}

impl ArtifactFailure {
    pub fn new(artifact: &str, error: AnalysisError) -> Self {
        Self {
            artifact: artifact.to_string(),
            code: error.error_code(),
            message: error.to_string(),
            error,
        }
    }
}

/// Adult share of each family; `None` where the family total is 0.
#[derive(Debug, Clone, Serialize)]
pub struct AdultShares {
    pub shares: Vec<(Family, Option<f64>)>,
}

/// Every artifact of one run. A `None` artifact has a matching entry in
/// `failures`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsReport {
    pub kpis: Option<KpiSummary>,
    pub service_ratios: Option<ServiceRatios>,
    pub adult_shares: Option<AdultShares>,
    pub state_aggregates: Option<Vec<AggregateTable>>,
    pub region_aggregates: Option<AggregateTable>,
    pub top_states: Option<Vec<RankedGroup>>,
    pub high_variance_regions: Option<HighVarianceGroups>,
    pub iqr_outliers: Option<IqrReport>,
    pub isolation_outliers: Option<IsolationReport>,
    pub clusters: Option<ClusterResult>,
    pub correlation: Option<CorrelationReport>,
    pub enrollment_trend: Option<TrendSummary>,
    pub failures: Vec<ArtifactFailure>,
    pub elapsed_ms: u64,
}

impl AnalyticsReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure(&self, artifact: &str) -> Option<&ArtifactFailure> {
        self.failures.iter().find(|f| f.artifact == artifact)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
