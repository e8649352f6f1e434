//! Cluster engine: groups regions into k behavioral clusters.
//!
//! Pipeline: feature table → standardization (zero-variance columns
//! dropped) → k-means++ seeded Lloyd iterations → per-cluster summaries.

pub mod features;
pub mod kmeans;
pub mod standardize;
pub mod summary;

pub use features::{clustering_columns, region_features, FeatureTable};
pub use kmeans::{KMeans, KMeansFit};
pub use standardize::Standardizer;
pub use summary::ClusterSummary;

use regpulse_core::config::AnalysisConfig;
use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::traits::Cancellable;
use regpulse_core::Region;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One region's cluster and the standardized features used to place it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub region: Region,
    /// In `[0, k)`; an arbitrary partition label.
    pub cluster: usize,
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterParams {
    pub k: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl ClusterParams {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            max_iterations: 300,
            seed,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            k: config.effective_cluster_k(),
            max_iterations: config.effective_max_iterations(),
            seed: config.effective_seed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub k: usize,
    /// Features that entered the distance computation.
    pub feature_names: Vec<String>,
    /// Zero-variance features left out of this run.
    pub dropped_features: Vec<String>,
    pub assignments: Vec<ClusterAssignment>,
    /// Centroids in standardized feature space.
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
    pub summaries: Vec<ClusterSummary>,
}

impl ClusterResult {
    pub fn labels(&self) -> Vec<usize> {
        self.assignments.iter().map(|a| a.cluster).collect()
    }
}

/// Cluster the regions of `table` into `params.k` groups on every column.
pub fn cluster(
    table: &FeatureTable,
    params: &ClusterParams,
    cancel: &dyn Cancellable,
) -> AnalysisResult<ClusterResult> {
    cluster_on(table, table.names(), params, cancel)
}

/// Cluster the regions of `profile` on `columns` only. Summaries still
/// report the means of every profile column.
pub fn cluster_on<S: AsRef<str>>(
    profile: &FeatureTable,
    columns: &[S],
    params: &ClusterParams,
    cancel: &dyn Cancellable,
) -> AnalysisResult<ClusterResult> {
    let table = &profile.select(columns)?;
    if params.k == 0 {
        return Err(AnalysisError::invalid("k", "must be at least 1"));
    }
    if table.len() < params.k {
        return Err(AnalysisError::insufficient(
            "clustering",
            format!("{} regions for {} clusters", table.len(), params.k),
        ));
    }

    let standardizer = Standardizer::fit(table);
    if standardizer.n_features() == 0 {
        return Err(AnalysisError::insufficient(
            "clustering",
            "no feature has non-zero variance",
        ));
    }
    let points = standardizer.transform(table);
    // Fewer distinct points than k surfaces as insufficient data from the fit.
    let fit = KMeans::new(params.k, params.max_iterations, params.seed).fit(&points, cancel)?;
    let summaries = summary::summarize(profile, &fit.labels, params.k);

    let assignments = table
        .regions()
        .iter()
        .zip(&fit.labels)
        .zip(points)
        .map(|((region, &cluster), features)| ClusterAssignment {
            region: region.clone(),
            cluster,
            features,
        })
        .collect();

    debug!(
        regions = table.len(),
        k = params.k,
        features = standardizer.n_features(),
        "clustered regions"
    );

    Ok(ClusterResult {
        k: params.k,
        feature_names: standardizer.kept_names().to_vec(),
        dropped_features: standardizer.dropped().to_vec(),
        assignments,
        centroids: fit.centroids,
        iterations: fit.iterations,
        converged: fit.converged,
        inertia: fit.inertia,
        summaries,
    })
}
