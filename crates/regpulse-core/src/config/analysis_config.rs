//! Analysis configuration.
//!
//! Cluster count, contamination, and seed are tuning choices, so every one
//! of them is exposed here instead of being fixed in the engine.

use serde::{Deserialize, Serialize};

/// Configuration for the analytics engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// IQR fence multiplier. Default: 1.5.
    pub iqr_multiplier: Option<f64>,
    /// Fraction of rows labeled by the isolation ensemble. Default: 0.10.
    pub contamination: Option<f64>,
    /// Trees in the isolation ensemble. Default: 100.
    pub n_trees: Option<usize>,
    /// Subsample size per isolation tree. Default: 256.
    pub max_samples: Option<usize>,
    /// Seed for every randomized component. Default: 42.
    pub seed: Option<u64>,
    /// Number of region clusters. Default: 4.
    pub cluster_k: Option<usize>,
    /// k-means iteration cap. Default: 300.
    pub max_iterations: Option<usize>,
    /// Minimum |r| for the strong-correlation list. Default: 0.7.
    pub correlation_threshold: Option<f64>,
    /// Quantile of group std devs above which a group is high-variance. Default: 0.9.
    pub high_variance_quantile: Option<f64>,
    /// Length of top-N rankings. Default: 15.
    pub top_n: Option<usize>,
}

impl AnalysisConfig {
    pub fn effective_iqr_multiplier(&self) -> f64 {
        self.iqr_multiplier.unwrap_or(1.5)
    }

    pub fn effective_contamination(&self) -> f64 {
        self.contamination.unwrap_or(0.10)
    }

    pub fn effective_n_trees(&self) -> usize {
        self.n_trees.unwrap_or(100)
    }

    pub fn effective_max_samples(&self) -> usize {
        self.max_samples.unwrap_or(256)
    }

    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(42)
    }

    pub fn effective_cluster_k(&self) -> usize {
        self.cluster_k.unwrap_or(4)
    }

    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations.unwrap_or(300)
    }

    pub fn effective_correlation_threshold(&self) -> f64 {
        self.correlation_threshold.unwrap_or(0.7)
    }

    pub fn effective_high_variance_quantile(&self) -> f64 {
        self.high_variance_quantile.unwrap_or(0.9)
    }

    pub fn effective_top_n(&self) -> usize {
        self.top_n.unwrap_or(15)
    }
}
