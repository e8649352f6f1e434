//! Core types for outlier detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one detection method for a single row or group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierFlag {
    /// Index into the scored population (row order of the input).
    pub index: usize,
    /// Method that produced this flag.
    pub method: OutlierMethod,
    /// Method-specific score: signed fence distance for IQR, anomaly
    /// score in (0, 1] for the isolation ensemble.
    pub score: f64,
    /// Normalized deviation score [0.0, 1.0].
    pub deviation_score: DeviationScore,
    /// Significance tier.
    pub significance: SignificanceTier,
    pub is_outlier: bool,
}

/// Normalized deviation score in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationScore(f64);

impl DeviationScore {
    /// Create a new deviation score, clamped to [0.0, 1.0].
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Zero deviation (not an outlier).
    pub fn zero() -> Self {
        Self(0.0)
    }
}

impl fmt::Display for DeviationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Significance tiers for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceTier {
    Critical,
    High,
    Moderate,
    Low,
}

impl SignificanceTier {
    /// Classify from a deviation score.
    pub fn from_deviation(score: f64) -> Self {
        if score >= 0.9 {
            Self::Critical
        } else if score >= 0.7 {
            Self::High
        } else if score >= 0.4 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for SignificanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detection method. The two methods are reported independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    IsolationEnsemble,
}

impl OutlierMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::IsolationEnsemble => "isolation_ensemble",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
