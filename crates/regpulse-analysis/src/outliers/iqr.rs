//! IQR with Tukey fences.
//!
//! Quartiles use linear interpolation between order statistics, so fences
//! are reproducible. Uses Q1 - k*IQR and Q3 + k*IQR (k = 1.5 default).

use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::RecordTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{DeviationScore, OutlierFlag, OutlierMethod, SignificanceTier};
use crate::aggregation::AggregateTable;
use crate::stats;

/// Fences and one flag per input value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IqrReport {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    pub multiplier: f64,
    /// One flag per value, in input order.
    pub flags: Vec<OutlierFlag>,
}

impl IqrReport {
    pub fn outliers(&self) -> impl Iterator<Item = &OutlierFlag> {
        self.flags.iter().filter(|f| f.is_outlier)
    }

    pub fn outlier_indices(&self) -> Vec<usize> {
        self.outliers().map(|f| f.index).collect()
    }
}

/// Detect outliers in `values` using Tukey fences at `multiplier`.
pub fn detect(values: &[f64], multiplier: f64) -> AnalysisResult<IqrReport> {
    if !(multiplier > 0.0 && multiplier.is_finite()) {
        return Err(AnalysisError::invalid("iqr_multiplier", "must be a positive number"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let (Some(q1), Some(q3)) = (
        stats::quantile_sorted(&sorted, 0.25),
        stats::quantile_sorted(&sorted, 0.75),
    ) else {
        return Err(AnalysisError::insufficient("iqr", "empty population"));
    };
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    let flags: Vec<OutlierFlag> = values
        .iter()
        .enumerate()
        .map(|(index, &val)| {
            let score = if val < lower {
                val - lower
            } else if val > upper {
                val - upper
            } else {
                0.0
            };
            let is_outlier = score != 0.0;
            let deviation = if !is_outlier {
                DeviationScore::zero()
            } else if iqr > 0.0 {
                let distance = score.abs() / iqr;
                DeviationScore::new(distance / (distance + multiplier))
            } else {
                // Every other value sits on the fences.
                DeviationScore::new(1.0)
            };
            OutlierFlag {
                index,
                method: OutlierMethod::Iqr,
                score,
                deviation_score: deviation,
                significance: SignificanceTier::from_deviation(deviation.value()),
                is_outlier,
            }
        })
        .collect();

    debug!(
        n = values.len(),
        q1,
        q3,
        flagged = flags.iter().filter(|f| f.is_outlier).count(),
        "iqr fences computed"
    );

    Ok(IqrReport {
        q1,
        q3,
        iqr,
        lower,
        upper,
        multiplier,
        flags,
    })
}

/// IQR over one column of a record table; missing counts read as 0.
pub fn detect_column(
    table: &RecordTable,
    field: &str,
    multiplier: f64,
) -> AnalysisResult<IqrReport> {
    let values = table.values(field)?;
    detect(&values, multiplier)
}

/// IQR over the per-group sums of an aggregate metric.
pub fn detect_groups(
    aggregate: &AggregateTable,
    metric: &str,
    multiplier: f64,
) -> AnalysisResult<IqrReport> {
    let values = aggregate.sums(metric)?;
    detect(&values, multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iqr_no_outliers() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let report = detect(&values, 1.5).unwrap();
        assert!(report.outlier_indices().is_empty());
        assert_eq!(report.flags.len(), 20);
    }

    #[test]
    fn test_fences_use_linear_interpolation() {
        let report = detect(&[1.0, 2.0, 3.0, 4.0], 1.5).unwrap();
        assert!((report.q1 - 1.75).abs() < 1e-12);
        assert!((report.q3 - 3.25).abs() < 1e-12);
        assert!((report.lower - (-0.5)).abs() < 1e-12);
        assert!((report.upper - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_spike_scored_by_signed_distance() {
        let report = detect(&[10.0, 10.0, 10.0, 100.0], 1.5).unwrap();
        // Q1 = 10, Q3 = 32.5, upper = 66.25
        assert_eq!(report.outlier_indices(), vec![3]);
        assert!((report.flags[3].score - 33.75).abs() < 1e-9);
        assert_eq!(report.flags[0].score, 0.0);
    }

    #[test]
    fn test_low_outlier_scores_negative() {
        let mut values = vec![50.0; 10];
        values.extend([49.0, 51.0, 52.0, 48.0]);
        values.push(-100.0);
        let report = detect(&values, 1.5).unwrap();
        let flag = &report.flags[values.len() - 1];
        assert!(flag.is_outlier);
        assert!(flag.score < 0.0);
    }

    #[test]
    fn test_zero_iqr_flags_any_departure() {
        let mut values = vec![5.0; 20];
        values[7] = 6.0;
        let report = detect(&values, 1.5).unwrap();
        assert_eq!(report.outlier_indices(), vec![7]);
        assert_eq!(report.flags[7].significance, SignificanceTier::Critical);
    }

    #[test]
    fn test_empty_is_insufficient() {
        assert!(detect(&[], 1.5).unwrap_err().is_insufficient());
    }

    #[test]
    fn test_bad_multiplier_rejected() {
        assert!(matches!(
            detect(&[1.0, 2.0], 0.0),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }
}
