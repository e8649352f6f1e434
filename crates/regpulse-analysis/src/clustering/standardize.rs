//! Column standardization to zero mean and unit (population) variance.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::features::FeatureTable;
use crate::stats;

/// Relative spread below which a column counts as constant.
const ZERO_VARIANCE: f64 = 1e-12;

/// Fitted per-column mean and standard deviation.
///
/// Zero-variance columns are dropped for the run rather than divided by
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    kept: Vec<usize>,
    means: Vec<f64>,
    std_devs: Vec<f64>,
    kept_names: Vec<String>,
    dropped: Vec<String>,
}

impl Standardizer {
    pub fn fit(table: &FeatureTable) -> Self {
        let mut s = Self {
            kept: Vec::new(),
            means: Vec::new(),
            std_devs: Vec::new(),
            kept_names: Vec::new(),
            dropped: Vec::new(),
        };
        for (idx, name) in table.names().iter().enumerate() {
            let column: Vec<f64> = table.column(idx).collect();
            match (stats::mean(&column), stats::population_std_dev(&column)) {
                (Some(mean), Some(sd)) if sd > ZERO_VARIANCE * mean.abs().max(1.0) => {
                    s.kept.push(idx);
                    s.means.push(mean);
                    s.std_devs.push(sd);
                    s.kept_names.push(name.clone());
                }
                _ => s.dropped.push(name.clone()),
            }
        }
        if !s.dropped.is_empty() {
            warn!(dropped = ?s.dropped, "zero-variance features dropped");
        }
        s
    }

    /// A fresh standardized copy of every row, kept columns only.
    pub fn transform(&self, table: &FeatureTable) -> Vec<Vec<f64>> {
        table
            .rows()
            .iter()
            .map(|row| {
                self.kept
                    .iter()
                    .zip(self.means.iter().zip(&self.std_devs))
                    .map(|(&col, (mean, sd))| (row[col] - mean) / sd)
                    .collect()
            })
            .collect()
    }

    pub fn kept_names(&self) -> &[String] {
        &self.kept_names
    }

    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    pub fn n_features(&self) -> usize {
        self.kept.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regpulse_core::Region;

    fn table(rows: Vec<Vec<f64>>) -> FeatureTable {
        let regions = (0..rows.len()).map(|i| Region::new("S", format!("D{i}"))).collect();
        FeatureTable::new(vec!["a".into(), "flat".into(), "b".into()], regions, rows).unwrap()
    }

    #[test]
    fn test_zero_mean_unit_variance() {
        let t = table(vec![
            vec![1.0, 5.0, 10.0],
            vec![2.0, 5.0, 30.0],
            vec![3.0, 5.0, 20.0],
            vec![6.0, 5.0, 40.0],
        ]);
        let s = Standardizer::fit(&t);
        assert_eq!(s.dropped(), ["flat".to_string()]);
        assert_eq!(s.kept_names(), ["a".to_string(), "b".to_string()]);

        let z = s.transform(&t);
        for col in 0..2 {
            let values: Vec<f64> = z.iter().map(|r| r[col]).collect();
            assert!(stats::mean(&values).unwrap().abs() < 1e-12);
            assert!((stats::population_std_dev(&values).unwrap() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let t = table(vec![vec![1.0, 5.0, 10.0], vec![3.0, 5.0, 20.0]]);
        let before = t.clone();
        let _ = Standardizer::fit(&t).transform(&t);
        assert_eq!(t, before);
    }
}
