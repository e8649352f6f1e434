//! Region feature tables: one usage-profile row per region.

use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::{Family, KeyField, KeyValue, RecordTable, Region};
use serde::{Deserialize, Serialize};

use crate::aggregation::{aggregate_with, AggregateOptions};

/// Named numeric features for a set of regions. Never mutated by the
/// cluster engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    names: Vec<String>,
    regions: Vec<Region>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(
        names: Vec<String>,
        regions: Vec<Region>,
        rows: Vec<Vec<f64>>,
    ) -> AnalysisResult<Self> {
        if regions.len() != rows.len() {
            return Err(AnalysisError::invalid(
                "feature_table",
                format!("{} regions for {} rows", regions.len(), rows.len()),
            ));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != names.len()) {
            return Err(AnalysisError::invalid(
                "feature_table",
                format!("row {bad} has {} values, expected {}", rows[bad].len(), names.len()),
            ));
        }
        Ok(Self {
            names,
            regions,
            rows,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[idx])
    }

    /// A copy holding only `columns`, in the order given.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> AnalysisResult<FeatureTable> {
        let idx = columns
            .iter()
            .map(|c| {
                let c = c.as_ref();
                self.names.iter().position(|n| n == c).ok_or_else(|| {
                    AnalysisError::invalid("feature_table", format!("unknown feature '{c}'"))
                })
            })
            .collect::<AnalysisResult<Vec<usize>>>()?;
        Ok(Self {
            names: idx.iter().map(|&i| self.names[i].clone()).collect(),
            regions: self.regions.clone(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&i| r[i]).collect())
                .collect(),
        })
    }
}

/// The profile columns that describe how a region is used rather than how
/// big it is: category means, mean and std of the total, and pincode reach.
/// Total volume and months active stay in the profile for summaries only.
pub fn clustering_columns(family: Family) -> Vec<String> {
    let total = family.total_name();
    let mut names: Vec<String> = family
        .categories()
        .iter()
        .map(|c| format!("{c}_mean"))
        .collect();
    names.extend([
        format!("{total}_mean"),
        format!("{total}_std"),
        "pincodes".to_string(),
    ]);
    names
}

/// Per-region usage profile of a record table:
/// mean of each category, mean/std/sum of the total, months active, and
/// distinct pincodes. A single-row region has no std; it reads as 0 here.
pub fn region_features(table: &RecordTable) -> AnalysisResult<FeatureTable> {
    let family = table.family();
    let total = family.total_name();
    let metrics: Vec<&str> = family
        .categories()
        .iter()
        .copied()
        .chain(std::iter::once(total))
        .collect();
    let agg = aggregate_with(
        table,
        &[KeyField::State, KeyField::District],
        &metrics,
        &AggregateOptions::with_distinct(&[KeyField::Month, KeyField::Pincode]),
    )?;

    let mut names: Vec<String> = family
        .categories()
        .iter()
        .map(|c| format!("{c}_mean"))
        .collect();
    names.extend([
        format!("{total}_mean"),
        format!("{total}_std"),
        format!("{total}_sum"),
        "months_active".to_string(),
        "pincodes".to_string(),
    ]);

    let n_categories = family.categories().len();
    let mut regions = Vec::with_capacity(agg.len());
    let mut rows = Vec::with_capacity(agg.len());
    for row in agg.rows() {
        let (Some(KeyValue::Text(state)), Some(KeyValue::Text(district))) =
            (row.key.first(), row.key.get(1))
        else {
            continue;
        };
        regions.push(Region::new(state.as_str(), district.as_str()));

        let total_summary = &row.metrics[n_categories];
        let mut features: Vec<f64> = row.metrics[..n_categories].iter().map(|m| m.mean).collect();
        features.extend([
            total_summary.mean,
            total_summary.std_dev.unwrap_or(0.0),
            total_summary.sum,
            row.distinct[0] as f64,
            row.distinct[1] as f64,
        ]);
        rows.push(features);
    }

    FeatureTable::new(names, regions, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regpulse_core::{Family, Record};

    fn rec(district: &str, month: u32, pin: Option<u32>, c: [u64; 2]) -> Record {
        Record::new(
            Region::new("Assam", district),
            NaiveDate::from_ymd_opt(2025, month, 1).unwrap(),
            pin,
            c.iter().map(|&x| Some(x)).collect(),
        )
    }

    #[test]
    fn test_region_profile() {
        let table = RecordTable::new(
            Family::Biometric,
            vec![
                rec("Cachar", 1, Some(788001), [2, 4]),
                rec("Cachar", 2, Some(788002), [4, 6]),
                rec("Cachar", 2, None, [0, 0]),
                rec("Dhubri", 3, Some(783301), [10, 10]),
            ],
        )
        .unwrap();
        let ft = region_features(&table).unwrap();
        assert_eq!(ft.len(), 2);
        assert_eq!(ft.names().len(), 7);
        assert_eq!(ft.regions()[0], Region::new("Assam", "Cachar"));

        let cachar = &ft.rows()[0];
        assert!((cachar[0] - 2.0).abs() < 1e-12); // bio_age_5_17 mean
        assert!((cachar[2] - 16.0 / 3.0).abs() < 1e-12); // total mean
        assert_eq!(cachar[4], 16.0); // total sum
        assert_eq!(cachar[5], 2.0); // months active
        assert_eq!(cachar[6], 2.0); // pincodes, missing not counted

        let dhubri = &ft.rows()[1];
        assert_eq!(dhubri[3], 0.0); // singleton std reads as 0
    }

    #[test]
    fn test_clustering_columns_exclude_volume() {
        let table = RecordTable::new(
            Family::Enrollment,
            vec![
                Record::new(
                    Region::new("Goa", "North Goa"),
                    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    Some(403001),
                    [Some(1), Some(2), Some(3)].into_iter().collect(),
                ),
            ],
        )
        .unwrap();
        let profile = region_features(&table).unwrap();
        let columns = clustering_columns(Family::Enrollment);
        assert_eq!(columns.len(), 6);
        assert!(!columns.contains(&"total_enroll_sum".to_string()));
        assert!(!columns.contains(&"months_active".to_string()));

        let selected = profile.select(&columns).unwrap();
        assert_eq!(selected.names(), columns.as_slice());
        assert_eq!(selected.rows()[0], vec![1.0, 2.0, 3.0, 6.0, 0.0, 1.0]);
        assert_eq!(selected.regions(), profile.regions());
    }

    #[test]
    fn test_select_unknown_feature() {
        let table = FeatureTable::new(vec!["a".into()], vec![Region::new("A", "B")], vec![vec![1.0]])
            .unwrap();
        let err = table.select(&["b"]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn test_ragged_table_rejected() {
        let err = FeatureTable::new(
            vec!["a".into()],
            vec![Region::new("A", "B")],
            vec![vec![1.0, 2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }
}
