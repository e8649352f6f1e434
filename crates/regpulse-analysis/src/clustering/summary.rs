//! Per-cluster statistics recomputed after assignment.
//!
//! Cluster ids carry no meaning on their own; readers should describe a
//! cluster through these summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::features::FeatureTable;

const TOP_STATES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub size: usize,
    /// Mean of every raw feature over the members, aligned with the
    /// feature table's names. `None` when the cluster has no members.
    pub feature_means: Vec<Option<f64>>,
    /// Most frequent member states, by count then name.
    pub top_states: Vec<(String, usize)>,
}

pub fn summarize(table: &FeatureTable, labels: &[usize], k: usize) -> Vec<ClusterSummary> {
    (0..k)
        .map(|cluster| {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == cluster)
                .map(|(i, _)| i)
                .collect();
            let size = members.len();

            let feature_means = (0..table.names().len())
                .map(|col| {
                    (size > 0).then(|| {
                        members.iter().map(|&i| table.rows()[i][col]).sum::<f64>() / size as f64
                    })
                })
                .collect();

            let mut states: BTreeMap<&str, usize> = BTreeMap::new();
            for &i in &members {
                *states.entry(table.regions()[i].state.as_str()).or_insert(0) += 1;
            }
            let mut top_states: Vec<(String, usize)> =
                states.into_iter().map(|(s, n)| (s.to_string(), n)).collect();
            // Stable sort keeps the name order among equal counts.
            top_states.sort_by(|a, b| b.1.cmp(&a.1));
            top_states.truncate(TOP_STATES);

            ClusterSummary {
                cluster,
                size,
                feature_means,
                top_states,
            }
        })
        .collect()
}
