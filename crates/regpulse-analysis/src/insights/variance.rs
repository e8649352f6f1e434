//! Groups with unusually volatile activity.

use regpulse_core::errors::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

use super::ranking::RankedGroup;
use crate::aggregation::AggregateTable;
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighVarianceGroups {
    pub quantile: f64,
    /// Std dev at `quantile` over every group with a defined std dev.
    pub threshold: Option<f64>,
    /// Groups above the threshold, most volatile first; `value` is the
    /// group's std dev.
    pub groups: Vec<RankedGroup>,
}

/// Groups whose `metric` std dev exceeds the `quantile` of all defined
/// group std devs. Single-row groups have none and never qualify.
pub fn high_variance_groups(
    aggregate: &AggregateTable,
    metric: &str,
    quantile: f64,
) -> AnalysisResult<HighVarianceGroups> {
    if !(0.0..=1.0).contains(&quantile) {
        return Err(AnalysisError::invalid("high_variance_quantile", "must be between 0.0 and 1.0"));
    }
    let summaries = aggregate.summaries(metric)?;
    let defined: Vec<f64> = summaries.iter().filter_map(|s| s.std_dev).collect();
    let threshold = stats::quantile(&defined, quantile);

    let mut groups: Vec<RankedGroup> = match threshold {
        Some(t) => aggregate
            .rows()
            .iter()
            .zip(&summaries)
            .filter_map(|(row, s)| {
                let sd = s.std_dev?;
                (sd > t).then(|| RankedGroup {
                    key: row.key.clone(),
                    value: sd,
                })
            })
            .collect(),
        None => Vec::new(),
    };
    groups.sort_by(|a, b| b.value.total_cmp(&a.value));

    Ok(HighVarianceGroups {
        quantile,
        threshold,
        groups,
    })
}
