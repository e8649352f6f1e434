//! Isolation ensemble: randomized partition trees over a feature matrix.
//!
//! Points that are isolated after few random splits are anomalous. The
//! anomaly score is `2^(-E[h(x)] / c(psi))`, where `h` is the path length
//! in one tree and `c(psi)` the expected path length of an unsuccessful
//! BST search over the subsample size. Labels are rank based: exactly
//! `round(contamination * N)` of the highest scores are flagged.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use regpulse_core::config::AnalysisConfig;
use regpulse_core::errors::{AnalysisError, AnalysisResult, SchemaError};
use regpulse_core::traits::Cancellable;
use regpulse_core::types::table::Column;
use regpulse_core::{Family, RecordTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{DeviationScore, OutlierFlag, OutlierMethod, SignificanceTier};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Numeric features of every row, one inner vector per row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build from explicit rows; every row must have one value per name.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> AnalysisResult<Self> {
        if let Some(bad) = rows.iter().position(|r| r.len() != names.len()) {
            return Err(AnalysisError::invalid(
                "feature_matrix",
                format!("row {bad} has {} values, expected {}", rows[bad].len(), names.len()),
            ));
        }
        Ok(Self { names, rows })
    }

    /// Selected columns of a record table; missing counts read as 0.
    pub fn from_table(table: &RecordTable, columns: &[&str]) -> Result<Self, SchemaError> {
        let resolved: Vec<Column> = columns
            .iter()
            .map(|c| table.column(c))
            .collect::<Result<_, _>>()?;
        let rows = table
            .records()
            .iter()
            .map(|r| resolved.iter().map(|c| c.read(r).unwrap_or(0.0)).collect())
            .collect();
        Ok(Self {
            names: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Category counts plus month and day.
    pub fn for_table(table: &RecordTable) -> Result<Self, SchemaError> {
        Self::from_table(table, &Self::default_columns(table.family()))
    }

    pub fn default_columns(family: Family) -> Vec<&'static str> {
        family
            .categories()
            .iter()
            .copied()
            .chain(["month", "day"])
            .collect()
    }

    pub fn names(&self) -> &[String] {
        &self.names
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

    /// Whether any column holds at least two distinct values.
    pub fn has_variance(&self) -> bool {
        (0..self.names.len()).any(|col| {
            let mut values = self.rows.iter().map(|r| r[col]);
            match values.next() {
                Some(first) => values.any(|v| v != first),
                None => false,
            }
        })
    }
}

/// Ensemble parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolationParams {
    pub n_trees: usize,
    /// Subsample size per tree, capped at the population size.
    pub max_samples: usize,
    /// Fraction of the population labeled as outliers.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.10,
            seed: 42,
        }
    }
}

impl IsolationParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            n_trees: config.effective_n_trees(),
            max_samples: config.effective_max_samples(),
            contamination: config.effective_contamination(),
            seed: config.effective_seed(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    fn validate(&self) -> AnalysisResult<()> {
        if self.n_trees == 0 {
            return Err(AnalysisError::invalid("n_trees", "must be at least 1"));
        }
        if self.max_samples < 2 {
            return Err(AnalysisError::invalid("max_samples", "must be at least 2"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnalysisError::invalid("contamination", "must be in (0.0, 0.5]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

impl Node {
    fn build(
        data: &[Vec<f64>],
        members: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Self {
        if depth >= max_depth || members.len() <= 1 {
            return Self::Leaf {
                size: members.len(),
            };
        }

        // Only features that still vary inside this node can split it.
        let n_features = data[members[0]].len();
        let varying: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|f| {
                let (min, max) = members.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| (lo.min(data[i][f]), hi.max(data[i][f])),
                );
                (max > min).then_some((f, min, max))
            })
            .collect();
        if varying.is_empty() {
            return Self::Leaf {
                size: members.len(),
            };
        }

        let (feature, min, max) = varying[rng.gen_range(0..varying.len())];
        let value = rng.gen_range(min..max);
        let (left, right): (Vec<usize>, Vec<usize>) =
            members.iter().partition(|&&i| data[i][feature] < value);

        Self::Split {
            feature,
            value,
            left: Box::new(Self::build(data, &left, depth + 1, max_depth, rng)),
            right: Box::new(Self::build(data, &right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, sample: &[f64], depth: usize) -> f64 {
        match self {
            Self::Leaf { size } => depth as f64 + average_path_length(*size),
            Self::Split {
                feature,
                value,
                left,
                right,
            } => {
                if sample[*feature] < *value {
                    left.path_length(sample, depth + 1)
                } else {
                    right.path_length(sample, depth + 1)
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search among `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// A fitted ensemble of isolation trees.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `params.n_trees` trees on subsamples of `matrix`, drawn without
    /// replacement. Checks `cancel` between trees.
    pub fn fit(
        matrix: &FeatureMatrix,
        params: &IsolationParams,
        cancel: &dyn Cancellable,
    ) -> AnalysisResult<Self> {
        params.validate()?;
        if matrix.len() < 2 {
            return Err(AnalysisError::insufficient(
                "isolation ensemble",
                format!("{} rows, need at least 2", matrix.len()),
            ));
        }
        if !matrix.has_variance() {
            return Err(AnalysisError::insufficient(
                "isolation ensemble",
                "insufficient variance: no feature has two distinct values",
            ));
        }

        let sample_size = params.max_samples.min(matrix.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        for _ in 0..params.n_trees {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let members = index::sample(&mut rng, matrix.len(), sample_size).into_vec();
            trees.push(Node::build(matrix.rows(), &members, 0, max_depth, &mut rng));
        }

        debug!(
            trees = trees.len(),
            sample_size,
            max_depth,
            features = matrix.names().len(),
            "isolation ensemble fitted"
        );
        Ok(Self { trees, sample_size })
    }

    /// Anomaly score in (0, 1]; higher is more anomalous.
    pub fn score(&self, sample: &[f64]) -> f64 {
        let mean_path = self
            .trees
            .iter()
            .map(|t| t.path_length(sample, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        let c = average_path_length(self.sample_size);
        2f64.powf(-mean_path / c)
    }

    pub fn scores(&self, matrix: &FeatureMatrix) -> Vec<f64> {
        matrix.rows().iter().map(|r| self.score(r)).collect()
    }
}

/// Scores and rank-based labels for every row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationReport {
    pub params: IsolationParams,
    pub feature_names: Vec<String>,
    /// One flag per row, in input order.
    pub flags: Vec<OutlierFlag>,
    /// Lowest score among flagged rows; `None` when nothing is flagged.
    pub cutoff: Option<f64>,
}

impl IsolationReport {
    pub fn outliers(&self) -> impl Iterator<Item = &OutlierFlag> {
        self.flags.iter().filter(|f| f.is_outlier)
    }

    pub fn outlier_indices(&self) -> Vec<usize> {
        self.outliers().map(|f| f.index).collect()
    }
}

/// Fit an ensemble on `matrix` and label the top `round(contamination * N)`
/// scores. Ties at the cutoff go to the earlier row.
pub fn detect(
    matrix: &FeatureMatrix,
    params: &IsolationParams,
    cancel: &dyn Cancellable,
) -> AnalysisResult<IsolationReport> {
    let forest = IsolationForest::fit(matrix, params, cancel)?;
    let scores = forest.scores(matrix);

    let n_flag = ((params.contamination * scores.len() as f64).round() as usize).min(scores.len());
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut is_outlier = vec![false; scores.len()];
    for &idx in &order[..n_flag] {
        is_outlier[idx] = true;
    }
    let cutoff = n_flag.checked_sub(1).map(|last| scores[order[last]]);

    let flags = scores
        .iter()
        .zip(is_outlier)
        .enumerate()
        .map(|(index, (&score, is_outlier))| {
            let deviation = DeviationScore::new(score);
            OutlierFlag {
                index,
                method: OutlierMethod::IsolationEnsemble,
                score,
                deviation_score: deviation,
                significance: SignificanceTier::from_deviation(deviation.value()),
                is_outlier,
            }
        })
        .collect();

    Ok(IsolationReport {
        params: *params,
        feature_names: matrix.names().to_vec(),
        flags,
        cutoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regpulse_core::traits::CancellationToken;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        FeatureMatrix::from_rows((0..width).map(|i| format!("f{i}")).collect(), rows).unwrap()
    }

    fn cluster_with_spike() -> FeatureMatrix {
        let mut rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![10.0 + (i % 5) as f64, 20.0 + (i % 3) as f64])
            .collect();
        rows.push(vec![500.0, 900.0]);
        matrix(rows)
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // 2 * (ln 255 + gamma) - 2 * 255 / 256
        assert!((average_path_length(256) - 10.244_770_920_116_851).abs() < 1e-6);
    }

    #[test]
    fn test_spike_scores_highest() {
        let m = cluster_with_spike();
        let params = IsolationParams::default().with_contamination(0.025);
        let report = detect(&m, &params, &CancellationToken::new()).unwrap();
        assert_eq!(report.outlier_indices(), vec![40]);
        let spike = report.flags[40].score;
        assert!(report.flags[..40].iter().all(|f| f.score < spike));
    }

    #[test]
    fn test_same_seed_same_scores() {
        let m = cluster_with_spike();
        let params = IsolationParams::default().with_seed(7);
        let token = CancellationToken::new();
        let a = detect(&m, &params, &token).unwrap();
        let b = detect(&m, &params, &token).unwrap();
        let sa: Vec<f64> = a.flags.iter().map(|f| f.score).collect();
        let sb: Vec<f64> = b.flags.iter().map(|f| f.score).collect();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_flag_count_is_rank_based() {
        let m = cluster_with_spike();
        let params = IsolationParams::default().with_contamination(0.1);
        let report = detect(&m, &params, &CancellationToken::new()).unwrap();
        // round(0.1 * 41) = 4
        assert_eq!(report.outlier_indices().len(), 4);
        assert!(report.cutoff.is_some());
    }

    #[test]
    fn test_constant_features_are_insufficient() {
        let m = matrix(vec![vec![3.0, 3.0]; 10]);
        let err = detect(&m, &IsolationParams::default(), &CancellationToken::new()).unwrap_err();
        assert!(err.is_insufficient());
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let m = matrix(vec![vec![1.0]]);
        let err = detect(&m, &IsolationParams::default(), &CancellationToken::new()).unwrap_err();
        assert!(err.is_insufficient());
    }

    #[test]
    fn test_cancelled_fit_is_abandoned() {
        let token = CancellationToken::new();
        token.cancel();
        let err = detect(&cluster_with_spike(), &IsolationParams::default(), &token).unwrap_err();
        assert_eq!(err, AnalysisError::Cancelled);
    }

    #[test]
    fn test_invalid_contamination() {
        let params = IsolationParams::default().with_contamination(0.0);
        let err = detect(&cluster_with_spike(), &params, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = FeatureMatrix::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![3.0]],
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }
}
