//! k-means with k-means++ seeding and Lloyd iterations.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regpulse_core::errors::{AnalysisError, AnalysisResult};
use regpulse_core::traits::Cancellable;
use regpulse_core::types::collections::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters of one k-means run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KMeans {
    pub k: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

/// Final state of a k-means run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansFit {
    /// Cluster of each point, in input order.
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Lloyd iterations run.
    pub iterations: usize,
    /// `false` when the run stopped at the iteration cap.
    pub converged: bool,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index and squared distance of the nearest centroid; ties go to the
/// lower index.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Number of distinct points, compared bitwise with `-0.0` read as `0.0`.
pub fn distinct_points(points: &[Vec<f64>]) -> usize {
    let keys: FxHashSet<Vec<u64>> = points
        .iter()
        .map(|p| p.iter().map(|x| (x + 0.0).to_bits()).collect())
        .collect();
    keys.len()
}

impl KMeans {
    pub fn new(k: usize, max_iterations: usize, seed: u64) -> Self {
        Self {
            k,
            max_iterations,
            seed,
        }
    }

    /// Cluster `points`. Checks `cancel` once per iteration.
    pub fn fit(&self, points: &[Vec<f64>], cancel: &dyn Cancellable) -> AnalysisResult<KMeansFit> {
        if self.k == 0 {
            return Err(AnalysisError::invalid("k", "must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(AnalysisError::invalid("max_iterations", "must be at least 1"));
        }
        if points.len() < self.k {
            return Err(AnalysisError::insufficient(
                "clustering",
                format!("{} points for {} clusters", points.len(), self.k),
            ));
        }
        let distinct = distinct_points(points);
        if distinct < self.k {
            return Err(AnalysisError::insufficient(
                "clustering",
                format!("{distinct} distinct points for {} clusters", self.k),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.seed_centroids(points, &mut rng);
        let mut labels: Vec<usize> = points.iter().map(|p| nearest(p, &centroids).0).collect();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            iterations += 1;

            centroids = self.update_centroids(points, &mut labels, &centroids);
            let next: Vec<usize> = points.iter().map(|p| nearest(p, &centroids).0).collect();
            if next == labels {
                converged = true;
                break;
            }
            labels = next;
        }

        let inertia: f64 = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum();

        debug!(k = self.k, n = points.len(), iterations, converged, inertia, "k-means finished");
        Ok(KMeansFit {
            labels,
            centroids,
            iterations,
            converged,
            inertia,
        })
    }

    /// k-means++: the first centroid is uniform, each next one is drawn
    /// with probability proportional to its squared distance from the
    /// nearest centroid chosen so far.
    fn seed_centroids(&self, points: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centroids = vec![points[rng.gen_range(0..points.len())].clone()];
        while centroids.len() < self.k {
            let weights: Vec<f64> = points.iter().map(|p| nearest(p, &centroids).1).collect();
            let idx = match WeightedIndex::new(&weights) {
                Ok(dist) => dist.sample(rng),
                // All remaining points coincide with a centroid.
                Err(_) => rng.gen_range(0..points.len()),
            };
            centroids.push(points[idx].clone());
        }
        centroids
    }

    /// Mean of each cluster's members. An empty cluster is re-seeded to the
    /// point furthest from its current nearest centroid, which then joins it.
    fn update_centroids(
        &self,
        points: &[Vec<f64>],
        labels: &mut [usize],
        previous: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let dim = points[0].len();
        let mut sums = vec![vec![0.0; dim]; self.k];
        let mut counts = vec![0usize; self.k];
        for (p, &l) in points.iter().zip(labels.iter()) {
            counts[l] += 1;
            for (s, x) in sums[l].iter_mut().zip(p) {
                *s += x;
            }
        }

        let mut centroids: Vec<Vec<f64>> = sums
            .into_iter()
            .zip(&counts)
            .zip(previous)
            .map(|((sum, &n), prev)| {
                if n == 0 {
                    prev.clone()
                } else {
                    sum.into_iter().map(|s| s / n as f64).collect()
                }
            })
            .collect();

        let empties: Vec<usize> = (0..self.k).filter(|&c| counts[c] == 0).collect();
        for empty in empties {
            if counts[empty] != 0 {
                continue;
            }
            let furthest = points
                .iter()
                .enumerate()
                .filter(|(i, _)| counts[labels[*i]] > 1)
                .map(|(i, p)| (i, squared_distance(p, &centroids[labels[i]])))
                .fold(None, |best: Option<(usize, f64)>, cur| match best {
                    Some(b) if b.1 >= cur.1 => Some(b),
                    _ => Some(cur),
                });
            if let Some((idx, _)) = furthest {
                debug!(cluster = empty, point = idx, "re-seeding empty cluster");
                counts[labels[idx]] -= 1;
                labels[idx] = empty;
                counts[empty] = 1;
                centroids[empty] = points[idx].clone();
            }
        }
        centroids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regpulse_core::traits::CancellationToken;

    fn same_partition(a: &[usize], b: &[usize]) -> bool {
        (0..a.len()).all(|i| (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j])))
    }

    #[test]
    fn test_two_separated_groups() {
        let points = vec![
            vec![-1.0, -1.0],
            vec![1.0, 1.0],
            vec![-1.0, -1.0],
            vec![1.0, 1.0],
        ];
        let fit = KMeans::new(2, 300, 42)
            .fit(&points, &CancellationToken::new())
            .unwrap();
        assert!(fit.converged);
        assert!(same_partition(&fit.labels, &[0, 1, 0, 1]));
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let points: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 7) as f64, (i * 3 % 11) as f64])
            .collect();
        let token = CancellationToken::new();
        let a = KMeans::new(3, 300, 9).fit(&points, &token).unwrap();
        let b = KMeans::new(3, 300, 9).fit(&points, &token).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_iteration_cap_reports_current_assignment() {
        let points: Vec<Vec<f64>> = (0..50).map(|i| vec![(i as f64).sin(), (i as f64).cos()]).collect();
        let fit = KMeans::new(5, 1, 3)
            .fit(&points, &CancellationToken::new())
            .unwrap();
        assert_eq!(fit.iterations, 1);
        assert_eq!(fit.labels.len(), 50);
        assert!(fit.labels.iter().all(|&l| l < 5));
    }

    #[test]
    fn test_empty_cluster_is_reseeded() {
        let points = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let mut labels = vec![0, 0, 0, 0];
        let previous = vec![vec![5.0], vec![100.0]];
        let centroids = KMeans::new(2, 10, 0).update_centroids(&points, &mut labels, &previous);
        // Mean of all four is 5.5; 0.0 and 11.0 are equally far, first wins.
        assert_eq!(centroids[1], vec![0.0]);
        assert_eq!(labels, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_more_clusters_than_points() {
        let err = KMeans::new(3, 10, 0)
            .fit(&[vec![1.0], vec![2.0]], &CancellationToken::new())
            .unwrap_err();
        assert!(err.is_insufficient());
    }

    #[test]
    fn test_fewer_distinct_points_than_clusters() {
        let points = vec![vec![0.0], vec![0.0], vec![0.0], vec![1.0]];
        let err = KMeans::new(3, 50, 1)
            .fit(&points, &CancellationToken::new())
            .unwrap_err();
        assert!(err.is_insufficient());
    }

    #[test]
    fn test_duplicates_still_fill_every_cluster() {
        let points = vec![vec![0.0], vec![0.0], vec![0.0], vec![1.0], vec![5.0]];
        for seed in 0..20 {
            let fit = KMeans::new(3, 50, seed)
                .fit(&points, &CancellationToken::new())
                .unwrap();
            assert!(fit.converged, "seed {seed}");
            for c in 0..3 {
                assert!(fit.labels.contains(&c), "seed {seed}: cluster {c} empty");
            }
        }
    }

    #[test]
    fn test_two_empty_clusters_reseeded_in_one_pass() {
        let points = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let mut labels = vec![0, 0, 0, 0];
        let previous = vec![vec![5.0], vec![100.0], vec![200.0]];
        KMeans::new(3, 10, 0).update_centroids(&points, &mut labels, &previous);
        for c in 0..3 {
            assert!(labels.contains(&c));
        }
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let err = KMeans::new(0, 10, 0)
            .fit(&[vec![1.0]], &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }
}
