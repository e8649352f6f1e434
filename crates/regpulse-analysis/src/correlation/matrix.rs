//! Symmetric correlation matrix and the strong-pair list.

use serde::{Deserialize, Serialize};

use super::pearson::pearson;

/// Square matrix over metric names. `None` marks pairs where either
/// column has zero variance; defined diagonal entries are exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
    /// Joined rows the coefficients were computed over.
    observations: usize,
}

/// One unordered metric pair, names in lexical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    pub r: f64,
}

impl CorrelationMatrix {
    /// Pearson r for every unordered pair of `columns`.
    pub fn from_columns(names: Vec<String>, columns: &[Vec<f64>]) -> Self {
        let n = names.len();
        let observations = columns.first().map(Vec::len).unwrap_or(0);
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    pearson(&columns[i], &columns[i]).map(|_| 1.0)
                } else {
                    pearson(&columns[i], &columns[j])
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self {
            names,
            values,
            observations,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Coefficient for two metrics; `None` if undefined or unknown.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.values[self.index(a)?][self.index(b)?]
    }

    pub fn row(&self, i: usize) -> &[Option<f64>] {
        &self.values[i]
    }

    /// Pairs with |r| above `threshold`, strongest first; equal strengths
    /// are ordered by name.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                let Some(r) = self.values[i][j] else { continue };
                if r.abs() > threshold {
                    let (a, b) = (&self.names[i], &self.names[j]);
                    let (left, right) = if a <= b { (a, b) } else { (b, a) };
                    pairs.push(CorrelationPair {
                        left: left.clone(),
                        right: right.clone(),
                        r,
                    });
                }
            }
        }
        pairs.sort_by(|x, y| {
            y.r.abs()
                .total_cmp(&x.r.abs())
                .then_with(|| x.left.cmp(&y.left))
                .then_with(|| x.right.cmp(&y.right))
        });
        pairs
    }
}
