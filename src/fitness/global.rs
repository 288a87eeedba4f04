use std::sync::Arc;

use super::GlobalScore;
use crate::bicluster::Bicluster;
use crate::data::DataMatrix;
use crate::error::{MoebaError, Result};

/// Square matrix of directed, non-negative pairwise weights between rows,
/// e.g. a regulatory network inferred from the input.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityMatrix {
    side: usize,
    weights: Vec<f64>,
    out_degree: Vec<f64>,
    in_degree: Vec<f64>,
    total: f64,
}

impl AffinityMatrix {
    pub fn new(weights: Vec<Vec<f64>>) -> Result<Self> {
        let side = weights.len();
        if weights.iter().any(|row| row.len() != side) {
            return Err(MoebaError::Configuration(
                "the affinity matrix must be square".to_string(),
            ));
        }
        let flat: Vec<f64> = weights.into_iter().flatten().collect();
        if flat.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MoebaError::Configuration(
                "affinity weights must be finite and non-negative".to_string(),
            ));
        }

        let out_degree: Vec<f64> = (0..side)
            .map(|i| flat[i * side..(i + 1) * side].iter().sum())
            .collect();
        let in_degree: Vec<f64> = (0..side)
            .map(|j| (0..side).map(|i| flat[i * side + j]).sum())
            .collect();
        let total = out_degree.iter().sum::<f64>();
        if total <= 0.0 {
            return Err(MoebaError::Configuration(
                "the affinity matrix has no weight".to_string(),
            ));
        }

        Ok(Self {
            side,
            weights: flat,
            out_degree,
            in_degree,
            total,
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[from * self.side + to]
    }
}

/// Modularity of the row partition on an affinity network, mapped from
/// `[-1, 1]` onto `[1, 0]`. Rows not covered by any bicluster are ignored.
#[derive(Debug, Clone)]
pub struct RegulatoryCoherence {
    affinity: Arc<AffinityMatrix>,
}

impl RegulatoryCoherence {
    pub fn new(data: &DataMatrix, affinity: Arc<AffinityMatrix>) -> Result<Self> {
        if !data.all_numeric() {
            return Err(MoebaError::Configuration(
                "regulatorycoherencenormcomp needs every column to be numeric".to_string(),
            ));
        }
        if affinity.side() != data.num_rows() {
            return Err(MoebaError::Configuration(format!(
                "affinity matrix side {} does not match {} rows",
                affinity.side(),
                data.num_rows()
            )));
        }
        Ok(Self { affinity })
    }
}

impl GlobalScore for RegulatoryCoherence {
    fn value(&self, biclusters: &[Bicluster]) -> f64 {
        let network = &self.affinity;
        // 0 marks a row outside every bicluster
        let mut community = vec![0usize; network.side];
        for (k, bicluster) in biclusters.iter().enumerate() {
            for &row in &bicluster.rows {
                community[row] = k + 1;
            }
        }

        let mut sum = 0.0;
        for i in 0..network.side {
            for j in 0..network.side {
                if community[i] != 0 && community[i] == community[j] {
                    sum += network.weight(i, j)
                        - network.out_degree[i] * network.in_degree[j] / network.total;
                }
            }
        }
        let modularity = sum / network.total;
        1.0 - (modularity + 1.0) / 2.0
    }
}
