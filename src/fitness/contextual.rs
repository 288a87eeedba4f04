use super::individual::BiclusterSizeWeighted;
use super::ContextualScore;
use crate::bicluster::Bicluster;
use crate::data::DataMatrix;

/// Rewards biclusters whose size is close to an even split of the matrix
/// among all biclusters of the solution.
#[derive(Debug, Clone, Copy)]
pub struct BiclusterSizeNumBics {
    rows_weight: f64,
    coherence_weight: f64,
}

impl BiclusterSizeNumBics {
    pub fn new(rows_weight: f64, coherence_weight: f64) -> Self {
        Self {
            rows_weight,
            coherence_weight,
        }
    }
}

impl ContextualScore for BiclusterSizeNumBics {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster, others: &[&Bicluster]) -> f64 {
        let max_size = (data.num_rows() * data.num_cols()) as f64;
        let parcel = max_size / ((others.len() + 1) as f64).powi(2);
        let size = bicluster.size() as f64;

        (1.0 - self.coherence_weight) * BiclusterSizeWeighted::normalized(self.rows_weight, data, bicluster)
            + self.coherence_weight * (1.0 - ((parcel - size).abs() / parcel).min(1.0))
    }
}

/// Row coverage plus column coverage, where columns shared with other
/// biclusters count less.
#[derive(Debug, Clone, Copy)]
pub struct BiclusterSizeCover {
    rows_weight: f64,
}

impl BiclusterSizeCover {
    pub fn new(rows_weight: f64) -> Self {
        Self { rows_weight }
    }
}

impl ContextualScore for BiclusterSizeCover {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster, others: &[&Bicluster]) -> f64 {
        let row_score = bicluster.rows.len() as f64 / data.num_rows() as f64;

        let mut column_count = vec![0usize; data.num_cols()];
        for other in others {
            for &col in &other.cols {
                column_count[col] += 1;
            }
        }
        let col_score = bicluster
            .cols
            .iter()
            .map(|&col| 1.0 / (column_count[col] + 1) as f64)
            .sum::<f64>()
            / data.num_cols() as f64;

        self.rows_weight * row_score + (1.0 - self.rows_weight) * col_score
    }
}

/// How well the rows of the closest bicluster (the one sharing most columns)
/// would fit into this one compared with staying where they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceBetweenBiclusters;

fn column_means(data: &DataMatrix, bicluster: &Bicluster) -> Vec<f64> {
    let height = bicluster.rows.len() as f64;
    bicluster
        .cols
        .iter()
        .map(|&j| bicluster.rows.iter().map(|&i| data.get(i, j)).sum::<f64>() / height)
        .collect()
}

fn mean_squared_distance(values: &[f64], means: &[f64]) -> f64 {
    values
        .iter()
        .zip(means)
        .map(|(x, m)| (x - m).powi(2))
        .sum::<f64>()
        / values.len() as f64
}

fn shared_columns(a: &Bicluster, b: &Bicluster) -> usize {
    a.cols.iter().filter(|c| b.cols.binary_search(c).is_ok()).count()
}

impl ContextualScore for DistanceBetweenBiclusters {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster, others: &[&Bicluster]) -> f64 {
        let Some(mut closest) = others.first().copied() else {
            return 0.0;
        };
        let mut max_shared = 0;
        for &other in others {
            let shared = shared_columns(bicluster, other);
            if shared > max_shared {
                max_shared = shared;
                closest = other;
            }
        }

        let own_means = column_means(data, bicluster);
        let closest_means = column_means(data, closest);
        let n = bicluster.rows.len() as f64;

        let total: f64 = closest
            .rows
            .iter()
            .map(|&row| {
                let own: Vec<f64> = bicluster.cols.iter().map(|&j| data.get(row, j)).collect();
                let current: Vec<f64> = closest.cols.iter().map(|&j| data.get(row, j)).collect();

                let to_own = mean_squared_distance(&own, &own_means);
                let to_current = if bicluster.rows.len() > 1 {
                    let adjusted: Vec<f64> = closest_means
                        .iter()
                        .zip(&current)
                        .map(|(m, y)| (n * m - y) / (n - 1.0))
                        .collect();
                    mean_squared_distance(&current, &adjusted)
                } else {
                    mean_squared_distance(&current, &closest_means)
                };

                if to_own + to_current == 0.0 {
                    0.0
                } else {
                    to_own / (to_own + to_current)
                }
            })
            .sum();

        total / closest.rows.len() as f64
    }
}
