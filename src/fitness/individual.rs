use super::BiclusterScore;
use crate::bicluster::Bicluster;
use crate::data::DataMatrix;

/// Covered cells relative to the whole matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiclusterSize;

impl BiclusterScore for BiclusterSize {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        bicluster.size() as f64 / (data.num_rows() * data.num_cols()) as f64
    }
}

/// Row and column coverage blended by `rows_weight`.
#[derive(Debug, Clone, Copy)]
pub struct BiclusterSizeWeighted {
    rows_weight: f64,
}

impl BiclusterSizeWeighted {
    pub fn new(rows_weight: f64) -> Self {
        Self { rows_weight }
    }

    pub(crate) fn normalized(rows_weight: f64, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        rows_weight * bicluster.rows.len() as f64 / data.num_rows() as f64
            + (1.0 - rows_weight) * bicluster.cols.len() as f64 / data.num_cols() as f64
    }
}

impl BiclusterScore for BiclusterSizeWeighted {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        Self::normalized(self.rows_weight, data, bicluster)
    }
}

fn mean(data: &DataMatrix, bicluster: &Bicluster) -> f64 {
    let sum: f64 = bicluster
        .rows
        .iter()
        .flat_map(|&i| bicluster.cols.iter().map(move |&j| data.get(i, j)))
        .sum();
    sum / bicluster.size() as f64
}

/// Squared deviation from the bicluster mean, normalised by the matrix size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiclusterVariance;

impl BiclusterScore for BiclusterVariance {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        let mean = mean(data, bicluster);
        let deviation: f64 = bicluster
            .rows
            .iter()
            .flat_map(|&i| bicluster.cols.iter().map(move |&j| data.get(i, j)))
            .map(|x| (x - mean).powi(2))
            .sum();
        1.0 - 4.0 * deviation / (data.num_rows() * data.num_cols()) as f64
    }
}

/// Mean squared deviation of each value from its row mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowVariance;

impl BiclusterScore for RowVariance {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        let width = bicluster.cols.len() as f64;
        let deviation: f64 = bicluster
            .rows
            .iter()
            .map(|&i| {
                let values: Vec<f64> = bicluster.cols.iter().map(|&j| data.get(i, j)).collect();
                let row_mean = values.iter().sum::<f64>() / width;
                values.iter().map(|x| (x - row_mean).powi(2)).sum::<f64>()
            })
            .sum();
        1.0 - 4.0 * deviation / bicluster.size() as f64
    }
}

/// Cheng and Church mean squared residue, mapped to `1 - msr / 4`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredResidue;

impl BiclusterScore for MeanSquaredResidue {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        let rows = &bicluster.rows;
        let cols = &bicluster.cols;
        let mut row_means = vec![0.0; rows.len()];
        let mut col_means = vec![0.0; cols.len()];
        let mut total = 0.0;

        for (a, &i) in rows.iter().enumerate() {
            for (b, &j) in cols.iter().enumerate() {
                let value = data.get(i, j);
                row_means[a] += value;
                col_means[b] += value;
                total += value;
            }
        }
        row_means.iter_mut().for_each(|m| *m /= cols.len() as f64);
        col_means.iter_mut().for_each(|m| *m /= rows.len() as f64);
        let mean = total / bicluster.size() as f64;

        let mut residue = 0.0;
        for (a, &i) in rows.iter().enumerate() {
            for (b, &j) in cols.iter().enumerate() {
                residue += (data.get(i, j) - row_means[a] - col_means[b] + mean).powi(2);
            }
        }
        1.0 - residue / bicluster.size() as f64 / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> DataMatrix {
        DataMatrix::numeric(vec![
            vec![1.0, 2.0, 3.0, 0.0],
            vec![2.0, 3.0, 4.0, 0.0],
            vec![0.0, 1.0, 0.0, 1.0],
            vec![1.0, 0.0, 1.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_size_scores() {
        let data = matrix();
        let bicluster = Bicluster::new(vec![0, 1], vec![0, 1, 2]);
        assert!((BiclusterSize.score(&data, &bicluster) - 6.0 / 16.0).abs() < 1e-12);
        // 0.75 * 2/4 + 0.25 * 3/4
        let weighted = BiclusterSizeWeighted::new(0.75).score(&data, &bicluster);
        assert!((weighted - 0.5625).abs() < 1e-12);
    }

    #[test]
    fn test_additive_bicluster_has_zero_residue() {
        let data = matrix();
        let bicluster = Bicluster::new(vec![0, 1], vec![0, 1, 2]);
        assert!((MeanSquaredResidue.score(&data, &bicluster) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_residue_of_checkerboard() {
        let data = matrix();
        let bicluster = Bicluster::new(vec![2, 3], vec![0, 1]);
        // residues are all 0.5, so msr = 0.25
        assert!((MeanSquaredResidue.score(&data, &bicluster) - (1.0 - 0.25 / 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_constant_rows_have_no_row_variance() {
        let data = DataMatrix::numeric(vec![vec![3.0, 3.0], vec![1.0, 1.0]]).unwrap();
        let bicluster = Bicluster::new(vec![0, 1], vec![0, 1]);
        assert_eq!(RowVariance.score(&data, &bicluster), 1.0);
        // mean 2, four deviations of 1 over a 2x2 matrix
        assert_eq!(BiclusterVariance.score(&data, &bicluster), -3.0);
    }
}
