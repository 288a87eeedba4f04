use super::{sort_by_min_row, Codec, RepresentationKind};
use crate::bicluster::Bicluster;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::rng::RandomSource;

/// A fixed number `k` of clusters.
///
/// The integer part assigns every row to a cluster in `[0, k)`; bit vector
/// `c` selects the columns of cluster `c`. Clusters without rows are dropped
/// on decode.
#[derive(Debug, Clone)]
pub struct SpecificCodec {
    num_rows: usize,
    num_cols: usize,
    num_biclusters: usize,
}

impl SpecificCodec {
    pub fn new(num_rows: usize, num_cols: usize, num_biclusters: usize) -> Result<Self> {
        if num_cols == 0 {
            return Err(MoebaError::Configuration(
                "cannot encode a matrix without columns".to_string(),
            ));
        }
        if num_biclusters < 2 || num_biclusters + 1 > num_rows {
            return Err(MoebaError::Configuration(format!(
                "the number of biclusters must lie in [2, {}], got {}",
                num_rows.saturating_sub(1),
                num_biclusters
            )));
        }
        Ok(Self {
            num_rows,
            num_cols,
            num_biclusters,
        })
    }

    pub fn num_biclusters(&self) -> usize {
        self.num_biclusters
    }
}

impl Codec for SpecificCodec {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Specific
    }

    fn random_genome(&self, rng: &mut dyn RandomSource) -> Genome {
        let assignment = (0..self.num_rows)
            .map(|_| rng.next_index(self.num_biclusters))
            .collect();
        let bits = (0..self.num_biclusters)
            .map(|_| (0..self.num_cols).map(|_| rng.next_bool()).collect())
            .collect();
        Genome::new(assignment, bits)
    }

    fn decode(&self, genome: &Genome) -> Vec<Bicluster> {
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); genome.bits.len()];
        for (row, &cluster) in genome.integers.iter().enumerate() {
            if let Some(rows) = members.get_mut(cluster) {
                rows.push(row);
            }
        }

        let mut biclusters: Vec<Bicluster> = members
            .into_iter()
            .zip(&genome.bits)
            .filter(|(rows, _)| !rows.is_empty())
            .map(|(rows, cols)| {
                let cols = cols
                    .iter()
                    .enumerate()
                    .filter(|(_, set)| **set)
                    .map(|(j, _)| j)
                    .collect();
                Bicluster::new(rows, cols)
            })
            .collect();
        sort_by_min_row(&mut biclusters);
        biclusters
    }

    fn variable_labels(&self) -> Vec<String> {
        (0..self.num_rows)
            .map(|i| format!("A{}", i))
            .chain((0..self.num_biclusters).flat_map(|k| {
                (0..self.num_cols).map(move |j| format!("Cell-B{}-C{}", k, j))
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomNumberGenerator;

    #[test]
    fn test_cluster_count_bounds() {
        assert!(SpecificCodec::new(5, 3, 1).is_err());
        assert!(SpecificCodec::new(5, 3, 5).is_err());
        assert!(SpecificCodec::new(5, 3, 4).is_ok());
        assert!(SpecificCodec::new(5, 3, 2).is_ok());
    }

    #[test]
    fn test_decode_drops_empty_clusters() {
        let codec = SpecificCodec::new(4, 2, 3).unwrap();
        let genome = Genome::new(
            vec![2, 0, 2, 0],
            vec![vec![true, false], vec![true, true], vec![false, true]],
        );
        assert_eq!(
            codec.decode(&genome),
            vec![
                Bicluster::new(vec![0, 2], vec![1]),
                Bicluster::new(vec![1, 3], vec![0]),
            ]
        );
    }

    #[test]
    fn test_random_assignment_in_range() {
        let codec = SpecificCodec::new(20, 4, 3).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(5);
        let genome = codec.random_genome(&mut rng);
        assert_eq!(genome.integers.len(), 20);
        assert!(genome.integers.iter().all(|&c| c < 3));
        assert_eq!(genome.bits.len(), 3);
    }
}
