use tracing::trace;

use super::{sort_by_min_row, Codec, RepresentationKind};
use crate::bicluster::Bicluster;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::operators::restore_sentinel;
use crate::rng::{shuffle, RandomSource};

/// Permutation + boundary bits + per-column votes.
///
/// `bits[0]` is indexed by permutation position and closes a run of rows
/// wherever it is set. `bits[1 + j]` is indexed by row value; column `j`
/// belongs to a run when strictly more than half of the run's rows vote for
/// it. The last boundary bit is kept set so the final run always closes.
#[derive(Debug, Clone)]
pub struct GenericCodec {
    num_rows: usize,
    num_cols: usize,
    min_perc_bics: f64,
    max_perc_bics: f64,
}

impl GenericCodec {
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        min_perc_bics: f64,
        max_perc_bics: f64,
    ) -> Result<Self> {
        if num_rows == 0 || num_cols == 0 {
            return Err(MoebaError::Configuration(format!(
                "cannot encode a {}x{} matrix",
                num_rows, num_cols
            )));
        }
        if !(0.0..=1.0).contains(&min_perc_bics)
            || !(0.0..=1.0).contains(&max_perc_bics)
            || min_perc_bics > max_perc_bics
        {
            return Err(MoebaError::Configuration(format!(
                "initial bicluster percentages must satisfy 0 <= min <= max <= 1, got {} and {}",
                min_perc_bics, max_perc_bics
            )));
        }
        Ok(Self {
            num_rows,
            num_cols,
            min_perc_bics,
            max_perc_bics,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }
}

impl Codec for GenericCodec {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Generic
    }

    fn random_genome(&self, rng: &mut dyn RandomSource) -> Genome {
        let n = self.num_rows;
        let mut permutation: Vec<usize> = (0..n).collect();
        shuffle(&mut permutation, rng);

        let limit = rng.next_f64() * (self.max_perc_bics - self.min_perc_bics) + self.min_perc_bics;
        let mut bits = Vec::with_capacity(1 + self.num_cols);
        bits.push((0..n).map(|_| rng.next_f64() < limit).collect::<Vec<_>>());
        for _ in 0..self.num_cols {
            bits.push((0..n).map(|_| rng.next_bool()).collect());
        }

        let mut genome = Genome::new(permutation, bits);
        self.repair(&mut genome);
        genome
    }

    fn decode(&self, genome: &Genome) -> Vec<Bicluster> {
        let permutation = &genome.integers;
        let n = permutation.len();
        if n == 0 || genome.bits.is_empty() {
            return Vec::new();
        }
        let boundary = &genome.bits[0];
        let columns = &genome.bits[1..];

        // prefix[j][i] counts votes for column j among the first i positions
        let prefix: Vec<Vec<usize>> = columns
            .iter()
            .map(|votes| {
                let mut sums = Vec::with_capacity(n + 1);
                sums.push(0);
                for &row in permutation {
                    let last = sums[sums.len() - 1];
                    sums.push(last + usize::from(votes[row]));
                }
                sums
            })
            .collect();

        let mut biclusters = Vec::new();
        let mut start = 0;
        for i in 0..n {
            if !(boundary[i] || i == n - 1) {
                continue;
            }
            let len = (i + 1 - start) as f64;
            let cols = prefix
                .iter()
                .enumerate()
                .filter(|(_, sums)| (sums[i + 1] - sums[start]) as f64 / len > 0.5)
                .map(|(j, _)| j)
                .collect();
            biclusters.push(Bicluster::new(permutation[start..=i].to_vec(), cols));
            start = i + 1;
        }

        sort_by_min_row(&mut biclusters);
        trace!(count = biclusters.len(), "decoded generic genome");
        biclusters
    }

    fn repair(&self, genome: &mut Genome) {
        restore_sentinel(genome);
    }

    fn variable_labels(&self) -> Vec<String> {
        let n = self.num_rows;
        (0..n)
            .map(|i| format!("R{}", i))
            .chain((0..n).map(|i| format!("P{}", i)))
            .chain((0..self.num_cols).flat_map(|j| (0..n).map(move |i| format!("Cell-R{}-C{}", i, j))))
            .collect()
    }
}
