use super::{Codec, RepresentationKind};
use crate::bicluster::Bicluster;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::rng::RandomSource;

/// One bicluster per genome: a single vector of `num_rows + num_cols` bits.
#[derive(Debug, Clone)]
pub struct IndividualCodec {
    num_rows: usize,
    num_cols: usize,
}

impl IndividualCodec {
    pub fn new(num_rows: usize, num_cols: usize) -> Result<Self> {
        if num_rows == 0 || num_cols == 0 {
            return Err(MoebaError::Configuration(format!(
                "cannot encode a {}x{} matrix",
                num_rows, num_cols
            )));
        }
        Ok(Self { num_rows, num_cols })
    }
}

impl Codec for IndividualCodec {
    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Individual
    }

    fn random_genome(&self, rng: &mut dyn RandomSource) -> Genome {
        let bits = (0..self.num_rows + self.num_cols)
            .map(|_| rng.next_bool())
            .collect();
        Genome::new(Vec::new(), vec![bits])
    }

    fn decode(&self, genome: &Genome) -> Vec<Bicluster> {
        let Some(bits) = genome.bits.first() else {
            return Vec::new();
        };
        let (rows, cols): (Vec<usize>, Vec<usize>) = bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(i, _)| i)
            .partition(|&i| i < self.num_rows);
        let cols = cols.into_iter().map(|i| i - self.num_rows).collect();
        vec![Bicluster::new(rows, cols)]
    }

    fn variable_labels(&self) -> Vec<String> {
        (0..self.num_rows)
            .map(|i| format!("R{}", i))
            .chain((0..self.num_cols).map(|j| format!("C{}", j)))
            .collect()
    }
}
