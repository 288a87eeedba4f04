//! # Population
//!
//! Individuals, Pareto ranking, replacement, parent selection and the
//! external archive. Everything here is minimisation and is only ever touched
//! by the master thread.

pub mod archive;
pub mod ranking;
pub mod replacement;
pub mod selection;

pub use self::archive::{non_dominated, BestSolutionsArchive, NonDominatedArchive};
pub use self::ranking::{assign_crowding_distance, dominates, fast_non_dominated_sort, rank_and_crowd};
pub use self::replacement::{MuPlusLambdaReplacement, RankingAndCrowdingReplacement, Replacement};
pub use self::selection::{Comparator, TournamentSelection};

use crate::bicluster::Bicluster;
use crate::fitness::Evaluation;
use crate::genome::Genome;

/// An evaluated genome.
///
/// `rank` and `crowding` are bookkeeping for replacement and selection; the
/// objectives never depend on them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub genome: Genome,
    /// Non-degenerate biclusters the objectives were computed on.
    pub biclusters: Vec<Bicluster>,
    pub objectives: Vec<f64>,
    pub rank: usize,
    pub crowding: f64,
}

impl Individual {
    pub fn new(genome: Genome, evaluation: Evaluation) -> Self {
        Self {
            genome,
            biclusters: evaluation.biclusters,
            objectives: evaluation.objectives,
            rank: 0,
            crowding: 0.0,
        }
    }

    /// An individual with fixed objective values and no biclusters.
    pub fn with_objectives(genome: Genome, objectives: Vec<f64>) -> Self {
        Self {
            genome,
            biclusters: Vec::new(),
            objectives,
            rank: 0,
            crowding: 0.0,
        }
    }

    pub fn num_biclusters(&self) -> usize {
        self.biclusters.len()
    }
}
