//! # Mutation
//!
//! Representation-level mutations change a genome in place. The per-element
//! probability comes from a [`MutationSchedule`], either fixed (`"0.1"`) or
//! decreasing linearly over the run (`"0.5-0.05"`, first value at the start).
//!
//! | representation | parts |
//! |---|---|
//! | generic | `SwapMutation;BicUniformMutation;CellUniformMutation` |
//! | individual | `RowColUniformMutation` |
//! | specific | `AssignmentRandomMutation;CellUniformMutation` |

mod bits;
mod schedule;
mod swap;

use std::fmt::Debug;

pub use self::bits::{AssignmentRandomMutation, BicUniformMutation, UniformMutation};
pub use self::schedule::MutationSchedule;
pub use self::swap::SwapMutation;

use crate::codec::RepresentationKind;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::operators::restore_sentinel;
use crate::options::ComponentSpec;
use crate::rng::RandomSource;

/// Mutates a genome in place.
pub trait MutationOperator: Send + Sync + Debug {
    fn mutate(&self, genome: &mut Genome, rng: &mut dyn RandomSource);

    /// Probability used by the latest call.
    fn current_probability(&self) -> f64;
}

/// Mutation over the row permutation.
pub trait PermutationMutation: Send + Sync + Debug {
    fn mutate(&self, permutation: &mut [usize], probability: f64, rng: &mut dyn RandomSource);
}

/// Mutation over a bit vector.
pub trait BitMutation: Send + Sync + Debug {
    fn mutate(&self, bits: &mut [bool], probability: f64, rng: &mut dyn RandomSource);
}

#[derive(Debug)]
pub struct GenericMutation {
    schedule: MutationSchedule,
    permutation: Box<dyn PermutationMutation>,
    biclusters: Box<dyn BitMutation>,
    cells: Box<dyn BitMutation>,
}

impl GenericMutation {
    pub fn new(
        schedule: MutationSchedule,
        permutation: Box<dyn PermutationMutation>,
        biclusters: Box<dyn BitMutation>,
        cells: Box<dyn BitMutation>,
    ) -> Self {
        Self {
            schedule,
            permutation,
            biclusters,
            cells,
        }
    }
}

impl MutationOperator for GenericMutation {
    fn mutate(&self, genome: &mut Genome, rng: &mut dyn RandomSource) {
        let probability = self.schedule.next_probability();
        self.permutation.mutate(&mut genome.integers, probability, rng);
        if let Some((boundaries, cells)) = genome.bits.split_first_mut() {
            self.biclusters.mutate(boundaries, probability, rng);
            for column in cells {
                self.cells.mutate(column, probability, rng);
            }
        }
        restore_sentinel(genome);
    }

    fn current_probability(&self) -> f64 {
        self.schedule.current()
    }
}

#[derive(Debug)]
pub struct IndividualMutation {
    schedule: MutationSchedule,
    row_cols: Box<dyn BitMutation>,
}

impl IndividualMutation {
    pub fn new(schedule: MutationSchedule, row_cols: Box<dyn BitMutation>) -> Self {
        Self { schedule, row_cols }
    }
}

impl MutationOperator for IndividualMutation {
    fn mutate(&self, genome: &mut Genome, rng: &mut dyn RandomSource) {
        let probability = self.schedule.next_probability();
        if let Some(bits) = genome.bits.first_mut() {
            self.row_cols.mutate(bits, probability, rng);
        }
    }

    fn current_probability(&self) -> f64 {
        self.schedule.current()
    }
}

#[derive(Debug)]
pub struct SpecificMutation {
    schedule: MutationSchedule,
    assignment: AssignmentRandomMutation,
    cells: Box<dyn BitMutation>,
}

impl SpecificMutation {
    pub fn new(schedule: MutationSchedule, cells: Box<dyn BitMutation>) -> Self {
        Self {
            schedule,
            assignment: AssignmentRandomMutation,
            cells,
        }
    }
}

impl MutationOperator for SpecificMutation {
    fn mutate(&self, genome: &mut Genome, rng: &mut dyn RandomSource) {
        let probability = self.schedule.next_probability();
        let num_clusters = genome.bits.len();
        self.assignment
            .mutate(&mut genome.integers, num_clusters, probability, rng);
        for cells in &mut genome.bits {
            self.cells.mutate(cells, probability, rng);
        }
    }

    fn current_probability(&self) -> f64 {
        self.schedule.current()
    }
}

/// Assembles the mutation described by `config` for `kind`.
pub fn build_mutation(
    kind: RepresentationKind,
    config: &str,
    probability: &str,
    num_approx_operations: usize,
) -> Result<Box<dyn MutationOperator>> {
    let schedule = MutationSchedule::parse(probability, num_approx_operations)?;
    let parts = ComponentSpec::parse_list(config)?;

    Ok(match (kind, parts.as_slice()) {
        (RepresentationKind::Generic, [permutation, biclusters, cells]) => {
            if permutation.name != "swapmutation" {
                return Err(unknown("row permutation mutation", &permutation.name));
            }
            if biclusters.name != "bicuniformmutation" {
                return Err(unknown("bicluster binary mutation", &biclusters.name));
            }
            Box::new(GenericMutation::new(
                schedule,
                Box::new(SwapMutation),
                Box::new(BicUniformMutation),
                uniform(cells, "celluniformmutation", "cell binary mutation")?,
            ))
        }
        (RepresentationKind::Individual, [row_cols]) => Box::new(IndividualMutation::new(
            schedule,
            uniform(row_cols, "rowcoluniformmutation", "row/column binary mutation")?,
        )),
        (RepresentationKind::Specific, [assignment, cells]) => {
            if assignment.name != "assignmentrandommutation" {
                return Err(unknown("assignment mutation", &assignment.name));
            }
            Box::new(SpecificMutation::new(
                schedule,
                uniform(cells, "celluniformmutation", "cell binary mutation")?,
            ))
        }
        (kind, parts) => {
            return Err(MoebaError::Configuration(format!(
                "{} mutation parts are not supported for the {:?} representation",
                parts.len(),
                kind
            )))
        }
    })
}

fn uniform(spec: &ComponentSpec, expected: &str, role: &str) -> Result<Box<dyn BitMutation>> {
    if spec.name == expected {
        Ok(Box::new(UniformMutation))
    } else {
        Err(unknown(role, &spec.name))
    }
}

fn unknown(role: &str, name: &str) -> MoebaError {
    MoebaError::Configuration(format!("the {} {:?} is not implemented", role, name))
}
