//! # Crossover
//!
//! Representation-level crossovers take two parent genomes and return two
//! offspring by value. They are assembled from a semicolon separated
//! configuration string whose parts are interpreted per representation:
//!
//! | representation | parts |
//! |---|---|
//! | generic | `GroupedBasedCrossover;CellUniformCrossover` |
//! | generic | `<permutation crossover>;BicUniformCrossover;CellUniformCrossover` |
//! | individual | `RowColUniformCrossover` |
//! | specific | `AssignmentUniformCrossover;CellUniformCrossover` |
//!
//! where the permutation crossover is one of `CycleCrossover`,
//! `EdgeRecombinationCrossover` or `PartiallyMappedCrossover`.

mod grouped;
mod permutation;
mod uniform;

use std::fmt::Debug;

pub use self::grouped::{GroupedBasedCrossover, DEFAULT_DYNAMIC_START_AMOUNT, DEFAULT_SHUFFLE_END};
pub use self::permutation::{CycleCrossover, EdgeRecombinationCrossover, PartiallyMappedCrossover};
pub use self::uniform::{AssignmentUniformCrossover, UniformCrossover};

use crate::codec::RepresentationKind;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::operators::restore_sentinel;
use crate::options::ComponentSpec;
use crate::rng::RandomSource;

/// Produces two offspring from two parents.
pub trait CrossoverOperator: Send + Sync + Debug {
    fn crossover(
        &self,
        parent1: &Genome,
        parent2: &Genome,
        rng: &mut dyn RandomSource,
    ) -> (Genome, Genome);
}

/// Crossover over the row permutation alone.
pub trait PermutationCrossover: Send + Sync + Debug {
    fn cross(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        rng: &mut dyn RandomSource,
    ) -> (Vec<usize>, Vec<usize>);
}

/// In-place crossover over a pair of bit vectors.
pub trait BitCrossover: Send + Sync + Debug {
    fn cross(&self, bits1: &mut [bool], bits2: &mut [bool], rng: &mut dyn RandomSource);
}

#[derive(Debug)]
enum RowCrossover {
    Grouped(GroupedBasedCrossover),
    Separate {
        permutation: Box<dyn PermutationCrossover>,
        biclusters: Box<dyn BitCrossover>,
    },
}

/// Crossover for the generic representation.
#[derive(Debug)]
pub struct GenericCrossover {
    probability: f64,
    rows: RowCrossover,
    cells: Box<dyn BitCrossover>,
}

impl GenericCrossover {
    /// Crosses permutation and boundary bits together.
    pub fn grouped(probability: f64, grouped: GroupedBasedCrossover, cells: Box<dyn BitCrossover>) -> Self {
        Self {
            probability,
            rows: RowCrossover::Grouped(grouped),
            cells,
        }
    }

    /// Crosses permutation and boundary bits independently.
    pub fn separate(
        probability: f64,
        permutation: Box<dyn PermutationCrossover>,
        biclusters: Box<dyn BitCrossover>,
        cells: Box<dyn BitCrossover>,
    ) -> Self {
        Self {
            probability,
            rows: RowCrossover::Separate {
                permutation,
                biclusters,
            },
            cells,
        }
    }
}

impl CrossoverOperator for GenericCrossover {
    fn crossover(
        &self,
        parent1: &Genome,
        parent2: &Genome,
        rng: &mut dyn RandomSource,
    ) -> (Genome, Genome) {
        let mut offspring1 = parent1.clone();
        let mut offspring2 = parent2.clone();
        if offspring1.bits.is_empty() || offspring2.bits.is_empty() {
            return (offspring1, offspring2);
        }

        if rng.next_f64() <= self.probability {
            match &self.rows {
                RowCrossover::Grouped(grouped) => grouped.cross(
                    &mut offspring1.integers,
                    &mut offspring2.integers,
                    &mut offspring1.bits[0],
                    &mut offspring2.bits[0],
                    rng,
                ),
                RowCrossover::Separate {
                    permutation,
                    biclusters,
                } => {
                    let (p1, p2) = permutation.cross(&offspring1.integers, &offspring2.integers, rng);
                    offspring1.integers = p1;
                    offspring2.integers = p2;
                    biclusters.cross(&mut offspring1.bits[0], &mut offspring2.bits[0], rng);
                }
            }
            for (cells1, cells2) in offspring1
                .bits
                .iter_mut()
                .zip(offspring2.bits.iter_mut())
                .skip(1)
            {
                self.cells.cross(cells1, cells2, rng);
            }
        }

        restore_sentinel(&mut offspring1);
        restore_sentinel(&mut offspring2);
        debug_assert!(offspring1.is_permutation() && offspring2.is_permutation());
        (offspring1, offspring2)
    }
}

/// Crossover for the individual representation.
#[derive(Debug)]
pub struct IndividualCrossover {
    probability: f64,
    row_cols: Box<dyn BitCrossover>,
}

impl IndividualCrossover {
    pub fn new(probability: f64, row_cols: Box<dyn BitCrossover>) -> Self {
        Self {
            probability,
            row_cols,
        }
    }
}

impl CrossoverOperator for IndividualCrossover {
    fn crossover(
        &self,
        parent1: &Genome,
        parent2: &Genome,
        rng: &mut dyn RandomSource,
    ) -> (Genome, Genome) {
        let mut offspring1 = parent1.clone();
        let mut offspring2 = parent2.clone();
        if rng.next_f64() <= self.probability {
            if let (Some(bits1), Some(bits2)) =
                (offspring1.bits.first_mut(), offspring2.bits.first_mut())
            {
                self.row_cols.cross(bits1, bits2, rng);
            }
        }
        (offspring1, offspring2)
    }
}

/// Crossover for the specific representation.
#[derive(Debug)]
pub struct SpecificCrossover {
    probability: f64,
    assignment: AssignmentUniformCrossover,
    cells: Box<dyn BitCrossover>,
}

impl SpecificCrossover {
    pub fn new(probability: f64, cells: Box<dyn BitCrossover>) -> Self {
        Self {
            probability,
            assignment: AssignmentUniformCrossover,
            cells,
        }
    }
}

impl CrossoverOperator for SpecificCrossover {
    fn crossover(
        &self,
        parent1: &Genome,
        parent2: &Genome,
        rng: &mut dyn RandomSource,
    ) -> (Genome, Genome) {
        let mut offspring1 = parent1.clone();
        let mut offspring2 = parent2.clone();
        if rng.next_f64() <= self.probability {
            self.assignment
                .cross(&mut offspring1.integers, &mut offspring2.integers, rng);
            for (cells1, cells2) in offspring1.bits.iter_mut().zip(offspring2.bits.iter_mut()) {
                self.cells.cross(cells1, cells2, rng);
            }
        }
        (offspring1, offspring2)
    }
}

/// Assembles the crossover described by `config` for `kind`.
pub fn build_crossover(
    kind: RepresentationKind,
    config: &str,
    probability: f64,
    num_approx_operations: usize,
) -> Result<Box<dyn CrossoverOperator>> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(MoebaError::Configuration(format!(
            "crossover probability must lie in [0, 1], got {}",
            probability
        )));
    }
    let parts = ComponentSpec::parse_list(config)?;

    Ok(match (kind, parts.as_slice()) {
        (RepresentationKind::Generic, [rows, cells]) => {
            if rows.name != "groupedbasedcrossover" {
                return Err(unknown("row bicluster mixed crossover", &rows.name));
            }
            Box::new(GenericCrossover::grouped(
                probability,
                GroupedBasedCrossover::from_spec(rows, num_approx_operations)?,
                bit_crossover(cells, "celluniformcrossover", "cell binary crossover")?,
            ))
        }
        (RepresentationKind::Generic, [permutation, biclusters, cells]) => {
            Box::new(GenericCrossover::separate(
                probability,
                permutation_crossover(permutation)?,
                bit_crossover(biclusters, "bicuniformcrossover", "bicluster binary crossover")?,
                bit_crossover(cells, "celluniformcrossover", "cell binary crossover")?,
            ))
        }
        (RepresentationKind::Individual, [row_cols]) => Box::new(IndividualCrossover::new(
            probability,
            bit_crossover(row_cols, "rowcoluniformcrossover", "row/column binary crossover")?,
        )),
        (RepresentationKind::Specific, [assignment, cells]) => {
            if assignment.name != "assignmentuniformcrossover" {
                return Err(unknown("assignment crossover", &assignment.name));
            }
            Box::new(SpecificCrossover::new(
                probability,
                bit_crossover(cells, "celluniformcrossover", "cell binary crossover")?,
            ))
        }
        (kind, parts) => {
            return Err(MoebaError::Configuration(format!(
                "{} crossover parts are not supported for the {:?} representation",
                parts.len(),
                kind
            )))
        }
    })
}

fn permutation_crossover(spec: &ComponentSpec) -> Result<Box<dyn PermutationCrossover>> {
    match spec.name.as_str() {
        "cyclecrossover" => Ok(Box::new(CycleCrossover)),
        "edgerecombinationcrossover" => Ok(Box::new(EdgeRecombinationCrossover)),
        "partiallymappedcrossover" => Ok(Box::new(PartiallyMappedCrossover)),
        other => Err(unknown("row permutation crossover", other)),
    }
}

fn bit_crossover(spec: &ComponentSpec, expected: &str, role: &str) -> Result<Box<dyn BitCrossover>> {
    if spec.name == expected {
        Ok(Box::new(UniformCrossover))
    } else {
        Err(unknown(role, &spec.name))
    }
}

fn unknown(role: &str, name: &str) -> MoebaError {
    MoebaError::Configuration(format!("the {} {:?} is not implemented", role, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, GenericCodec};
    use crate::rng::{RandomNumberGenerator, ScriptedRng};

    #[test]
    fn test_build_by_representation() {
        assert!(build_crossover(
            RepresentationKind::Generic,
            "GroupedBasedCrossover;CellUniformCrossover",
            0.9,
            100
        )
        .is_ok());
        assert!(build_crossover(
            RepresentationKind::Generic,
            "PartiallyMappedCrossover; BicUniformCrossover; CellUniformCrossover",
            0.9,
            100
        )
        .is_ok());
        assert!(build_crossover(RepresentationKind::Individual, "RowColUniformCrossover", 0.5, 1).is_ok());
        assert!(build_crossover(
            RepresentationKind::Specific,
            "AssignmentUniformCrossover;CellUniformCrossover",
            0.5,
            1
        )
        .is_ok());
    }

    #[test]
    fn test_build_rejects_wrong_arity_and_names() {
        let cases = [
            (RepresentationKind::Generic, "CellUniformCrossover"),
            (RepresentationKind::Generic, "OnePointCrossover;CellUniformCrossover"),
            (RepresentationKind::Generic, "CycleCrossover;CellUniformCrossover;BicUniformCrossover"),
            (RepresentationKind::Individual, "RowColUniformCrossover;CellUniformCrossover"),
            (RepresentationKind::Specific, "CellUniformCrossover;CellUniformCrossover"),
        ];
        for (kind, config) in cases {
            assert!(
                matches!(build_crossover(kind, config, 0.9, 10), Err(MoebaError::Configuration(_))),
                "{:?} {:?} should be rejected",
                kind,
                config
            );
        }
        assert!(build_crossover(RepresentationKind::Individual, "RowColUniformCrossover", 1.5, 1).is_err());
    }

    #[test]
    fn test_generic_offspring_stay_valid() {
        let codec = GenericCodec::new(25, 6, 0.1, 0.3).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(8);
        for config in [
            "GroupedBasedCrossover;CellUniformCrossover",
            "CycleCrossover;BicUniformCrossover;CellUniformCrossover",
            "EdgeRecombinationCrossover;BicUniformCrossover;CellUniformCrossover",
            "PartiallyMappedCrossover;BicUniformCrossover;CellUniformCrossover",
        ] {
            let crossover = build_crossover(RepresentationKind::Generic, config, 1.0, 50).unwrap();
            for _ in 0..10 {
                let parent1 = codec.random_genome(&mut rng);
                let parent2 = codec.random_genome(&mut rng);
                let (o1, o2) = crossover.crossover(&parent1, &parent2, &mut rng);
                for offspring in [&o1, &o2] {
                    assert!(offspring.is_permutation());
                    assert_eq!(offspring.bits.len(), 7);
                    assert_eq!(offspring.bits[0].last(), Some(&true));
                }
            }
        }
    }

    #[test]
    fn test_probability_gate_copies_parents() {
        let crossover = IndividualCrossover::new(0.3, Box::new(UniformCrossover));
        let parent1 = Genome::new(vec![], vec![vec![true; 4]]);
        let parent2 = Genome::new(vec![], vec![vec![false; 4]]);
        // first draw fails the gate
        let mut rng = ScriptedRng::new(&[0.5], &[]).with_fallback(0.0);

        let (o1, o2) = crossover.crossover(&parent1, &parent2, &mut rng);
        assert_eq!(o1, parent1);
        assert_eq!(o2, parent2);
    }
}
