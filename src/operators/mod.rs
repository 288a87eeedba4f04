//! # Genetic operators
//!
//! Crossover and mutation for the three genome representations. Operators
//! are stateless apart from atomic operation counters that drive their
//! schedules; all randomness comes from the `RandomSource` passed per call.

pub mod crossover;
pub mod mutation;

pub use self::crossover::{build_crossover, CrossoverOperator};
pub use self::mutation::{build_mutation, MutationOperator};

use crate::genome::Genome;

/// Sets the last boundary bit of a generic genome.
pub(crate) fn restore_sentinel(genome: &mut Genome) {
    if let Some(last) = genome.bits.first_mut().and_then(|bits| bits.last_mut()) {
        *last = true;
    }
}
