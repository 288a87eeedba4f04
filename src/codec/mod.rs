//! # Codecs
//!
//! A codec turns a [`Genome`] into the list of biclusters it stands for and
//! knows how to draw a random genome of the right shape. Three representations
//! are supported:
//!
//! - [`GenericCodec`]: row permutation, boundary bits and per-column votes.
//! - [`IndividualCodec`]: a single bicluster as one row/column bit vector.
//! - [`SpecificCodec`]: a fixed number of clusters with a row assignment.
//!
//! ## Example
//!
//! ```rust
//! use moeba::codec::{Codec, GenericCodec};
//! use moeba::rng::RandomNumberGenerator;
//!
//! let codec = GenericCodec::new(10, 4, 0.1, 0.2).unwrap();
//! let mut rng = RandomNumberGenerator::from_seed(1);
//! let genome = codec.random_genome(&mut rng);
//!
//! let mut rows: Vec<usize> = codec
//!     .decode(&genome)
//!     .into_iter()
//!     .flat_map(|b| b.rows)
//!     .collect();
//! rows.sort_unstable();
//! assert_eq!(rows, (0..10).collect::<Vec<_>>());
//! ```

mod generic;
mod individual;
mod specific;

use std::collections::HashMap;
use std::fmt::Debug;

pub use self::generic::GenericCodec;
pub use self::individual::IndividualCodec;
pub use self::specific::SpecificCodec;

use crate::bicluster::Bicluster;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::options::EngineOptions;
use crate::rng::RandomSource;

/// Which genome layout a run uses.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepresentationKind {
    #[default]
    Generic,
    Individual,
    Specific,
}

impl RepresentationKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "individual" => Ok(Self::Individual),
            "specific" => Ok(Self::Specific),
            other => Err(MoebaError::Configuration(format!(
                "unknown representation: {}",
                other
            ))),
        }
    }
}

/// Maps genomes to biclusters for one representation.
pub trait Codec: Send + Sync + Debug {
    fn kind(&self) -> RepresentationKind;

    /// Draws a fresh genome of the right shape.
    fn random_genome(&self, rng: &mut dyn RandomSource) -> Genome;

    /// Decodes a genome into biclusters sorted by their smallest row.
    ///
    /// Degenerate biclusters are kept; filtering them is the evaluator's job.
    fn decode(&self, genome: &Genome) -> Vec<Bicluster>;

    /// Restores representation invariants after a genetic operator ran.
    fn repair(&self, _genome: &mut Genome) {}

    /// One label per encoded variable, in genome order, for result writers.
    fn variable_labels(&self) -> Vec<String>;
}

/// Builds the codec selected in `options` for a `num_rows` × `num_cols` matrix.
pub fn build_codec(
    num_rows: usize,
    num_cols: usize,
    options: &EngineOptions,
) -> Result<Box<dyn Codec>> {
    Ok(match options.representation() {
        RepresentationKind::Generic => Box::new(GenericCodec::new(
            num_rows,
            num_cols,
            options.generic_initial_min_perc_bics(),
            options.generic_initial_max_perc_bics(),
        )?),
        RepresentationKind::Individual => Box::new(IndividualCodec::new(num_rows, num_cols)?),
        RepresentationKind::Specific => Box::new(SpecificCodec::new(
            num_rows,
            num_cols,
            options.specific_num_biclusters(),
        )?),
    })
}

/// Merges biclusters that share an identical column list.
///
/// Groups keep the position of their first member; the merged row lists are
/// sorted ascending.
pub fn merge_same_columns(biclusters: Vec<Bicluster>) -> Vec<Bicluster> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Bicluster> = Vec::with_capacity(biclusters.len());

    for bicluster in biclusters {
        let key = bicluster.columns_key();
        match position.get(&key) {
            Some(&at) => merged[at].rows.extend(bicluster.rows),
            None => {
                position.insert(key, merged.len());
                merged.push(bicluster);
            }
        }
    }

    for bicluster in &mut merged {
        bicluster.rows.sort_unstable();
        bicluster.rows.dedup();
    }
    merged
}

/// Stable sort by smallest row.
pub(crate) fn sort_by_min_row(biclusters: &mut [Bicluster]) {
    biclusters.sort_by_key(Bicluster::min_row);
}
