//! # Fitness
//!
//! Objectives score a decoded bicluster list on a `[0, 1]` minimisation
//! scale. Three families exist:
//!
//! - per-bicluster individual objectives ([`BiclusterScore`]) score each
//!   bicluster on its own and may memoise those scores in an internal cache;
//! - per-bicluster contextual objectives ([`ContextualScore`]) score each
//!   bicluster against all the others;
//! - global objectives ([`GlobalScore`]) score the whole list at once.
//!
//! The first two are summarised with a [`Summarizer`] and reported as
//! `1 - summary`. Objectives are selected with a semicolon separated string,
//! see [`build_objectives`].

mod contextual;
mod evaluator;
mod global;
mod individual;

pub use self::contextual::{BiclusterSizeCover, BiclusterSizeNumBics, DistanceBetweenBiclusters};
pub use self::evaluator::{Evaluation, Evaluator};
pub use self::global::{AffinityMatrix, RegulatoryCoherence};
pub use self::individual::{
    BiclusterSize, BiclusterSizeWeighted, BiclusterVariance, MeanSquaredResidue, RowVariance,
};

use std::fmt::Debug;
use std::sync::Arc;

use tracing::warn;

use crate::bicluster::Bicluster;
use crate::caching::CacheStore;
use crate::data::DataMatrix;
use crate::error::{MoebaError, Result};
use crate::options::{ComponentSpec, EngineOptions};

/// How per-bicluster scores are folded into one value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Summarizer {
    #[default]
    Mean,
    HarmonicMean,
    GeometricMean,
}

impl Summarizer {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "harmonicmean" => Ok(Self::HarmonicMean),
            "geometricmean" => Ok(Self::GeometricMean),
            other => Err(MoebaError::Configuration(format!(
                "unsupported summarise method: {}",
                other
            ))),
        }
    }

    /// Folds `scores`; callers never pass an empty slice.
    pub fn summarize(&self, scores: &[f64]) -> f64 {
        let n = scores.len() as f64;
        match self {
            Self::Mean => scores.iter().sum::<f64>() / n,
            Self::HarmonicMean => n / scores.iter().map(|s| 1.0 / s).sum::<f64>(),
            Self::GeometricMean => scores.iter().product::<f64>().powf(1.0 / n),
        }
    }
}

/// Raw score of a single bicluster, higher is better.
pub trait BiclusterScore: Send + Sync + Debug {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64;
}

/// Raw score of a bicluster given every other bicluster of the same
/// solution, higher is better.
pub trait ContextualScore: Send + Sync + Debug {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster, others: &[&Bicluster]) -> f64;
}

/// Minimisation value of a whole bicluster list.
pub trait GlobalScore: Send + Sync + Debug {
    fn value(&self, biclusters: &[Bicluster]) -> f64;
}

/// One configured objective.
pub trait FitnessFunction: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Minimisation value for a non-empty list of non-degenerate biclusters.
    fn run(&self, biclusters: &[Bicluster]) -> f64;

    /// Per-bicluster memo, for objectives that keep one.
    fn internal_cache(&self) -> Option<&Arc<dyn CacheStore<f64>>> {
        None
    }
}

/// Per-bicluster individual objective with an optional internal cache.
#[derive(Debug)]
pub struct IndividualObjective {
    name: String,
    data: Arc<DataMatrix>,
    score: Box<dyn BiclusterScore>,
    summarizer: Summarizer,
    cache: Option<Arc<dyn CacheStore<f64>>>,
}

impl IndividualObjective {
    pub fn new(
        name: impl Into<String>,
        data: Arc<DataMatrix>,
        score: Box<dyn BiclusterScore>,
        summarizer: Summarizer,
        cache: Option<Arc<dyn CacheStore<f64>>>,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            score,
            summarizer,
            cache,
        }
    }
}

impl FitnessFunction for IndividualObjective {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, biclusters: &[Bicluster]) -> f64 {
        let scores: Vec<f64> = biclusters
            .iter()
            .map(|bicluster| match &self.cache {
                Some(cache) => cache.get_or_insert_with(&bicluster.key(), &mut || {
                    self.score.score(&self.data, bicluster)
                }),
                None => self.score.score(&self.data, bicluster),
            })
            .collect();
        1.0 - self.summarizer.summarize(&scores)
    }

    fn internal_cache(&self) -> Option<&Arc<dyn CacheStore<f64>>> {
        self.cache.as_ref()
    }
}

/// Per-bicluster contextual objective. A lone bicluster scores 0.
#[derive(Debug)]
pub struct ContextualObjective {
    name: String,
    data: Arc<DataMatrix>,
    score: Box<dyn ContextualScore>,
    summarizer: Summarizer,
}

impl ContextualObjective {
    pub fn new(
        name: impl Into<String>,
        data: Arc<DataMatrix>,
        score: Box<dyn ContextualScore>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            score,
            summarizer,
        }
    }
}

impl FitnessFunction for ContextualObjective {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, biclusters: &[Bicluster]) -> f64 {
        let scores: Vec<f64> = (0..biclusters.len())
            .map(|i| {
                if biclusters.len() == 1 {
                    return 0.0;
                }
                let others: Vec<&Bicluster> = biclusters
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, b)| b)
                    .collect();
                self.score.score(&self.data, &biclusters[i], &others)
            })
            .collect();
        1.0 - self.summarizer.summarize(&scores)
    }
}

/// Whole-solution objective.
#[derive(Debug)]
pub struct GlobalObjective {
    name: String,
    score: Box<dyn GlobalScore>,
}

impl GlobalObjective {
    pub fn new(name: impl Into<String>, score: Box<dyn GlobalScore>) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl FitnessFunction for GlobalObjective {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, biclusters: &[Bicluster]) -> f64 {
        self.score.value(biclusters)
    }
}

const SUMMARISE_KEY: &str = "summariseindividualobjectives";

fn warn_unknown(spec: &ComponentSpec, known: &[&str]) {
    for key in spec.unknown_keys(known) {
        warn!(objective = %spec.name, key, "ignoring unknown objective parameter");
    }
}

fn summarizer_for(spec: &ComponentSpec, default: Summarizer) -> Result<Summarizer> {
    spec.get(SUMMARISE_KEY).map_or(Ok(default), Summarizer::parse)
}

fn weight(spec: &ComponentSpec, key: &str) -> Result<f64> {
    let value = spec.f64_or(key, 0.5)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(MoebaError::Configuration(format!(
            "{}: {} must lie in [0, 1], got {}",
            spec.name, key, value
        )));
    }
    Ok(value)
}

/// Parses the objective list of `options` against `data`.
///
/// Names are case-insensitive; `summariseIndividualObjectives=` overrides the
/// run-wide summariser for one objective. When `options` selects an internal
/// cache every individual objective gets its own store.
pub fn build_objectives(
    data: &Arc<DataMatrix>,
    options: &EngineOptions,
) -> Result<Vec<Box<dyn FitnessFunction>>> {
    let specs = ComponentSpec::parse_list(options.fitness_functions())?;
    if specs.is_empty() {
        return Err(MoebaError::Configuration(
            "at least one fitness function is required".to_string(),
        ));
    }
    let default_summarizer = options.summarise_individual_objectives();

    specs
        .iter()
        .map(|spec| -> Result<Box<dyn FitnessFunction>> {
            let summarizer = summarizer_for(spec, default_summarizer)?;
            let cache = options.internal_cache().map(|backing| backing.build::<f64>());
            let individual = |score: Box<dyn BiclusterScore>| -> Box<dyn FitnessFunction> {
                Box::new(IndividualObjective::new(
                    spec.name.clone(),
                    Arc::clone(data),
                    score,
                    summarizer,
                    cache.clone(),
                ))
            };
            let contextual = |score: Box<dyn ContextualScore>| -> Box<dyn FitnessFunction> {
                Box::new(ContextualObjective::new(
                    spec.name.clone(),
                    Arc::clone(data),
                    score,
                    summarizer,
                ))
            };

            let objective = match spec.name.as_str() {
                "biclustersizenormcomp" => {
                    warn_unknown(spec, &[SUMMARISE_KEY]);
                    individual(Box::new(BiclusterSize))
                }
                "biclustersizeweightednormcomp" => {
                    warn_unknown(spec, &[SUMMARISE_KEY, "rowsweight"]);
                    individual(Box::new(BiclusterSizeWeighted::new(weight(spec, "rowsweight")?)))
                }
                "biclustervariancenorm" => {
                    warn_unknown(spec, &[SUMMARISE_KEY]);
                    individual(Box::new(BiclusterVariance))
                }
                "rowvariancenormcomp" => {
                    warn_unknown(spec, &[SUMMARISE_KEY]);
                    individual(Box::new(RowVariance))
                }
                "meansquaredresiduenorm" => {
                    warn_unknown(spec, &[SUMMARISE_KEY]);
                    individual(Box::new(MeanSquaredResidue))
                }
                "biclustersizenumbicsnormcomp" => {
                    warn_unknown(spec, &[SUMMARISE_KEY, "rowsweight", "coherenceweight"]);
                    contextual(Box::new(BiclusterSizeNumBics::new(
                        weight(spec, "rowsweight")?,
                        weight(spec, "coherenceweight")?,
                    )))
                }
                "biclustersizecovernormcomp" => {
                    warn_unknown(spec, &[SUMMARISE_KEY, "rowsweight"]);
                    contextual(Box::new(BiclusterSizeCover::new(weight(spec, "rowsweight")?)))
                }
                "distancebetweenbiclustersnormcomp" => {
                    warn_unknown(spec, &[SUMMARISE_KEY]);
                    contextual(Box::new(DistanceBetweenBiclusters))
                }
                "regulatorycoherencenormcomp" => {
                    warn_unknown(spec, &[]);
                    let affinity = options.affinity().ok_or_else(|| {
                        MoebaError::Configuration(
                            "regulatorycoherencenormcomp needs an affinity matrix".to_string(),
                        )
                    })?;
                    let score = RegulatoryCoherence::new(data, Arc::clone(affinity))?;
                    Box::new(GlobalObjective::new(spec.name.clone(), Box::new(score)))
                }
                other => {
                    return Err(MoebaError::Configuration(format!(
                        "fitness function not implemented: {}",
                        other
                    )))
                }
            };
            Ok(objective)
        })
        .collect()
}
