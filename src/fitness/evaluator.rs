use std::sync::Arc;

use tracing::trace;

use super::{build_objectives, FitnessFunction};
use crate::bicluster::{biclusters_key, Bicluster};
use crate::caching::CacheStore;
use crate::codec::Codec;
use crate::data::DataMatrix;
use crate::error::{MoebaError, Result};
use crate::genome::Genome;
use crate::options::EngineOptions;

/// Decoded biclusters of a genome together with its objective values.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Non-degenerate biclusters, sorted by their smallest row.
    pub biclusters: Vec<Bicluster>,
    pub objectives: Vec<f64>,
}

/// Decodes genomes and scores them on every configured objective.
///
/// Shared by all workers; the only mutable state lives in the caches.
#[derive(Debug)]
pub struct Evaluator {
    codec: Arc<dyn Codec>,
    objectives: Vec<Box<dyn FitnessFunction>>,
    external_cache: Option<Arc<dyn CacheStore<Vec<f64>>>>,
}

impl Evaluator {
    pub fn new(
        codec: Arc<dyn Codec>,
        objectives: Vec<Box<dyn FitnessFunction>>,
        external_cache: Option<Arc<dyn CacheStore<Vec<f64>>>>,
    ) -> Self {
        Self {
            codec,
            objectives,
            external_cache,
        }
    }

    /// Builds the objectives and caches selected in `options`.
    pub fn from_options(
        data: &Arc<DataMatrix>,
        codec: Arc<dyn Codec>,
        options: &EngineOptions,
    ) -> Result<Self> {
        let objectives = build_objectives(data, options)?;
        let external_cache = options.external_cache().map(|backing| backing.build());
        Ok(Self::new(codec, objectives, external_cache))
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    pub fn objective_names(&self) -> Vec<&str> {
        self.objectives.iter().map(|o| o.name()).collect()
    }

    pub fn external_cache(&self) -> Option<&Arc<dyn CacheStore<Vec<f64>>>> {
        self.external_cache.as_ref()
    }

    /// Internal cache of each objective, in objective order.
    pub fn internal_caches(&self) -> Vec<Option<Arc<dyn CacheStore<f64>>>> {
        self.objectives
            .iter()
            .map(|o| o.internal_cache().cloned())
            .collect()
    }

    pub fn evaluate(&self, genome: &Genome) -> Result<Evaluation> {
        let biclusters: Vec<Bicluster> = self
            .codec
            .decode(genome)
            .into_iter()
            .filter(|b| !b.is_degenerate())
            .collect();

        if biclusters.is_empty() {
            return Ok(Evaluation {
                biclusters,
                objectives: vec![1.0; self.objectives.len()],
            });
        }

        let objectives = match &self.external_cache {
            Some(cache) => cache.try_get_or_insert_with(&biclusters_key(&biclusters), &mut || {
                trace!("external cache miss");
                self.score(&biclusters)
            })?,
            None => self.score(&biclusters)?,
        };

        Ok(Evaluation {
            biclusters,
            objectives,
        })
    }

    fn score(&self, biclusters: &[Bicluster]) -> Result<Vec<f64>> {
        self.objectives
            .iter()
            .map(|objective| {
                let value = objective.run(biclusters);
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(MoebaError::FitnessCalculation(format!(
                        "{} produced {}",
                        objective.name(),
                        value
                    )))
                }
            })
            .collect()
    }
}
