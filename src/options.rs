//! # EngineOptions
//!
//! The `EngineOptions` struct holds every setting of one optimisation run:
//! population size, evaluation budget, thread count, the algorithm variant,
//! the objective list, the genetic operators and their probabilities, the
//! representation, caching and observers.
//!
//! Operator, objective and observer lists are semicolon separated strings.
//! Each element may carry parameters using the `name(key=value, ...)` syntax,
//! parsed by [`ComponentSpec`].
//!
//! ## Example
//!
//! ```rust
//! use moeba::options::{EngineOptions, LogLevel};
//!
//! let options = EngineOptions::builder()
//!     .population_size(20)
//!     .max_evaluations(200)
//!     .num_threads(2)
//!     .log_level(LogLevel::Minimal)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(options.num_approx_operations(), 180);
//! assert_eq!(options.algorithm(), "NSGAII-AsyncParallel");
//! ```

use std::sync::Arc;

use crate::caching::CacheBacking;
use crate::codec::RepresentationKind;
use crate::error::{MoebaError, Result, ResultExt};
use crate::fitness::{AffinityMatrix, Summarizer};

/// Gates the per-generation progress events emitted through `tracing`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// One event per generation plus the per-objective trace values.
    Verbose,
    /// One event per generation.
    Minimal,
    /// Silent apart from warnings.
    #[default]
    None,
}

/// One element of a semicolon separated component list, e.g.
/// `GroupedBasedCrossover(shuffleEnd=0.5, dynamicStartAmount=0.1)`.
///
/// Names and keys are lowercased; surrounding whitespace is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub name: String,
    pub params: Vec<(String, String)>,
}

impl ComponentSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim().to_lowercase();
        let Some(open) = raw.find('(') else {
            return Ok(Self {
                name: raw,
                params: Vec::new(),
            });
        };
        if !raw.ends_with(')') {
            return Err(MoebaError::Configuration(format!(
                "missing ')' in component {:?}",
                raw
            )));
        }

        let name = raw[..open].trim().to_string();
        let body = &raw[open + 1..raw.len() - 1];
        let params = body
            .split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    MoebaError::Configuration(format!(
                        "parameter {:?} of {} is not key=value",
                        pair, name
                    ))
                })?;
                Ok((key.trim().to_string(), value.trim().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { name, params })
    }

    /// Parses a semicolon separated list, skipping empty elements.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        raw.split(';')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Reads a float parameter, falling back to `default` when absent.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get(key) {
            Some(raw) => raw
                .parse::<f64>()
                .context(format!("{}: invalid {} {:?}", self.name, key, raw)),
            None => Ok(default),
        }
    }

    /// Keys present that are not in `known`.
    pub fn unknown_keys<'a>(&'a self, known: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.params
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(move |k| !known.contains(k))
    }
}

/// Configuration of one run. Build it through [`EngineOptions::builder`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    population_size: usize,
    max_evaluations: usize,
    num_threads: usize,
    algorithm: String,
    fitness_functions: String,
    crossover_operator: String,
    crossover_probability: f64,
    mutation_operator: String,
    mutation_probability: String,
    representation: RepresentationKind,
    specific_num_biclusters: usize,
    generic_initial_min_perc_bics: f64,
    generic_initial_max_perc_bics: f64,
    summarise_individual_objectives: Summarizer,
    external_cache: Option<CacheBacking>,
    internal_cache: Option<CacheBacking>,
    observers: String,
    log_level: LogLevel,
    seed: Option<u64>,
    affinity: Option<Arc<AffinityMatrix>>,
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl EngineOptions {
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }

    /// Checks every option that can be checked without the input matrix.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(MoebaError::Configuration(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.max_evaluations < self.population_size {
            return Err(MoebaError::Configuration(format!(
                "the evaluation budget ({}) must cover the initial population ({})",
                self.max_evaluations, self.population_size
            )));
        }
        if self.num_threads == 0 {
            return Err(MoebaError::Configuration(
                "at least one worker thread is required".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(MoebaError::Configuration(format!(
                "crossover probability must lie in [0, 1], got {}",
                self.crossover_probability
            )));
        }
        if self.generic_initial_min_perc_bics > self.generic_initial_max_perc_bics {
            return Err(MoebaError::Configuration(format!(
                "minimum initial bicluster percentage {} exceeds the maximum {}",
                self.generic_initial_min_perc_bics, self.generic_initial_max_perc_bics
            )));
        }
        if self.fitness_functions.trim().is_empty() {
            return Err(MoebaError::Configuration(
                "at least one fitness function is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of genetic operations a run performs, roughly.
    pub fn num_approx_operations(&self) -> usize {
        self.max_evaluations
            .saturating_sub(self.population_size)
            .max(1)
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn fitness_functions(&self) -> &str {
        &self.fitness_functions
    }

    pub fn crossover_operator(&self) -> &str {
        &self.crossover_operator
    }

    pub fn crossover_probability(&self) -> f64 {
        self.crossover_probability
    }

    pub fn mutation_operator(&self) -> &str {
        &self.mutation_operator
    }

    pub fn mutation_probability(&self) -> &str {
        &self.mutation_probability
    }

    pub fn representation(&self) -> RepresentationKind {
        self.representation
    }

    pub fn specific_num_biclusters(&self) -> usize {
        self.specific_num_biclusters
    }

    pub fn generic_initial_min_perc_bics(&self) -> f64 {
        self.generic_initial_min_perc_bics
    }

    pub fn generic_initial_max_perc_bics(&self) -> f64 {
        self.generic_initial_max_perc_bics
    }

    pub fn summarise_individual_objectives(&self) -> Summarizer {
        self.summarise_individual_objectives
    }

    pub fn external_cache(&self) -> Option<CacheBacking> {
        self.external_cache
    }

    pub fn internal_cache(&self) -> Option<CacheBacking> {
        self.internal_cache
    }

    pub fn observers(&self) -> &str {
        &self.observers
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn affinity(&self) -> Option<&Arc<AffinityMatrix>> {
        self.affinity.as_ref()
    }

    pub fn set_population_size(&mut self, population_size: usize) {
        self.population_size = population_size;
    }

    pub fn set_max_evaluations(&mut self, max_evaluations: usize) {
        self.max_evaluations = max_evaluations;
    }

    pub fn set_log_level(&mut self, log_level: LogLevel) {
        self.log_level = log_level;
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptionsBuilder::default().assemble()
    }
}

/// Builder for [`EngineOptions`]. Unset fields take their defaults in
/// [`build`](EngineOptionsBuilder::build), which also validates the result.
#[derive(Debug, Clone, Default)]
pub struct EngineOptionsBuilder {
    population_size: Option<usize>,
    max_evaluations: Option<usize>,
    num_threads: Option<usize>,
    algorithm: Option<String>,
    fitness_functions: Option<String>,
    crossover_operator: Option<String>,
    crossover_probability: Option<f64>,
    mutation_operator: Option<String>,
    mutation_probability: Option<String>,
    representation: Option<RepresentationKind>,
    specific_num_biclusters: Option<usize>,
    generic_initial_min_perc_bics: Option<f64>,
    generic_initial_max_perc_bics: Option<f64>,
    summarise_individual_objectives: Option<Summarizer>,
    external_cache: Option<CacheBacking>,
    internal_cache: Option<CacheBacking>,
    observers: Option<String>,
    log_level: Option<LogLevel>,
    seed: Option<u64>,
    affinity: Option<Arc<AffinityMatrix>>,
}

impl EngineOptionsBuilder {
    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    /// Total number of evaluations, initial population included.
    pub fn max_evaluations(mut self, value: usize) -> Self {
        self.max_evaluations = Some(value);
        self
    }

    pub fn num_threads(mut self, value: usize) -> Self {
        self.num_threads = Some(value);
        self
    }

    pub fn algorithm(mut self, value: impl Into<String>) -> Self {
        self.algorithm = Some(value.into());
        self
    }

    pub fn fitness_functions(mut self, value: impl Into<String>) -> Self {
        self.fitness_functions = Some(value.into());
        self
    }

    pub fn crossover_operator(mut self, value: impl Into<String>) -> Self {
        self.crossover_operator = Some(value.into());
        self
    }

    pub fn crossover_probability(mut self, value: f64) -> Self {
        self.crossover_probability = Some(value);
        self
    }

    pub fn mutation_operator(mut self, value: impl Into<String>) -> Self {
        self.mutation_operator = Some(value.into());
        self
    }

    /// Either a fixed probability (`"0.1"`) or a linear schedule from the
    /// first value down to the second (`"0.5-0.05"`).
    pub fn mutation_probability(mut self, value: impl Into<String>) -> Self {
        self.mutation_probability = Some(value.into());
        self
    }

    pub fn representation(mut self, value: RepresentationKind) -> Self {
        self.representation = Some(value);
        self
    }

    pub fn specific_num_biclusters(mut self, value: usize) -> Self {
        self.specific_num_biclusters = Some(value);
        self
    }

    pub fn generic_initial_perc_bics(mut self, min: f64, max: f64) -> Self {
        self.generic_initial_min_perc_bics = Some(min);
        self.generic_initial_max_perc_bics = Some(max);
        self
    }

    pub fn summarise_individual_objectives(mut self, value: Summarizer) -> Self {
        self.summarise_individual_objectives = Some(value);
        self
    }

    pub fn external_cache(mut self, value: CacheBacking) -> Self {
        self.external_cache = Some(value);
        self
    }

    pub fn internal_cache(mut self, value: CacheBacking) -> Self {
        self.internal_cache = Some(value);
        self
    }

    pub fn observers(mut self, value: impl Into<String>) -> Self {
        self.observers = Some(value.into());
        self
    }

    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.log_level = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Affinity matrix consumed by `RegulatoryCoherenceNormComp`.
    pub fn affinity(mut self, value: AffinityMatrix) -> Self {
        self.affinity = Some(Arc::new(value));
        self
    }

    /// Applies defaults and validates.
    pub fn build(self) -> Result<EngineOptions> {
        let options = self.assemble();
        options.validate()?;
        Ok(options)
    }

    fn assemble(self) -> EngineOptions {
        EngineOptions {
            population_size: self.population_size.unwrap_or(100),
            max_evaluations: self.max_evaluations.unwrap_or(25_000),
            num_threads: self.num_threads.unwrap_or_else(default_num_threads),
            algorithm: self
                .algorithm
                .unwrap_or_else(|| "NSGAII-AsyncParallel".to_string()),
            fitness_functions: self
                .fitness_functions
                .unwrap_or_else(|| "BiclusterSizeNormComp;MeanSquaredResidueNorm".to_string()),
            crossover_operator: self
                .crossover_operator
                .unwrap_or_else(|| "GroupedBasedCrossover;CellUniformCrossover".to_string()),
            crossover_probability: self.crossover_probability.unwrap_or(0.9),
            mutation_operator: self.mutation_operator.unwrap_or_else(|| {
                "SwapMutation;BicUniformMutation;CellUniformMutation".to_string()
            }),
            mutation_probability: self
                .mutation_probability
                .unwrap_or_else(|| "0.1".to_string()),
            representation: self.representation.unwrap_or_default(),
            specific_num_biclusters: self.specific_num_biclusters.unwrap_or(2),
            generic_initial_min_perc_bics: self.generic_initial_min_perc_bics.unwrap_or(0.1),
            generic_initial_max_perc_bics: self.generic_initial_max_perc_bics.unwrap_or(0.2),
            summarise_individual_objectives: self
                .summarise_individual_objectives
                .unwrap_or_default(),
            external_cache: self.external_cache,
            internal_cache: self.internal_cache,
            observers: self.observers.unwrap_or_default(),
            log_level: self.log_level.unwrap_or_default(),
            seed: self.seed,
            affinity: self.affinity,
        }
    }
}
