//! # Asynchronous master/worker engine
//!
//! A fixed pool of worker threads evaluates genomes pulled from a shared
//! pending channel and pushes the results onto a completed channel. The
//! master is the only thread that touches the population, the archive, the
//! random source and the observers. It handles results in completion order
//! and answers each one with exactly one new genome until the evaluation
//! budget is reached, then drains whatever is still in flight.
//!
//! ## Example
//!
//! ```rust,no_run
//! use moeba::data::DataMatrix;
//! use moeba::options::EngineOptions;
//! use moeba::scheduler::AsyncEngine;
//!
//! let data = DataMatrix::numeric(vec![vec![0.0; 6]; 10]).unwrap();
//! let options = EngineOptions::builder()
//!     .population_size(20)
//!     .max_evaluations(200)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let result = AsyncEngine::new(data, options).unwrap().run().unwrap();
//! for solution in &result.solutions {
//!     println!("{:?}", solution.objectives);
//! }
//! ```

pub mod observer;
mod worker;

pub use self::observer::{
    build_observers, BiclusterCountObserver, ExternalCacheObserver, FitnessEvolutionObserver,
    FitnessTrace, InternalCacheObserver, NumEvaluationsObserver, Observer, Statistic,
};

use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use self::worker::{run_worker, Completed, Task};
use crate::codec::{build_codec, Codec, RepresentationKind};
use crate::data::DataMatrix;
use crate::error::{MoebaError, Result};
use crate::fitness::Evaluator;
use crate::genome::Genome;
use crate::operators::{build_crossover, build_mutation, CrossoverOperator, MutationOperator};
use crate::options::{EngineOptions, LogLevel};
use crate::population::archive::{non_dominated, BestSolutionsArchive};
use crate::population::ranking::rank_and_crowd;
use crate::population::replacement::{
    MuPlusLambdaReplacement, RankingAndCrowdingReplacement, Replacement,
};
use crate::population::{Comparator, Individual, TournamentSelection};
use crate::rng::{RandomNumberGenerator, RandomSource};

/// Search strategy run by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Rank and crowding replacement, result read from the population.
    NsgaII,
    /// As [`Algorithm::NsgaII`], plus an archive of every non-dominated
    /// individual seen; the result is read from the archive.
    NsgaIIExternalArchive,
    /// Single objective, (μ+λ) replacement.
    Ga,
}

impl Algorithm {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "nsgaii-asyncparallel" => Ok(Self::NsgaII),
            "nsgaiiexternalfile-asyncparallel" => Ok(Self::NsgaIIExternalArchive),
            "ga-asyncparallel" => Ok(Self::Ga),
            other => Err(MoebaError::Configuration(format!(
                "algorithm not implemented: {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NsgaII => "NSGAII-AsyncParallel",
            Self::NsgaIIExternalArchive => "NSGAIIExternalFile-AsyncParallel",
            Self::Ga => "GA-AsyncParallel",
        }
    }

    fn replacement(&self) -> Box<dyn Replacement> {
        match self {
            Self::Ga => Box::new(MuPlusLambdaReplacement),
            _ => Box::new(RankingAndCrowdingReplacement),
        }
    }

    fn comparator(&self) -> Comparator {
        match self {
            Self::Ga => Comparator::SingleObjective(0),
            _ => Comparator::RankThenCrowding,
        }
    }
}

/// Outcome of [`AsyncEngine::run`].
#[derive(Debug)]
pub struct RunResult {
    /// Non-dominated individuals of the population, or of the archive read
    /// for [`Algorithm::NsgaIIExternalArchive`].
    pub solutions: Vec<Individual>,
    /// Final population, exactly `population_size` individuals.
    pub population: Vec<Individual>,
    /// Completed evaluations, in-flight work drained at the end included.
    pub evaluations: usize,
    /// Best value so far per objective, one entry per generation.
    pub trace: Vec<Vec<f64>>,
    pub elapsed: Duration,
    pub observers: Vec<Box<dyn Observer>>,
}

impl RunResult {
    /// Writes every observer report, each under a `# name` header line.
    pub fn write_observers(&self, out: &mut dyn Write) -> Result<()> {
        for observer in &self.observers {
            writeln!(out, "# {}", observer.name())?;
            observer.write_to(out)?;
        }
        Ok(())
    }
}

/// Master-side state of one run.
struct RunState {
    rng: RandomNumberGenerator,
    population: Vec<Individual>,
    archive: Option<BestSolutionsArchive>,
    trace: FitnessTrace,
    observers: Vec<Box<dyn Observer>>,
    evaluations: usize,
    submitted: usize,
    in_flight: usize,
}

/// Asynchronous parallel evolutionary biclustering engine.
#[derive(Debug)]
pub struct AsyncEngine {
    options: EngineOptions,
    algorithm: Algorithm,
    evaluator: Evaluator,
    crossover: Box<dyn CrossoverOperator>,
    mutation: Box<dyn MutationOperator>,
    selection: TournamentSelection,
    replacement: Box<dyn Replacement>,
}

impl AsyncEngine {
    /// Validates `options` against `data` and assembles every component.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an unknown algorithm, objective,
    /// operator or observer, for wrong operator arity, for out-of-range
    /// parameters, and for the single-objective algorithm configured with
    /// several objectives.
    pub fn new(data: DataMatrix, options: EngineOptions) -> Result<Self> {
        options.validate()?;
        let algorithm = Algorithm::parse(options.algorithm())?;
        let data = Arc::new(data);

        let codec: Arc<dyn Codec> =
            Arc::from(build_codec(data.num_rows(), data.num_cols(), &options)?);
        let evaluator = Evaluator::from_options(&data, Arc::clone(&codec), &options)?;
        if algorithm == Algorithm::Ga && evaluator.num_objectives() != 1 {
            return Err(MoebaError::Configuration(format!(
                "{} optimises a single objective, got {}",
                algorithm.name(),
                evaluator.num_objectives()
            )));
        }

        let num_approx_operations = options.num_approx_operations();
        let crossover = build_crossover(
            codec.kind(),
            options.crossover_operator(),
            options.crossover_probability(),
            num_approx_operations,
        )?;
        let mutation = build_mutation(
            codec.kind(),
            options.mutation_operator(),
            options.mutation_probability(),
            num_approx_operations,
        )?;

        // fail on a bad observer list before any thread exists
        build_observers(
            options.observers(),
            options.population_size(),
            codec.kind(),
            &evaluator,
        )?;

        Ok(Self {
            selection: TournamentSelection::binary(algorithm.comparator()),
            replacement: algorithm.replacement(),
            options,
            algorithm,
            evaluator,
            crossover,
            mutation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    fn codec(&self) -> &Arc<dyn Codec> {
        self.evaluator.codec()
    }

    /// Runs the search until the evaluation budget is spent.
    pub fn run(&self) -> Result<RunResult> {
        let started = Instant::now();
        let population_size = self.options.population_size();
        let num_threads = self.options.num_threads();
        info!(
            algorithm = self.algorithm.name(),
            population_size,
            max_evaluations = self.options.max_evaluations(),
            num_threads,
            objectives = ?self.evaluator.objective_names(),
            "starting engine"
        );

        let mut state = RunState {
            rng: RandomNumberGenerator::from_optional_seed(self.options.seed()),
            population: Vec::with_capacity(population_size + 1),
            archive: match self.algorithm {
                Algorithm::NsgaIIExternalArchive => {
                    Some(BestSolutionsArchive::new(population_size)?)
                }
                _ => None,
            },
            trace: FitnessTrace::new(population_size, self.evaluator.num_objectives()),
            observers: build_observers(
                self.options.observers(),
                population_size,
                self.codec().kind(),
                &self.evaluator,
            )?,
            evaluations: 0,
            submitted: 0,
            in_flight: 0,
        };

        let (pending_tx, pending_rx) = mpsc::channel::<Task>();
        let (completed_tx, completed_rx) = mpsc::channel::<Completed>();
        let pending_rx = Mutex::new(pending_rx);
        let evaluator = &self.evaluator;

        thread::scope(|scope| -> Result<()> {
            for index in 0..num_threads {
                let completed_tx = completed_tx.clone();
                let pending_rx = &pending_rx;
                thread::Builder::new()
                    .name(format!("moeba-worker-{}", index))
                    .spawn_scoped(scope, move || {
                        run_worker(index, evaluator, pending_rx, completed_tx)
                    })?;
            }
            drop(completed_tx);
            // the senders and the completed receiver are dropped on return,
            // which releases every worker before the scope joins them
            self.drive(&mut state, pending_tx, completed_rx)
        })?;

        self.log_cache_statistics();

        let RunState {
            population,
            archive,
            trace,
            observers,
            evaluations,
            ..
        } = state;
        let solutions = match &archive {
            Some(archive) => non_dominated(&archive.solutions()),
            None => non_dominated(&population),
        };
        let elapsed = started.elapsed();
        info!(
            evaluations,
            solutions = solutions.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "engine finished"
        );

        Ok(RunResult {
            solutions,
            population,
            evaluations,
            trace: trace.into_generations(),
            elapsed,
            observers,
        })
    }

    /// The master loop.
    fn drive(
        &self,
        state: &mut RunState,
        pending: Sender<Task>,
        completed: Receiver<Completed>,
    ) -> Result<()> {
        let population_size = self.options.population_size();
        let max_evaluations = self.options.max_evaluations();

        let initial = population_size.max(self.options.num_threads());
        for _ in 0..initial {
            let genome = self.codec().random_genome(&mut state.rng);
            Self::submit(state, &pending, genome)?;
        }

        while state.in_flight > 0 {
            let (id, outcome) = completed.recv().map_err(|_| {
                MoebaError::Scheduler("all workers stopped before the run finished".to_string())
            })?;
            state.in_flight -= 1;
            trace!(task = id, "result received");
            self.integrate(state, outcome?)?;

            if state.evaluations < max_evaluations {
                let genome = self.breed(&state.population, &mut state.rng)?;
                Self::submit(state, &pending, genome)?;
            }
        }
        debug!(
            submitted = state.submitted,
            evaluations = state.evaluations,
            "all work drained"
        );
        Ok(())
    }

    fn submit(state: &mut RunState, pending: &Sender<Task>, genome: Genome) -> Result<()> {
        pending
            .send(Task {
                id: state.submitted,
                genome,
            })
            .map_err(|_| MoebaError::Scheduler("no worker is accepting tasks".to_string()))?;
        state.submitted += 1;
        state.in_flight += 1;
        Ok(())
    }

    /// Routes one completed evaluation to the observers, the archive and the
    /// population.
    fn integrate(&self, state: &mut RunState, individual: Individual) -> Result<()> {
        state.evaluations += 1;
        for observer in state.observers.iter_mut() {
            observer.register(&individual);
        }
        if let Some(best) = state.trace.register(&individual) {
            let generation = state.evaluations / self.options.population_size();
            self.log_generation(generation, state.evaluations, best);
        }
        if let Some(archive) = state.archive.as_mut() {
            archive.add(individual.clone());
        }

        let population_size = self.options.population_size();
        if state.population.len() < population_size {
            state.population.push(individual);
            rank_and_crowd(&mut state.population);
        } else {
            let population = std::mem::take(&mut state.population);
            state.population =
                self.replacement
                    .replace(population, vec![individual], population_size)?;
        }
        Ok(())
    }

    /// One offspring from two tournament winners, or a random genome while
    /// the population is too small to select from.
    fn breed(&self, population: &[Individual], rng: &mut dyn RandomSource) -> Result<Genome> {
        if population.len() <= 2 {
            return Ok(self.codec().random_genome(rng));
        }
        let first = self.selection.select(population, rng)?;
        let second = self.selection.select(population, rng)?;
        let (mut child, _) =
            self.crossover
                .crossover(&population[first].genome, &population[second].genome, rng);
        self.mutation.mutate(&mut child, rng);
        self.codec().repair(&mut child);

        if self.codec().kind() == RepresentationKind::Generic && !child.is_permutation() {
            return Err(MoebaError::InvariantViolation(format!(
                "offspring row order is not a permutation: {:?}",
                child.integers
            )));
        }
        Ok(child)
    }

    fn log_generation(&self, generation: usize, evaluations: usize, best: &[f64]) {
        match self.options.log_level() {
            LogLevel::None => {}
            LogLevel::Minimal => info!(generation, evaluations, "generation completed"),
            LogLevel::Verbose => {
                info!(
                    generation,
                    evaluations,
                    mutation_probability = self.mutation.current_probability(),
                    "generation completed"
                );
                for (name, value) in self.evaluator.objective_names().iter().zip(best) {
                    info!(generation, objective = %name, best = *value, "best so far");
                }
            }
        }
    }

    fn log_cache_statistics(&self) {
        if let Some(cache) = self.evaluator.external_cache() {
            info!(
                entries = cache.len(),
                lookups = cache.num_getters(),
                "external cache"
            );
        }
        let caches = self.evaluator.internal_caches();
        for (name, cache) in self.evaluator.objective_names().iter().zip(caches) {
            if let Some(cache) = cache {
                info!(
                    objective = %name,
                    entries = cache.len(),
                    lookups = cache.num_getters(),
                    "internal cache"
                );
            }
        }
    }
}
