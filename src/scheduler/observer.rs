//! Per-generation statistics collected by the master.
//!
//! A generation is a window of `population_size` consecutive completed
//! evaluations. Observers see every completed individual in completion order
//! and write one text report each.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::Write;
use std::sync::Arc;

use crate::caching::CacheStore;
use crate::codec::RepresentationKind;
use crate::error::{MoebaError, Result};
use crate::fitness::Evaluator;
use crate::options::ComponentSpec;
use crate::population::Individual;

/// Receives every completed evaluation.
pub trait Observer: Send + Debug {
    fn name(&self) -> &str;

    fn register(&mut self, individual: &Individual);

    fn write_to(&self, out: &mut dyn Write) -> Result<()>;
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Counts evaluations and reports when a generation closes.
#[derive(Debug, Clone)]
struct GenerationCounter {
    population_size: usize,
    count: usize,
}

impl GenerationCounter {
    fn new(population_size: usize) -> Self {
        Self {
            population_size: population_size.max(1),
            count: 0,
        }
    }

    /// Registers one evaluation; true when it closes a generation.
    fn tick(&mut self) -> bool {
        self.count += 1;
        self.count % self.population_size == 0
    }
}

/// Best value seen so far on every objective, sampled at each generation
/// boundary.
#[derive(Debug, Clone)]
pub struct FitnessTrace {
    counter: GenerationCounter,
    best: Vec<f64>,
    generations: Vec<Vec<f64>>,
}

impl FitnessTrace {
    pub fn new(population_size: usize, num_objectives: usize) -> Self {
        Self {
            counter: GenerationCounter::new(population_size),
            best: vec![f64::INFINITY; num_objectives],
            generations: Vec::new(),
        }
    }

    /// Returns the freshly closed generation's values, if any.
    pub fn register(&mut self, individual: &Individual) -> Option<&[f64]> {
        for (best, value) in self.best.iter_mut().zip(&individual.objectives) {
            *best = best.min(*value);
        }
        if self.counter.tick() {
            self.generations.push(self.best.clone());
            return self.generations.last().map(Vec::as_slice);
        }
        None
    }

    pub fn generations(&self) -> &[Vec<f64>] {
        &self.generations
    }

    pub fn into_generations(self) -> Vec<Vec<f64>> {
        self.generations
    }
}

/// Share of each generation's individuals per bicluster count.
#[derive(Debug, Clone)]
pub struct BiclusterCountObserver {
    counter: GenerationCounter,
    current: BTreeMap<usize, usize>,
    percentages: BTreeMap<usize, Vec<f64>>,
    generations: usize,
}

impl BiclusterCountObserver {
    pub fn new(population_size: usize) -> Self {
        Self {
            counter: GenerationCounter::new(population_size),
            current: BTreeMap::new(),
            percentages: BTreeMap::new(),
            generations: 0,
        }
    }

    /// Per bicluster count, one percentage per closed generation.
    pub fn percentages(&self) -> &BTreeMap<usize, Vec<f64>> {
        &self.percentages
    }
}

impl Observer for BiclusterCountObserver {
    fn name(&self) -> &str {
        "biclustercountobserver"
    }

    fn register(&mut self, individual: &Individual) {
        *self.current.entry(individual.num_biclusters()).or_insert(0) += 1;
        if !self.counter.tick() {
            return;
        }
        let population_size = self.counter.population_size as f64;
        for (&count, &seen) in &self.current {
            let row = self
                .percentages
                .entry(count)
                .or_insert_with(|| vec![0.0; self.generations]);
            row.resize(self.generations, 0.0);
            row.push(seen as f64 / population_size * 100.0);
        }
        self.generations += 1;
        for row in self.percentages.values_mut() {
            row.resize(self.generations, 0.0);
        }
        self.current.clear();
    }

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        for (count, row) in &self.percentages {
            let cells: Vec<String> = row.iter().map(|p| format!("{:.2}", p)).collect();
            writeln!(out, "{}, {}", count, cells.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Min,
    Avg,
    Max,
}

/// Min, mean or max of every objective over each generation window.
#[derive(Debug, Clone)]
pub struct FitnessEvolutionObserver {
    statistic: Statistic,
    counter: GenerationCounter,
    window: Vec<Vec<f64>>,
    generations: Vec<Vec<f64>>,
}

impl FitnessEvolutionObserver {
    pub fn new(statistic: Statistic, population_size: usize, num_objectives: usize) -> Self {
        Self {
            statistic,
            counter: GenerationCounter::new(population_size),
            window: vec![Vec::new(); num_objectives],
            generations: vec![Vec::new(); num_objectives],
        }
    }

    /// Per objective, one value per closed generation.
    pub fn generations(&self) -> &[Vec<f64>] {
        &self.generations
    }
}

impl Observer for FitnessEvolutionObserver {
    fn name(&self) -> &str {
        match self.statistic {
            Statistic::Min => "fitnessevolutionminobserver",
            Statistic::Avg => "fitnessevolutionavgobserver",
            Statistic::Max => "fitnessevolutionmaxobserver",
        }
    }

    fn register(&mut self, individual: &Individual) {
        for (window, value) in self.window.iter_mut().zip(&individual.objectives) {
            window.push(*value);
        }
        if !self.counter.tick() {
            return;
        }
        for (window, row) in self.window.iter_mut().zip(self.generations.iter_mut()) {
            let value = match self.statistic {
                Statistic::Min => window.iter().copied().fold(f64::INFINITY, f64::min),
                Statistic::Max => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                Statistic::Avg => window.iter().sum::<f64>() / window.len() as f64,
            };
            row.push(value);
            window.clear();
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        for row in &self.generations {
            writeln!(out, "{}", join(row))?;
        }
        Ok(())
    }
}

/// Evaluation count at each generation boundary.
#[derive(Debug, Clone)]
pub struct NumEvaluationsObserver {
    counter: GenerationCounter,
    evaluations: Vec<usize>,
}

impl NumEvaluationsObserver {
    pub fn new(population_size: usize) -> Self {
        Self {
            counter: GenerationCounter::new(population_size),
            evaluations: Vec::new(),
        }
    }

    pub fn evaluations(&self) -> &[usize] {
        &self.evaluations
    }
}

impl Observer for NumEvaluationsObserver {
    fn name(&self) -> &str {
        "numevaluationsobserver"
    }

    fn register(&mut self, _individual: &Individual) {
        if self.counter.tick() {
            self.evaluations.push(self.counter.count);
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", join(&self.evaluations))?;
        Ok(())
    }
}

/// Evaluations answered by the whole-solution cache so far, at each
/// generation boundary.
#[derive(Debug)]
pub struct ExternalCacheObserver {
    counter: GenerationCounter,
    cache: Arc<dyn CacheStore<Vec<f64>>>,
    hits: Vec<usize>,
}

impl ExternalCacheObserver {
    pub fn new(population_size: usize, cache: Arc<dyn CacheStore<Vec<f64>>>) -> Self {
        Self {
            counter: GenerationCounter::new(population_size),
            cache,
            hits: Vec::new(),
        }
    }

    pub fn hits(&self) -> &[usize] {
        &self.hits
    }
}

impl Observer for ExternalCacheObserver {
    fn name(&self) -> &str {
        "externalcacheobserver"
    }

    fn register(&mut self, _individual: &Individual) {
        if self.counter.tick() {
            self.hits
                .push(self.counter.count.saturating_sub(self.cache.len()));
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", join(&self.hits))?;
        Ok(())
    }
}

/// Lookups issued to each objective's internal cache, at each generation
/// boundary. Objectives without a cache report zero.
#[derive(Debug)]
pub struct InternalCacheObserver {
    counter: GenerationCounter,
    names: Vec<String>,
    caches: Vec<Option<Arc<dyn CacheStore<f64>>>>,
    getters: Vec<Vec<usize>>,
}

impl InternalCacheObserver {
    pub fn new(
        population_size: usize,
        names: Vec<String>,
        caches: Vec<Option<Arc<dyn CacheStore<f64>>>>,
    ) -> Self {
        let getters = vec![Vec::new(); caches.len()];
        Self {
            counter: GenerationCounter::new(population_size),
            names,
            caches,
            getters,
        }
    }

    pub fn getters(&self) -> &[Vec<usize>] {
        &self.getters
    }
}

impl Observer for InternalCacheObserver {
    fn name(&self) -> &str {
        "internalcacheobserver"
    }

    fn register(&mut self, _individual: &Individual) {
        if !self.counter.tick() {
            return;
        }
        for (cache, row) in self.caches.iter().zip(self.getters.iter_mut()) {
            row.push(cache.as_ref().map_or(0, |c| c.num_getters()));
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> Result<()> {
        for (name, row) in self.names.iter().zip(&self.getters) {
            writeln!(out, "{}, {}", name, join(row))?;
        }
        Ok(())
    }
}

/// Parses the semicolon separated observer list.
pub fn build_observers(
    config: &str,
    population_size: usize,
    representation: RepresentationKind,
    evaluator: &Evaluator,
) -> Result<Vec<Box<dyn Observer>>> {
    let num_objectives = evaluator.num_objectives();
    ComponentSpec::parse_list(config)?
        .iter()
        .map(|spec| -> Result<Box<dyn Observer>> {
            Ok(match spec.name.as_str() {
                "biclustercountobserver" => {
                    if representation == RepresentationKind::Specific {
                        return Err(MoebaError::Configuration(
                            "the specific representation does not support biclustercountobserver"
                                .to_string(),
                        ));
                    }
                    Box::new(BiclusterCountObserver::new(population_size))
                }
                "fitnessevolutionminobserver" => Box::new(FitnessEvolutionObserver::new(
                    Statistic::Min,
                    population_size,
                    num_objectives,
                )),
                "fitnessevolutionavgobserver" => Box::new(FitnessEvolutionObserver::new(
                    Statistic::Avg,
                    population_size,
                    num_objectives,
                )),
                "fitnessevolutionmaxobserver" => Box::new(FitnessEvolutionObserver::new(
                    Statistic::Max,
                    population_size,
                    num_objectives,
                )),
                "numevaluationsobserver" => Box::new(NumEvaluationsObserver::new(population_size)),
                "externalcacheobserver" => {
                    let cache = evaluator.external_cache().ok_or_else(|| {
                        MoebaError::Configuration(
                            "externalcacheobserver requires an external cache".to_string(),
                        )
                    })?;
                    Box::new(ExternalCacheObserver::new(population_size, Arc::clone(cache)))
                }
                "internalcacheobserver" => {
                    let caches = evaluator.internal_caches();
                    if caches.iter().all(Option::is_none) {
                        return Err(MoebaError::Configuration(
                            "internalcacheobserver requires internal caches".to_string(),
                        ));
                    }
                    let names = evaluator
                        .objective_names()
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    Box::new(InternalCacheObserver::new(population_size, names, caches))
                }
                other => {
                    return Err(MoebaError::Configuration(format!(
                        "observer not implemented: {}",
                        other
                    )))
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bicluster::Bicluster;
    use crate::caching::LocalCache;
    use crate::genome::Genome;

    fn individual(objectives: &[f64], num_biclusters: usize) -> Individual {
        let mut individual = Individual::with_objectives(Genome::default(), objectives.to_vec());
        individual.biclusters = (0..num_biclusters)
            .map(|i| Bicluster::new(vec![i], vec![0]))
            .collect();
        individual
    }

    #[test]
    fn test_trace_keeps_best_so_far() {
        let mut trace = FitnessTrace::new(2, 2);
        assert!(trace.register(&individual(&[0.5, 0.9], 1)).is_none());
        assert_eq!(trace.register(&individual(&[0.7, 0.2], 1)), Some(&[0.5, 0.2][..]));
        trace.register(&individual(&[0.9, 0.9], 1));
        trace.register(&individual(&[0.4, 0.9], 1));
        assert_eq!(trace.generations(), &[vec![0.5, 0.2], vec![0.4, 0.2]]);
    }

    #[test]
    fn test_fitness_evolution_statistics() {
        let mut min = FitnessEvolutionObserver::new(Statistic::Min, 2, 1);
        let mut avg = FitnessEvolutionObserver::new(Statistic::Avg, 2, 1);
        let mut max = FitnessEvolutionObserver::new(Statistic::Max, 2, 1);
        for value in [0.2, 0.6, 0.5, 0.1] {
            let ind = individual(&[value], 1);
            min.register(&ind);
            avg.register(&ind);
            max.register(&ind);
        }
        assert_eq!(min.generations(), &[vec![0.2, 0.1]]);
        assert_eq!(max.generations(), &[vec![0.6, 0.5]]);
        assert!((avg.generations()[0][0] - 0.4).abs() < 1e-12);
        assert!((avg.generations()[0][1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_bicluster_count_percentages() {
        let mut observer = BiclusterCountObserver::new(4);
        for count in [1, 1, 2, 3, 2, 2, 2, 2] {
            observer.register(&individual(&[0.0], count));
        }
        let percentages = observer.percentages();
        assert_eq!(percentages[&1], vec![50.0, 0.0]);
        assert_eq!(percentages[&2], vec![25.0, 100.0]);
        assert_eq!(percentages[&3], vec![25.0, 0.0]);

        let mut out = Vec::new();
        observer.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next(), Some("1, 50.00, 0.00"));
    }

    #[test]
    fn test_num_evaluations_and_external_cache() {
        let cache: Arc<dyn CacheStore<Vec<f64>>> = Arc::new(LocalCache::new());
        let mut evaluations = NumEvaluationsObserver::new(3);
        let mut external = ExternalCacheObserver::new(3, Arc::clone(&cache));

        for i in 0..6 {
            if i % 2 == 0 {
                cache.insert(format!("k{}", i), vec![0.0]);
            }
            let ind = individual(&[0.0], 1);
            evaluations.register(&ind);
            external.register(&ind);
        }
        assert_eq!(evaluations.evaluations(), &[3, 6]);
        assert_eq!(external.hits(), &[1, 3]);

        let mut out = Vec::new();
        evaluations.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3, 6\n");
    }
}
