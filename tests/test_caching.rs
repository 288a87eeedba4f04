use moeba::{
    bicluster::Bicluster,
    caching::{BoundedCache, CacheBacking, CacheStore, LocalCache, PerWorkerCache},
    codec::GenericCodec,
    data::DataMatrix,
    fitness::{BiclusterScore, Evaluator, FitnessFunction, IndividualObjective, Summarizer},
    genome::Genome,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

// A bicluster score that counts how often it is computed
#[derive(Debug, Clone)]
struct CountingSize {
    evaluations: Arc<AtomicUsize>,
}

impl CountingSize {
    fn new() -> Self {
        Self {
            evaluations: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn get_evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl BiclusterScore for CountingSize {
    fn score(&self, data: &DataMatrix, bicluster: &Bicluster) -> f64 {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        bicluster.size() as f64 / (data.num_rows() * data.num_cols()) as f64
    }
}

fn data() -> Arc<DataMatrix> {
    Arc::new(DataMatrix::numeric(vec![vec![1.0, 2.0, 3.0, 4.0]; 4]).unwrap())
}

fn objective(
    score: &CountingSize,
    cache: Option<Arc<dyn CacheStore<f64>>>,
) -> IndividualObjective {
    IndividualObjective::new(
        "countingsize",
        data(),
        Box::new(score.clone()),
        Summarizer::Mean,
        cache,
    )
}

#[test]
fn test_internal_cache_skips_recomputation() {
    let score = CountingSize::new();
    let objective = objective(&score, Some(Arc::new(LocalCache::new())));
    let biclusters = vec![
        Bicluster::new(vec![0, 1], vec![0, 1]),
        Bicluster::new(vec![2, 3], vec![2, 3]),
    ];

    let first = objective.run(&biclusters);
    assert_eq!(score.get_evaluations(), 2);

    let second = objective.run(&biclusters);
    assert_eq!(first, second);
    assert_eq!(score.get_evaluations(), 2, "cached scores must not be recomputed");

    // one shared bicluster, one new one
    objective.run(&[
        Bicluster::new(vec![0, 1], vec![0, 1]),
        Bicluster::new(vec![2], vec![0, 1, 2, 3]),
    ]);
    assert_eq!(score.get_evaluations(), 3);
    assert_eq!(objective.internal_cache().unwrap().len(), 3);
}

#[test]
fn test_uncached_objective_recomputes() {
    let score = CountingSize::new();
    let objective = objective(&score, None);
    let biclusters = vec![Bicluster::new(vec![0, 1], vec![0, 1])];

    objective.run(&biclusters);
    objective.run(&biclusters);
    assert_eq!(score.get_evaluations(), 2);
}

#[test]
fn test_external_cache_skips_whole_evaluation() {
    let score = CountingSize::new();
    let codec = Arc::new(GenericCodec::new(4, 4, 0.1, 0.2).unwrap());
    let external: Arc<dyn CacheStore<Vec<f64>>> = Arc::new(LocalCache::new());
    let evaluator = Evaluator::new(
        codec,
        vec![Box::new(objective(&score, None))],
        Some(Arc::clone(&external)),
    );

    let genome = Genome::new(
        vec![0, 1, 2, 3],
        vec![
            vec![false, true, false, true],
            vec![true; 4],
            vec![true; 4],
            vec![false; 4],
            vec![true; 4],
        ],
    );
    let first = evaluator.evaluate(&genome).unwrap();
    let second = evaluator.evaluate(&genome).unwrap();

    assert_eq!(first, second);
    assert_eq!(score.get_evaluations(), 2);
    assert_eq!(external.len(), 1);
    assert_eq!(external.num_getters(), 2);
}

#[test]
fn test_concurrent_get_or_insert_stores_one_value() {
    for backing in [CacheBacking::Local, CacheBacking::Bounded(64)] {
        let cache: Arc<dyn CacheStore<f64>> = backing.build();
        let computed = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let cache = Arc::clone(&cache);
                let computed = &computed;
                scope.spawn(move || {
                    for key in 0..16 {
                        let value = cache.get_or_insert_with(&format!("k{}", key), &mut || {
                            computed.fetch_add(1, Ordering::SeqCst);
                            (key * 10 + worker) as f64
                        });
                        // whichever worker stored first, everyone sees its value
                        assert_eq!(value, cache.get(&format!("k{}", key)).unwrap());
                    }
                });
            }
        });

        assert_eq!(cache.len(), 16);
        assert!(computed.load(Ordering::SeqCst) >= 16);
    }
}

#[test]
fn test_bounded_cache_evicts_oldest() {
    let cache = BoundedCache::new(2);
    cache.insert("a".to_string(), 1.0);
    cache.insert("b".to_string(), 2.0);
    cache.insert("c".to_string(), 3.0);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("c"), Some(3.0));
}

#[test]
fn test_per_worker_cache_is_private_to_each_thread() {
    let cache = Arc::new(PerWorkerCache::<f64>::new());
    cache.insert("shared".to_string(), 1.0);

    let seen_elsewhere = std::thread::scope(|scope| {
        let cache = Arc::clone(&cache);
        scope
            .spawn(move || cache.get("shared"))
            .join()
            .unwrap()
    });

    assert_eq!(seen_elsewhere, None);
    assert_eq!(cache.get("shared"), Some(1.0));
    assert_eq!(cache.local_len(), 1);
}
