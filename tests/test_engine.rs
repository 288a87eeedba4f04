use std::collections::HashMap;

use moeba::{
    caching::CacheBacking,
    codec::RepresentationKind,
    data::{column_types_from_map, ColumnType, DataMatrix},
    population::dominates,
    AsyncEngine, EngineOptions, LogLevel, MoebaError,
};

// Two planted blocks on a noisy background
fn planted_matrix() -> DataMatrix {
    let values = (0..16)
        .map(|r| {
            (0..8)
                .map(|c| match (r < 8, c < 4) {
                    (true, true) => 1.0,
                    (false, false) => 0.0,
                    _ => ((r * 13 + c * 7) % 10) as f64 / 10.0,
                })
                .collect()
        })
        .collect();
    DataMatrix::numeric(values).unwrap()
}

fn base_options() -> moeba::options::EngineOptionsBuilder {
    EngineOptions::builder()
        .population_size(10)
        .max_evaluations(120)
        .num_threads(4)
        .seed(7)
}

#[test]
fn test_generic_run() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let options = base_options()
        .fitness_functions("BiclusterSizeNormComp;MeanSquaredResidueNorm;DistanceBetweenBiclustersNormComp")
        .log_level(LogLevel::Verbose)
        .build()
        .unwrap();
    let result = AsyncEngine::new(planted_matrix(), options).unwrap().run().unwrap();

    assert_eq!(result.population.len(), 10);
    assert_eq!(result.evaluations, 120 + 10 - 1);
    assert_eq!(result.trace.len(), result.evaluations / 10);
    assert!(!result.solutions.is_empty());

    for individual in &result.population {
        assert_eq!(individual.objectives.len(), 3);
        assert!(individual.objectives.iter().all(|v| v.is_finite()));
        assert!(individual.genome.is_permutation());
        let rows: usize = individual.biclusters.iter().map(|b| b.rows.len()).sum();
        assert!(rows <= 16);
    }
    for a in &result.solutions {
        for b in &result.solutions {
            assert!(!dominates(&a.objectives, &b.objectives));
        }
    }
}

#[test]
fn test_permutation_crossover_pipeline() {
    let options = base_options()
        .crossover_operator("EdgeRecombinationCrossover;BicUniformCrossover;CellUniformCrossover")
        .mutation_probability("0.4-0.01")
        .fitness_functions("BiclusterSizeCoverNormComp(rowsWeight=0.7);RowVarianceNormComp")
        .build()
        .unwrap();
    let result = AsyncEngine::new(planted_matrix(), options).unwrap().run().unwrap();
    assert_eq!(result.population.len(), 10);
}

#[test]
fn test_specific_run_with_caches_and_observers() {
    let options = base_options()
        .representation(RepresentationKind::Specific)
        .specific_num_biclusters(3)
        .crossover_operator("AssignmentUniformCrossover;CellUniformCrossover")
        .mutation_operator("AssignmentRandomMutation;CellUniformMutation")
        .fitness_functions("BiclusterSizeNumBicsNormComp;BiclusterVarianceNorm")
        .external_cache(CacheBacking::Bounded(64))
        .internal_cache(CacheBacking::PerWorker)
        .observers("ExternalCacheObserver;InternalCacheObserver;FitnessEvolutionAvgObserver;NumEvaluationsObserver")
        .build()
        .unwrap();
    let engine = AsyncEngine::new(planted_matrix(), options).unwrap();
    let result = engine.run().unwrap();

    assert_eq!(result.population.len(), 10);
    for individual in &result.population {
        assert!(individual.num_biclusters() <= 3);
        assert!(individual.genome.integers.iter().all(|&k| k < 3));
    }

    let mut report = Vec::new();
    result.write_observers(&mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    for name in [
        "# externalcacheobserver",
        "# internalcacheobserver",
        "# fitnessevolutionavgobserver",
        "# numevaluationsobserver",
    ] {
        assert!(report.contains(name), "missing {} in\n{}", name, report);
    }
    assert!(engine.evaluator().external_cache().unwrap().len() <= 64);
}

#[test]
fn test_individual_representation_run() {
    let options = base_options()
        .representation(RepresentationKind::Individual)
        .crossover_operator("RowColUniformCrossover")
        .mutation_operator("RowColUniformMutation")
        .fitness_functions("BiclusterSizeWeightedNormComp(rowsWeight=0.3);MeanSquaredResidueNorm")
        .observers("BiclusterCountObserver")
        .build()
        .unwrap();
    let result = AsyncEngine::new(planted_matrix(), options).unwrap().run().unwrap();

    for individual in &result.population {
        assert!(individual.num_biclusters() <= 1);
    }
}

#[test]
fn test_evaluations_stop_after_the_in_flight_work() {
    // (population, threads, budget, expected evaluations)
    let cases = [(10, 1, 20, 29), (4, 6, 20, 25), (10, 4, 10, 19)];
    for (population_size, num_threads, max_evaluations, expected) in cases {
        let options = base_options()
            .population_size(population_size)
            .num_threads(num_threads)
            .max_evaluations(max_evaluations)
            .build()
            .unwrap();
        let result = AsyncEngine::new(planted_matrix(), options).unwrap().run().unwrap();

        let initial = population_size.max(num_threads);
        assert_eq!(result.evaluations, expected);
        assert!(result.evaluations <= max_evaluations + initial - 1);
        assert_eq!(result.population.len(), population_size);
    }
}

#[test]
fn test_seeded_single_thread_runs_are_reproducible() {
    let run = || {
        let mut options = base_options().num_threads(1).build().unwrap();
        options.set_seed(Some(21));
        options.set_log_level(LogLevel::Minimal);
        AsyncEngine::new(planted_matrix(), options).unwrap().run().unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.population, second.population);
    assert_eq!(first.trace, second.trace);
}

#[test]
fn test_startup_configuration_errors() {
    let build = |builder: moeba::options::EngineOptionsBuilder| {
        builder
            .build()
            .and_then(|options| AsyncEngine::new(planted_matrix(), options))
    };

    assert!(matches!(
        build(base_options().fitness_functions("NoSuchObjective")),
        Err(MoebaError::Configuration(_))
    ));
    assert!(matches!(
        build(base_options().algorithm("SPEA2-AsyncParallel")),
        Err(MoebaError::Configuration(_))
    ));
    assert!(matches!(
        build(base_options().max_evaluations(5)),
        Err(MoebaError::Configuration(_))
    ));
    assert!(matches!(
        build(
            base_options()
                .representation(RepresentationKind::Specific)
                .specific_num_biclusters(16)
                .crossover_operator("AssignmentUniformCrossover;CellUniformCrossover")
                .mutation_operator("AssignmentRandomMutation;CellUniformMutation")
        ),
        Err(MoebaError::Configuration(_))
    ));
    assert!(matches!(
        build(
            base_options()
                .representation(RepresentationKind::Specific)
                .crossover_operator("AssignmentUniformCrossover;CellUniformCrossover")
                .mutation_operator("AssignmentRandomMutation;CellUniformMutation")
                .observers("BiclusterCountObserver")
        ),
        Err(MoebaError::Configuration(_))
    ));
    // the coherence objective needs an affinity matrix
    assert!(matches!(
        build(base_options().fitness_functions("RegulatoryCoherenceNormComp")),
        Err(MoebaError::Configuration(_))
    ));
}

#[test]
fn test_typed_input_matrix() {
    let cells: Vec<Vec<String>> = (0..8)
        .map(|r| {
            vec![
                format!("{}", r % 3),
                format!("{}.5", r),
                if r % 2 == 0 { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    let names: Vec<String> = ["level", "score", "flag"].iter().map(|s| s.to_string()).collect();
    let types: HashMap<String, String> = [("flag", "boolean"), ("score", "float"), ("level", "integer")]
        .iter()
        .map(|(name, kind)| (name.to_string(), kind.to_string()))
        .collect();
    let column_types = column_types_from_map(&names, &types).unwrap();
    assert_eq!(
        column_types,
        vec![ColumnType::Integer, ColumnType::Float, ColumnType::Boolean]
    );
    let data = DataMatrix::from_strings(&cells, column_types).unwrap();

    let options = EngineOptions::builder()
        .population_size(6)
        .max_evaluations(30)
        .num_threads(2)
        .seed(3)
        .build()
        .unwrap();
    let result = AsyncEngine::new(data, options).unwrap().run().unwrap();
    assert_eq!(result.population.len(), 6);
    assert_eq!(result.evaluations, 30 + 6 - 1);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_round_trip() {
    use moeba::{bicluster::Bicluster, genome::Genome, Individual};

    let mut individual = Individual::with_objectives(
        Genome::new(vec![1, 0, 2], vec![vec![true, false, true]]),
        vec![0.25, 0.5],
    );
    individual.biclusters = vec![Bicluster::new(vec![0, 1], vec![2])];

    let json = serde_json::to_string(&individual).unwrap();
    let back: Individual = serde_json::from_str(&json).unwrap();
    assert_eq!(back, individual);

    let types = vec![ColumnType::String, ColumnType::Boolean];
    let json = serde_json::to_string(&types).unwrap();
    assert_eq!(serde_json::from_str::<Vec<ColumnType>>(&json).unwrap(), types);

    let level: LogLevel = serde_json::from_str(&serde_json::to_string(&LogLevel::Minimal).unwrap()).unwrap();
    assert_eq!(level, LogLevel::Minimal);
}
