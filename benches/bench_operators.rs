use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use moeba::{
    codec::{Codec, GenericCodec, RepresentationKind},
    operators::{build_crossover, build_mutation},
    rng::RandomNumberGenerator,
};

const CROSSOVERS: [&str; 4] = [
    "GroupedBasedCrossover;CellUniformCrossover",
    "CycleCrossover;BicUniformCrossover;CellUniformCrossover",
    "EdgeRecombinationCrossover;BicUniformCrossover;CellUniformCrossover",
    "PartiallyMappedCrossover;BicUniformCrossover;CellUniformCrossover",
];

fn bench_crossover(c: &mut Criterion) {
    let codec = GenericCodec::new(500, 40, 0.1, 0.2).unwrap();
    let mut rng = RandomNumberGenerator::from_seed(42);
    let parent1 = codec.random_genome(&mut rng);
    let parent2 = codec.random_genome(&mut rng);

    let mut group = c.benchmark_group("generic_crossover");
    for config in CROSSOVERS.iter() {
        let crossover = build_crossover(RepresentationKind::Generic, config, 1.0, 10_000).unwrap();
        let name = config.split(';').next().unwrap_or(config);
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| crossover.crossover(black_box(&parent1), black_box(&parent2), &mut rng))
        });
    }
    group.finish();
}

fn bench_mutation(c: &mut Criterion) {
    let codec = GenericCodec::new(500, 40, 0.1, 0.2).unwrap();
    let mut rng = RandomNumberGenerator::from_seed(7);
    let genome = codec.random_genome(&mut rng);

    let mut group = c.benchmark_group("generic_mutation");
    for probability in ["0.01", "0.1", "0.5-0.01"].iter() {
        let mutation = build_mutation(
            RepresentationKind::Generic,
            "SwapMutation;BicUniformMutation;CellUniformMutation",
            probability,
            10_000,
        )
        .unwrap();
        group.bench_function(BenchmarkId::from_parameter(probability), |b| {
            b.iter(|| {
                let mut genome = genome.clone();
                mutation.mutate(black_box(&mut genome), &mut rng);
                genome
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_crossover, bench_mutation);
criterion_main!(benches);
