use moeba::{
    bicluster::{format_translated, parse_biclusters, Bicluster},
    codec::{merge_same_columns, Codec, GenericCodec, IndividualCodec, SpecificCodec},
    genome::Genome,
    rng::RandomNumberGenerator,
};

// 8x8 reference genome: permutation, boundary bits, then one vote vector per column
const PERMUTATION: [usize; 8] = [5, 0, 3, 1, 2, 7, 6, 4];

#[rustfmt::skip]
const BITS: [[u8; 8]; 9] = [
    [1, 0, 1, 0, 0, 1, 0, 0],
    [0, 1, 1, 0, 0, 1, 0, 1],
    [1, 0, 0, 1, 0, 1, 0, 0],
    [1, 0, 0, 1, 1, 0, 1, 0],
    [0, 1, 1, 0, 0, 0, 0, 1],
    [0, 1, 1, 0, 0, 0, 0, 1],
    [0, 0, 0, 0, 1, 0, 1, 0],
    [0, 0, 0, 0, 1, 1, 1, 0],
    [1, 0, 0, 1, 1, 0, 1, 0],
];

fn fixture() -> Genome {
    let bits = BITS
        .iter()
        .map(|row| row.iter().map(|&b| b == 1).collect())
        .collect();
    Genome::new(PERMUTATION.to_vec(), bits)
}

fn assert_partition(biclusters: &[Bicluster], num_rows: usize) {
    let mut rows: Vec<usize> = biclusters.iter().flat_map(|b| b.rows.clone()).collect();
    rows.sort_unstable();
    assert_eq!(rows, (0..num_rows).collect::<Vec<_>>());
}

#[test]
fn test_generic_fixture() {
    let codec = GenericCodec::new(8, 8, 0.1, 0.2).unwrap();
    let biclusters = codec.decode(&fixture());

    assert_eq!(biclusters.len(), 4);
    assert_eq!(biclusters[0], Bicluster::new(vec![0, 3], vec![1, 2, 7]));
    let min_rows: Vec<_> = biclusters.iter().map(|b| b.min_row().unwrap()).collect();
    assert_eq!(min_rows, vec![0, 1, 4, 5]);
    assert_partition(&biclusters, 8);
}

#[test]
fn test_merge_collapses_identical_columns() {
    let mut genome = fixture();
    // rows 0 and 3 now vote like row 5
    genome.bits[1] = vec![true, true, true, true, false, true, false, true];
    genome.bits[3] = vec![false, false, false, false, true, false, true, false];
    genome.bits[7] = vec![true, false, false, true, true, true, true, false];
    genome.bits[8] = vec![false, false, false, false, true, false, true, false];

    let codec = GenericCodec::new(8, 8, 0.1, 0.2).unwrap();
    let decoded = codec.decode(&genome);
    assert_eq!(decoded.len(), 4);

    let merged = merge_same_columns(decoded);
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0], Bicluster::new(vec![0, 3, 5], vec![0, 1, 6]));
    assert_partition(&merged, 8);
}

#[test]
fn test_random_generic_genomes_partition_rows() {
    let codec = GenericCodec::new(25, 6, 0.1, 0.4).unwrap();
    let mut rng = RandomNumberGenerator::from_seed(2024);
    for _ in 0..50 {
        let genome = codec.random_genome(&mut rng);
        let biclusters = codec.decode(&genome);
        assert_partition(&biclusters, 25);
        for pair in biclusters.windows(2) {
            assert!(pair[0].min_row() < pair[1].min_row());
        }
    }
}

#[test]
fn test_specific_codec() {
    assert!(SpecificCodec::new(5, 3, 1).is_err());
    assert!(SpecificCodec::new(5, 3, 5).is_err());

    let codec = SpecificCodec::new(6, 3, 3).unwrap();
    let genome = Genome::new(
        vec![2, 0, 2, 0, 0, 2],
        vec![
            vec![true, false, true],
            vec![true, true, true],
            vec![false, true, false],
        ],
    );
    let biclusters = codec.decode(&genome);

    // cluster 1 owns no rows and disappears
    assert_eq!(
        biclusters,
        vec![
            Bicluster::new(vec![0, 2, 5], vec![1]),
            Bicluster::new(vec![1, 3, 4], vec![0, 2]),
        ]
    );

    let mut rng = RandomNumberGenerator::from_seed(5);
    for _ in 0..20 {
        assert_partition(&codec.decode(&codec.random_genome(&mut rng)), 6);
    }
}

#[test]
fn test_individual_codec_single_bicluster() {
    let codec = IndividualCodec::new(3, 2).unwrap();
    let genome = Genome::new(Vec::new(), vec![vec![true, false, true, false, true]]);
    assert_eq!(
        codec.decode(&genome),
        vec![Bicluster::new(vec![0, 2], vec![1])]
    );
}

#[test]
fn test_translated_text_form() {
    let codec = GenericCodec::new(8, 8, 0.1, 0.2).unwrap();
    let biclusters = codec.decode(&fixture());
    let text = format_translated(&biclusters);

    assert!(text.starts_with("Bicluster0: (rows: [0 3] cols: [1 2 7])"));
    assert_eq!(parse_biclusters(&text).unwrap(), biclusters);
}
