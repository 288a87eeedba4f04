//! Row permutation crossovers. Each one returns two offspring that are
//! permutations of the same values as the parents.

use std::collections::{BTreeMap, BTreeSet};

use super::PermutationCrossover;
use crate::rng::RandomSource;

/// Cycle crossover (CX).
///
/// Cycles are traced in order of their smallest start position. Every
/// position keeps the value of exactly one parent; the exchange alternates
/// from cycle to cycle, the last traced cycle always being exchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleCrossover;

impl PermutationCrossover for CycleCrossover {
    fn cross(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        _rng: &mut dyn RandomSource,
    ) -> (Vec<usize>, Vec<usize>) {
        let n = parent1.len();
        let mut position = vec![0; n];
        for (i, &value) in parent1.iter().enumerate() {
            position[value] = i;
        }

        let mut cycle_of: Vec<Option<usize>> = vec![None; n];
        let mut num_cycles = 0;
        for start in 0..n {
            if cycle_of[start].is_some() {
                continue;
            }
            let mut index = start;
            loop {
                cycle_of[index] = Some(num_cycles);
                index = position[parent2[index]];
                if index == start {
                    break;
                }
            }
            num_cycles += 1;
        }

        let mut offspring1 = parent1.to_vec();
        let mut offspring2 = parent2.to_vec();
        for (i, cycle) in cycle_of.into_iter().enumerate() {
            let cycle = cycle.unwrap_or(0);
            if (num_cycles - cycle) % 2 == 1 {
                std::mem::swap(&mut offspring1[i], &mut offspring2[i]);
            }
        }
        (offspring1, offspring2)
    }
}

/// Edge recombination crossover (ERX).
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeRecombinationCrossover;

impl EdgeRecombinationCrossover {
    fn offspring(
        primary: &[usize],
        secondary: &[usize],
        rng: &mut dyn RandomSource,
    ) -> Vec<usize> {
        let n = primary.len();
        let mut edges: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for parent in [primary, secondary] {
            for i in 0..n {
                let neighbours = edges.entry(parent[i]).or_default();
                neighbours.insert(parent[(i + n - 1) % n]);
                neighbours.insert(parent[(i + 1) % n]);
            }
        }
        for (value, neighbours) in edges.iter_mut() {
            neighbours.remove(value);
        }

        let mut offspring = Vec::with_capacity(n);
        let mut current = random_key(&edges, rng);
        while let Some(value) = current {
            offspring.push(value);
            let neighbours = edges.remove(&value).unwrap_or_default();
            for remaining in edges.values_mut() {
                remaining.remove(&value);
            }

            current = if neighbours.is_empty() {
                random_key(&edges, rng)
            } else {
                fewest_edges(&neighbours, &edges, rng)
            };
        }
        offspring
    }
}

fn random_key(
    edges: &BTreeMap<usize, BTreeSet<usize>>,
    rng: &mut dyn RandomSource,
) -> Option<usize> {
    if edges.is_empty() {
        return None;
    }
    edges.keys().nth(rng.next_index(edges.len())).copied()
}

/// Neighbour with the fewest remaining edges; ties are drawn at random.
fn fewest_edges(
    neighbours: &BTreeSet<usize>,
    edges: &BTreeMap<usize, BTreeSet<usize>>,
    rng: &mut dyn RandomSource,
) -> Option<usize> {
    let degree = |v: &usize| edges.get(v).map_or(0, BTreeSet::len);
    let min = neighbours.iter().map(degree).min()?;
    let ties: Vec<usize> = neighbours
        .iter()
        .copied()
        .filter(|v| degree(v) == min)
        .collect();
    match ties.len() {
        1 => Some(ties[0]),
        len => Some(ties[rng.next_index(len)]),
    }
}

impl PermutationCrossover for EdgeRecombinationCrossover {
    fn cross(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        rng: &mut dyn RandomSource,
    ) -> (Vec<usize>, Vec<usize>) {
        if parent1.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let offspring1 = Self::offspring(parent1, parent2, rng);
        let offspring2 = Self::offspring(parent2, parent1, rng);
        (offspring1, offspring2)
    }
}

/// Partially mapped crossover (PMX).
#[derive(Debug, Clone, Copy, Default)]
pub struct PartiallyMappedCrossover;

impl PermutationCrossover for PartiallyMappedCrossover {
    fn cross(
        &self,
        parent1: &[usize],
        parent2: &[usize],
        rng: &mut dyn RandomSource,
    ) -> (Vec<usize>, Vec<usize>) {
        let n = parent1.len();
        let mut offspring1 = parent1.to_vec();
        let mut offspring2 = parent2.to_vec();
        if n < 2 {
            return (offspring1, offspring2);
        }

        let mut cut1 = rng.next_index(n);
        let mut cut2 = rng.next_index(n - 1);
        if cut1 == cut2 {
            cut2 = n - 1;
        } else if cut1 > cut2 {
            std::mem::swap(&mut cut1, &mut cut2);
        }

        let mut replacement1: Vec<Option<usize>> = vec![None; n];
        let mut replacement2: Vec<Option<usize>> = vec![None; n];
        for i in cut1..=cut2 {
            let (v1, v2) = (parent1[i], parent2[i]);
            offspring1[i] = v2;
            offspring2[i] = v1;
            if v1 != v2 {
                replacement1[v2] = Some(v1);
                replacement2[v1] = Some(v2);
            }
        }

        for i in (0..cut1).chain(cut2 + 1..n) {
            offspring1[i] = follow(&replacement1, offspring1[i]);
            offspring2[i] = follow(&replacement2, offspring2[i]);
        }
        (offspring1, offspring2)
    }
}

fn follow(replacement: &[Option<usize>], mut value: usize) -> usize {
    while let Some(next) = replacement[value] {
        value = next;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::is_permutation;
    use crate::rng::{RandomNumberGenerator, ScriptedRng};

    #[test]
    fn test_cycle_crossover_fixture() {
        let parent1: Vec<usize> = (0..9).collect();
        let parent2 = vec![8, 2, 6, 7, 1, 5, 4, 0, 3];
        let mut rng = ScriptedRng::new(&[], &[]);

        let (o1, o2) = CycleCrossover.cross(&parent1, &parent2, &mut rng);

        assert_eq!(o1, vec![8, 1, 2, 7, 4, 5, 6, 0, 3]);
        assert_eq!(o2, vec![0, 2, 6, 3, 1, 5, 4, 7, 8]);
    }

    #[test]
    fn test_cycle_crossover_keeps_positions() {
        let mut rng = RandomNumberGenerator::from_seed(17);
        for _ in 0..20 {
            let mut parent1: Vec<usize> = (0..12).collect();
            let mut parent2: Vec<usize> = (0..12).collect();
            crate::rng::shuffle(&mut parent1, &mut rng);
            crate::rng::shuffle(&mut parent2, &mut rng);

            let (o1, o2) = CycleCrossover.cross(&parent1, &parent2, &mut rng);
            assert!(is_permutation(&o1));
            assert!(is_permutation(&o2));
            for i in 0..12 {
                let mut taken = [o1[i], o2[i]];
                let mut given = [parent1[i], parent2[i]];
                taken.sort_unstable();
                given.sort_unstable();
                assert_eq!(taken, given);
            }
        }
    }

    #[test]
    fn test_pmx_fixture() {
        let parent1 = vec![8, 4, 7, 3, 6, 2, 5, 1, 9, 0];
        let parent2: Vec<usize> = (0..10).collect();
        let mut rng = ScriptedRng::new(&[], &[6, 3]);

        let (o1, o2) = PartiallyMappedCrossover.cross(&parent1, &parent2, &mut rng);

        assert_eq!(o1, vec![8, 2, 7, 3, 4, 5, 6, 1, 9, 0]);
        assert_eq!(o2, vec![0, 1, 4, 3, 6, 2, 5, 7, 8, 9]);
    }

    #[test]
    fn test_pmx_equal_cuts_extend_to_end() {
        let parent1 = vec![0, 1, 2, 3];
        let parent2 = vec![3, 2, 1, 0];
        let mut rng = ScriptedRng::new(&[], &[1, 1]);

        let (o1, o2) = PartiallyMappedCrossover.cross(&parent1, &parent2, &mut rng);
        assert_eq!(&o1[1..], &[2, 1, 0]);
        assert_eq!(&o2[1..], &[1, 2, 3]);
        assert!(is_permutation(&o1));
        assert!(is_permutation(&o2));
    }

    #[test]
    fn test_edge_recombination_produces_permutations() {
        let mut rng = RandomNumberGenerator::from_seed(99);
        for _ in 0..20 {
            let mut parent1: Vec<usize> = (0..15).collect();
            let mut parent2: Vec<usize> = (0..15).collect();
            crate::rng::shuffle(&mut parent1, &mut rng);
            crate::rng::shuffle(&mut parent2, &mut rng);

            let (o1, o2) = EdgeRecombinationCrossover.cross(&parent1, &parent2, &mut rng);
            assert!(is_permutation(&o1));
            assert!(is_permutation(&o2));
        }
    }

    #[test]
    fn test_edge_recombination_of_identical_parents_follows_them() {
        let parent = vec![0, 1, 2, 3, 4];
        // start at key 2; each step then has one neighbour with fewer edges
        let mut rng = ScriptedRng::new(&[], &[2, 0, 0, 0, 0, 0, 0, 0]);
        let (o1, _) = EdgeRecombinationCrossover.cross(&parent, &parent, &mut rng);
        assert!(is_permutation(&o1));
        assert_eq!(o1[0], 2);
        for pair in o1.windows(2) {
            let distance = (pair[0] + 5 - pair[1]) % 5;
            assert!(distance == 1 || distance == 4, "{:?} breaks an edge", o1);
        }
    }
}
