//! External archives of non-dominated individuals.

use super::ranking::dominates;
use super::Individual;
use crate::error::{MoebaError, Result};

/// Unbounded store of mutually non-dominated individuals.
///
/// A candidate is rejected when a member dominates it or has exactly the
/// same objective values; otherwise it is stored and every member it
/// dominates is evicted.
#[derive(Debug, Clone, Default)]
pub struct NonDominatedArchive {
    members: Vec<Individual>,
}

impl NonDominatedArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `candidate` was stored.
    pub fn add(&mut self, candidate: Individual) -> bool {
        let rejected = self.members.iter().any(|member| {
            member.objectives == candidate.objectives
                || dominates(&member.objectives, &candidate.objectives)
        });
        if rejected {
            return false;
        }
        self.members
            .retain(|member| !dominates(&candidate.objectives, &member.objectives));
        self.members.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Individual] {
        &self.members
    }
}

/// A [`NonDominatedArchive`] read through a diversity-preserving truncation
/// to at most `capacity` members. The underlying store is never trimmed.
#[derive(Debug, Clone)]
pub struct BestSolutionsArchive {
    inner: NonDominatedArchive,
    capacity: usize,
}

impl BestSolutionsArchive {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MoebaError::Configuration(
                "archive capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            inner: NonDominatedArchive::new(),
            capacity,
        })
    }

    pub fn add(&mut self, candidate: Individual) -> bool {
        self.inner.add(candidate)
    }

    /// Size of the underlying store, which may exceed the capacity.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The stored members, or a diverse subset of `capacity` of them.
    pub fn solutions(&self) -> Vec<Individual> {
        let members = self.inner.members();
        if members.len() <= self.capacity {
            return members.to_vec();
        }
        distance_based_subset(members, self.capacity)
            .into_iter()
            .map(|i| members[i].clone())
            .collect()
    }
}

/// Greedy max-min distance selection on objectives normalised to `[0, 1]`,
/// seeded with the best member on the first objective.
fn distance_based_subset(members: &[Individual], size: usize) -> Vec<usize> {
    let num_objectives = members[0].objectives.len();
    let bounds: Vec<(f64, f64)> = (0..num_objectives)
        .map(|m| {
            members.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), ind| {
                (lo.min(ind.objectives[m]), hi.max(ind.objectives[m]))
            })
        })
        .collect();
    let points: Vec<Vec<f64>> = members
        .iter()
        .map(|ind| {
            ind.objectives
                .iter()
                .zip(&bounds)
                .map(|(v, (lo, hi))| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 })
                .collect()
        })
        .collect();
    let distance = |a: &[f64], b: &[f64]| -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
    };

    let seed = (1..members.len()).fold(0, |best, i| {
        if members[i].objectives[0] < members[best].objectives[0] {
            i
        } else {
            best
        }
    });
    let mut selected = vec![seed];
    let mut nearest: Vec<f64> = points.iter().map(|p| distance(p, &points[seed])).collect();
    let mut taken = vec![false; members.len()];
    taken[seed] = true;

    while selected.len() < size {
        let mut pick = None;
        for i in 0..members.len() {
            if taken[i] {
                continue;
            }
            match pick {
                Some(p) if nearest[i] <= nearest[p] => {}
                _ => pick = Some(i),
            }
        }
        let Some(pick) = pick else { break };
        taken[pick] = true;
        selected.push(pick);
        for i in 0..members.len() {
            nearest[i] = nearest[i].min(distance(&points[i], &points[pick]));
        }
    }
    selected
}

/// Members of `individuals` that no other member dominates, skipping
/// repeated objective vectors.
pub fn non_dominated(individuals: &[Individual]) -> Vec<Individual> {
    let mut archive = NonDominatedArchive::new();
    for individual in individuals {
        archive.add(individual.clone());
    }
    archive.members
}
