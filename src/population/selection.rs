use std::cmp::Ordering;

use super::Individual;
use crate::error::{MoebaError, Result};
use crate::rng::RandomSource;

/// How two tournament contestants are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Lower Pareto rank wins, then larger crowding distance.
    RankThenCrowding,
    /// Lower value of the given objective wins.
    SingleObjective(usize),
}

impl Comparator {
    /// `Less` when `a` is the better contestant.
    fn compare(&self, a: &Individual, b: &Individual) -> Ordering {
        match *self {
            Comparator::RankThenCrowding => a.rank.cmp(&b.rank).then_with(|| {
                b.crowding
                    .partial_cmp(&a.crowding)
                    .unwrap_or(Ordering::Equal)
            }),
            Comparator::SingleObjective(m) => a.objectives[m]
                .partial_cmp(&b.objectives[m])
                .unwrap_or(Ordering::Equal),
        }
    }
}

/// Tournament selection over a population.
///
/// Each tournament draws `tournament_size` contestants uniformly, with
/// replacement, and keeps the best one according to the comparator. Ties are
/// settled by a coin flip.
///
/// # Examples
///
/// ```
/// use moeba::genome::Genome;
/// use moeba::population::{Comparator, Individual, TournamentSelection};
/// use moeba::rng::RandomNumberGenerator;
///
/// let population: Vec<Individual> = [0.4, 0.1, 0.9]
///     .iter()
///     .map(|&v| Individual::with_objectives(Genome::default(), vec![v]))
///     .collect();
///
/// let selection = TournamentSelection::new(3, Comparator::SingleObjective(0)).unwrap();
/// let mut rng = RandomNumberGenerator::from_seed(3);
/// let winner = selection.select(&population, &mut rng).unwrap();
/// assert!(winner < population.len());
/// ```
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    tournament_size: usize,
    comparator: Comparator,
}

impl TournamentSelection {
    /// # Errors
    ///
    /// Returns an error if `tournament_size` is 0.
    pub fn new(tournament_size: usize, comparator: Comparator) -> Result<Self> {
        if tournament_size < 1 {
            return Err(MoebaError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            tournament_size,
            comparator,
        })
    }

    /// Binary tournament.
    pub fn binary(comparator: Comparator) -> Self {
        Self {
            tournament_size: 2,
            comparator,
        }
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    /// Runs one tournament and returns the index of the winner.
    pub fn select(&self, population: &[Individual], rng: &mut dyn RandomSource) -> Result<usize> {
        if population.is_empty() {
            return Err(MoebaError::EmptyPopulation);
        }
        let mut best = rng.next_index(population.len());
        for _ in 1..self.tournament_size {
            let contestant = rng.next_index(population.len());
            match self
                .comparator
                .compare(&population[contestant], &population[best])
            {
                Ordering::Less => best = contestant,
                Ordering::Equal if rng.next_bool() => best = contestant,
                _ => {}
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;
    use crate::rng::ScriptedRng;

    fn population() -> Vec<Individual> {
        let mut individuals: Vec<Individual> = [0.4, 0.1, 0.9, 0.1]
            .iter()
            .map(|&v| Individual::with_objectives(Genome::default(), vec![v]))
            .collect();
        individuals[0].rank = 1;
        individuals[1].rank = 0;
        individuals[1].crowding = 0.5;
        individuals[2].rank = 0;
        individuals[2].crowding = 2.0;
        individuals[3].rank = 2;
        individuals
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(TournamentSelection::new(0, Comparator::RankThenCrowding).is_err());
    }

    #[test]
    fn test_empty_population() {
        let selection = TournamentSelection::binary(Comparator::RankThenCrowding);
        let mut rng = ScriptedRng::new(&[], &[]);
        assert!(matches!(
            selection.select(&[], &mut rng),
            Err(MoebaError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_rank_then_crowding() {
        let selection = TournamentSelection::binary(Comparator::RankThenCrowding);
        let population = population();

        let mut rng = ScriptedRng::new(&[], &[0, 1]);
        assert_eq!(selection.select(&population, &mut rng).unwrap(), 1);

        let mut rng = ScriptedRng::new(&[], &[1, 2]);
        assert_eq!(selection.select(&population, &mut rng).unwrap(), 2);
    }

    #[test]
    fn test_single_objective_with_tie() {
        let selection = TournamentSelection::binary(Comparator::SingleObjective(0));
        let population = population();

        let mut rng = ScriptedRng::new(&[], &[2, 0]);
        assert_eq!(selection.select(&population, &mut rng).unwrap(), 0);

        let mut rng = ScriptedRng::new(&[], &[1, 3]).with_bools(&[true]);
        assert_eq!(selection.select(&population, &mut rng).unwrap(), 3);

        let mut rng = ScriptedRng::new(&[], &[1, 3]).with_bools(&[false]);
        assert_eq!(selection.select(&population, &mut rng).unwrap(), 1);
    }
}
