use std::cmp::Ordering;
use std::fmt::Debug;

use super::ranking::rank_and_crowd;
use super::Individual;
use crate::error::{MoebaError, Result};

/// Merges offspring into a population and keeps `size` survivors.
pub trait Replacement: Send + Sync + Debug {
    fn replace(
        &self,
        population: Vec<Individual>,
        offspring: Vec<Individual>,
        size: usize,
    ) -> Result<Vec<Individual>>;
}

fn check_size(survivors: &[Individual], size: usize) -> Result<()> {
    if survivors.len() != size {
        return Err(MoebaError::InvariantViolation(format!(
            "replacement kept {} individuals instead of {}",
            survivors.len(),
            size
        )));
    }
    Ok(())
}

/// NSGA-II replacement: admit whole fronts while they fit, then fill the
/// remaining slots from the next front by descending crowding distance, all
/// in one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingAndCrowdingReplacement;

impl Replacement for RankingAndCrowdingReplacement {
    fn replace(
        &self,
        population: Vec<Individual>,
        offspring: Vec<Individual>,
        size: usize,
    ) -> Result<Vec<Individual>> {
        let mut merged = population;
        merged.extend(offspring);
        let fronts = rank_and_crowd(&mut merged);
        if merged.len() <= size {
            return Ok(merged);
        }

        let mut keep = Vec::with_capacity(size);
        for mut front in fronts {
            let room = size - keep.len();
            if room == 0 {
                break;
            }
            if front.len() > room {
                front.sort_by(|&a, &b| {
                    merged[b]
                        .crowding
                        .partial_cmp(&merged[a].crowding)
                        .unwrap_or(Ordering::Equal)
                });
                front.truncate(room);
            }
            keep.extend(front);
        }
        keep.sort_unstable();

        let mut slots: Vec<Option<Individual>> = merged.into_iter().map(Some).collect();
        let survivors: Vec<Individual> = keep.into_iter().filter_map(|i| slots[i].take()).collect();
        check_size(&survivors, size)?;
        Ok(survivors)
    }
}

/// (μ+λ) replacement on the first objective, lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuPlusLambdaReplacement;

impl Replacement for MuPlusLambdaReplacement {
    fn replace(
        &self,
        population: Vec<Individual>,
        offspring: Vec<Individual>,
        size: usize,
    ) -> Result<Vec<Individual>> {
        let mut merged = population;
        merged.extend(offspring);
        if merged.len() <= size {
            return Ok(merged);
        }

        merged.sort_by(|a, b| a.objectives[0].total_cmp(&b.objectives[0]));
        merged.truncate(size);
        check_size(&merged, size)?;
        Ok(merged)
    }
}
