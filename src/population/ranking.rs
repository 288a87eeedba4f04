//! Fast non-dominated sorting and crowding distance (NSGA-II).

use std::cmp::Ordering;

use super::Individual;

/// `a` dominates `b` when it is no worse on every objective and strictly
/// better on at least one. Objective vectors of different length never
/// dominate each other.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Sorts `individuals` into Pareto fronts, storing each front index in
/// `rank`. Returns the fronts as index lists, best first.
pub fn fast_non_dominated_sort(individuals: &mut [Individual]) -> Vec<Vec<usize>> {
    let n = individuals.len();
    let mut domination_count = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut current = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&individuals[i].objectives, &individuals[j].objectives) {
                dominated[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&individuals[j].objectives, &individuals[i].objectives) {
                dominated[j].push(i);
                domination_count[i] += 1;
            }
        }
    }
    for (i, &count) in domination_count.iter().enumerate() {
        if count == 0 {
            current.push(i);
        }
    }

    let mut fronts = Vec::new();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            individuals[i].rank = fronts.len();
            for &j in &dominated[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Crowding distance inside one front. Boundary members get infinity.
pub fn assign_crowding_distance(individuals: &mut [Individual], front: &[usize]) {
    if front.len() <= 2 {
        for &i in front {
            individuals[i].crowding = f64::INFINITY;
        }
        return;
    }
    for &i in front {
        individuals[i].crowding = 0.0;
    }

    let num_objectives = individuals[front[0]].objectives.len();
    let last = front.len() - 1;
    for m in 0..num_objectives {
        let mut sorted = front.to_vec();
        sorted.sort_by(|&a, &b| {
            individuals[a].objectives[m]
                .partial_cmp(&individuals[b].objectives[m])
                .unwrap_or(Ordering::Equal)
        });

        individuals[sorted[0]].crowding = f64::INFINITY;
        individuals[sorted[last]].crowding = f64::INFINITY;

        let range = individuals[sorted[last]].objectives[m] - individuals[sorted[0]].objectives[m];
        if range.abs() < 1e-12 {
            continue;
        }
        for k in 1..last {
            let gap = individuals[sorted[k + 1]].objectives[m] - individuals[sorted[k - 1]].objectives[m];
            individuals[sorted[k]].crowding += gap / range;
        }
    }
}

/// Ranks `individuals` and computes crowding for every front.
pub fn rank_and_crowd(individuals: &mut [Individual]) -> Vec<Vec<usize>> {
    let fronts = fast_non_dominated_sort(individuals);
    for front in &fronts {
        assign_crowding_distance(individuals, front);
    }
    fronts
}
