//! # Grouped-based crossover
//!
//! Crosses the row permutation and the boundary bits of two generic genomes
//! together. For each offspring a window of whole biclusters is picked in its
//! own parent; every bicluster in that window is merged with the bicluster of
//! the other parent's window that shares the most rows with it, and the
//! merged groups are written back in place of the window with fresh
//! boundaries.
//!
//! The window starts at `dynamicstartamount` of the parent's biclusters and
//! grows linearly with the number of crossovers performed, reaching the whole
//! chromosome after the expected number of operations. Merged rows are
//! shuffled until `shuffleend` of those operations have been performed.
//!
//! Each merged group is closed by a boundary bit and may be split further:
//! with the growth factor `g` of the group (high when the group is small
//! relative to what it received and large relative to its siblings) it is
//! cut in three with probability `g²`, otherwise in two with probability `g`.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use crate::error::{MoebaError, Result};
use crate::genome::{next_set_bit, previous_set_bit};
use crate::options::ComponentSpec;
use crate::rng::{shuffle, RandomSource};

pub const DEFAULT_SHUFFLE_END: f64 = 0.75;
pub const DEFAULT_DYNAMIC_START_AMOUNT: f64 = 0.25;

#[derive(Debug)]
pub struct GroupedBasedCrossover {
    num_approx_operations: usize,
    shuffle_end: f64,
    dynamic_start_amount: f64,
    num_operations: AtomicUsize,
}

/// Biclusters of one parent inside the crossed window.
#[derive(Debug)]
struct Window {
    start: usize,
    end: usize,
    /// Window values of the parent permutation, copied before any write.
    values: Vec<usize>,
    /// Inclusive end position of each bicluster.
    cuts: Vec<usize>,
    /// Bicluster of each row, `None` outside the window.
    group_of: Vec<Option<usize>>,
    min_size: usize,
    max_size: usize,
}

impl Window {
    fn new(permutation: &[usize], boundaries: &[bool], start: usize, end: usize) -> Self {
        let mut cuts = Vec::new();
        let mut group_of = vec![None; permutation.len()];
        let mut min_size = usize::MAX;
        let mut max_size = 0;
        let mut group_start = start;

        for i in start..=end {
            group_of[permutation[i]] = Some(cuts.len());
            if boundaries[i] || i == end {
                let size = i + 1 - group_start;
                min_size = min_size.min(size);
                max_size = max_size.max(size);
                cuts.push(i);
                group_start = i + 1;
            }
        }

        Self {
            start,
            end,
            values: permutation[start..=end].to_vec(),
            cuts,
            group_of,
            min_size,
            max_size,
        }
    }

    fn full(permutation: &[usize], boundaries: &[bool]) -> Self {
        Self::new(permutation, boundaries, 0, permutation.len() - 1)
    }

    /// Values of bicluster `group`.
    fn group(&self, group: usize) -> &[usize] {
        let from = if group == 0 {
            self.start
        } else {
            self.cuts[group - 1] + 1
        };
        &self.values[from - self.start..=self.cuts[group] - self.start]
    }

    /// For each own bicluster, the other window's bicluster sharing most
    /// rows with it (the last one on ties).
    fn best_matches(&self, other: &Window) -> Vec<usize> {
        let mut matches = vec![vec![0usize; other.cuts.len()]; self.cuts.len()];
        for (own, theirs) in self.group_of.iter().zip(&other.group_of) {
            if let (Some(a), Some(b)) = (own, theirs) {
                matches[*a][*b] += 1;
            }
        }
        matches
            .iter()
            .map(|shared| {
                let mut best = 0;
                let mut max = 0;
                for (j, &count) in shared.iter().enumerate() {
                    if count >= max {
                        max = count;
                        best = j;
                    }
                }
                best
            })
            .collect()
    }
}

impl GroupedBasedCrossover {
    pub fn new(num_approx_operations: usize, shuffle_end: f64, dynamic_start_amount: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&dynamic_start_amount) {
            return Err(MoebaError::Configuration(format!(
                "dynamicstartamount must lie in [0, 1], got {}",
                dynamic_start_amount
            )));
        }
        if !shuffle_end.is_finite() {
            return Err(MoebaError::Configuration(format!(
                "shuffleend must be finite, got {}",
                shuffle_end
            )));
        }
        Ok(Self {
            num_approx_operations: num_approx_operations.max(1),
            shuffle_end,
            dynamic_start_amount,
            num_operations: AtomicUsize::new(0),
        })
    }

    /// Builds the operator from `groupedbasedcrossover(shuffleend=..,dynamicstartamount=..)`.
    pub fn from_spec(spec: &ComponentSpec, num_approx_operations: usize) -> Result<Self> {
        for key in spec.unknown_keys(&["shuffleend", "dynamicstartamount"]) {
            tracing::warn!(operator = %spec.name, key, "ignoring unknown parameter");
        }
        Self::new(
            num_approx_operations,
            spec.f64_or("shuffleend", DEFAULT_SHUFFLE_END)?,
            spec.f64_or("dynamicstartamount", DEFAULT_DYNAMIC_START_AMOUNT)?,
        )
    }

    /// Number of crossovers performed so far.
    pub fn num_operations(&self) -> usize {
        self.num_operations.load(Ordering::Relaxed)
    }

    /// Crosses two offspring in place. On entry they are copies of the
    /// parents; both permutations stay permutations of the same values.
    pub fn cross(
        &self,
        permutation1: &mut [usize],
        permutation2: &mut [usize],
        boundaries1: &mut [bool],
        boundaries2: &mut [bool],
        rng: &mut dyn RandomSource,
    ) {
        let n = permutation1.len();
        if n == 0 {
            return;
        }
        let done = self.num_operations.fetch_add(1, Ordering::Relaxed) as f64
            / self.num_approx_operations as f64;
        let amount = (1.0 - self.dynamic_start_amount) * done + self.dynamic_start_amount;

        let (window1, window2) = if amount >= 1.0 || n < 3 {
            (
                Window::full(permutation1, boundaries1),
                Window::full(permutation2, boundaries2),
            )
        } else {
            let seed1 = rng.next_index(n - 2) + 1;
            let seed2 = rng.next_index(n - 2) + 1;
            let (start1, end1) = limits(boundaries1, seed1, num_biclusters(boundaries1, amount));
            let (start2, end2) = limits(boundaries2, seed2, num_biclusters(boundaries2, amount));
            (
                Window::new(permutation1, boundaries1, start1, end1),
                Window::new(permutation2, boundaries2, start2, end2),
            )
        };
        trace!(
            done,
            amount,
            window1 = ?(window1.start, window1.end),
            window2 = ?(window2.start, window2.end),
            "grouped crossover windows"
        );

        let best1 = window1.best_matches(&window2);
        let best2 = window2.best_matches(&window1);
        self.rebuild(permutation1, boundaries1, &window1, &window2, &best1, done, rng);
        self.rebuild(permutation2, boundaries2, &window2, &window1, &best2, done, rng);
    }

    #[allow(clippy::too_many_arguments)]
    fn rebuild(
        &self,
        permutation: &mut [usize],
        boundaries: &mut [bool],
        own: &Window,
        other: &Window,
        best: &[usize],
        done: f64,
        rng: &mut dyn RandomSource,
    ) {
        let n = permutation.len();
        let mut placed = vec![false; n];
        for i in (0..own.start).chain(own.end + 1..n) {
            placed[permutation[i]] = true;
        }
        boundaries[own.start..=own.end].fill(false);

        let spread = own.max_size.saturating_sub(own.min_size).max(1) as f64;
        let mut written = own.start;
        let mut rows = Vec::new();
        for (group, &matched) in best.iter().enumerate() {
            for &row in own.group(group).iter().chain(other.group(matched)) {
                if !placed[row] {
                    placed[row] = true;
                    rows.push(row);
                }
            }
            if rows.is_empty() {
                continue;
            }

            if done < self.shuffle_end {
                shuffle(&mut rows, rng);
            }
            let num = rows.len();
            permutation[written..written + num].copy_from_slice(&rows);

            let initial = own.group(group).len();
            let growth = (1.0 - initial as f64 / num as f64
                + initial.saturating_sub(own.min_size) as f64 / spread)
                / 2.0;
            let r = rng.next_f64();
            boundaries[written + num - 1] = true;
            let splits = if r < growth * growth {
                vec![num / 3, 2 * num / 3]
            } else if r < growth {
                vec![num / 2]
            } else {
                Vec::new()
            };
            for &offset in splits.iter().filter(|&&offset| offset >= 1) {
                boundaries[written + offset - 1] = true;
            }

            written += num;
            rows.clear();
        }
        debug_assert_eq!(written, own.end + 1);
    }
}

/// Number of biclusters the window should cover.
fn num_biclusters(boundaries: &[bool], amount: f64) -> usize {
    let n = boundaries.len();
    let closed = boundaries.iter().filter(|b| **b).count() + usize::from(!boundaries[n - 1]);
    ((closed as f64 * amount) as usize).max(1)
}

/// Expands around `seed` one bicluster at a time, alternating between the
/// front and the back, until `num_biclusters` are covered. Returns the
/// inclusive position range of the window.
fn limits(boundaries: &[bool], seed: usize, num_biclusters: usize) -> (usize, usize) {
    let n = boundaries.len();
    // lo is the boundary just before the window; it only reaches 0 without
    // a set bit there when the window runs to the first position
    let mut lo = seed;
    let mut hi = seed;
    let mut covered: isize = if boundaries[seed] { 0 } else { -1 };

    while covered < num_biclusters as isize {
        let previous = lo.checked_sub(1).and_then(|from| previous_set_bit(boundaries, from));
        let next = next_set_bit(boundaries, hi + 1);
        if covered % 2 == 0 {
            if let Some(p) = previous {
                lo = p;
            } else if lo == seed {
                lo = 0;
            } else if let Some(x) = next {
                hi = x;
            } else if hi == seed {
                hi = n - 1;
            }
        } else if let Some(x) = next {
            hi = x;
        } else if hi == seed {
            hi = n - 1;
        } else if let Some(p) = previous {
            lo = p;
        } else if lo == seed {
            lo = 0;
        }
        covered += 1;
    }

    let start = if lo == 0 && !boundaries[0] { 0 } else { lo + 1 };
    (start, hi)
}
