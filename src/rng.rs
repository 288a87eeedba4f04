//! # Random sources
//!
//! Every genetic operator draws its randomness from an explicitly passed
//! [`RandomSource`]. The engine owns a single [`RandomNumberGenerator`] on the
//! master thread, so a seeded run is reproducible up to the completion order of
//! the workers.
//!
//! ## Example
//!
//! ```rust
//! use moeba::rng::{RandomNumberGenerator, RandomSource};
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let u = rng.next_f64();
//! assert!((0.0..1.0).contains(&u));
//! assert!(rng.next_index(10) < 10);
//! ```

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Object-safe source of uniform random values.
///
/// Operators take `&mut dyn RandomSource` so tests can script the exact
/// sequence of draws.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `[0, bound)`. `bound` must be positive.
    fn next_index(&mut self, bound: usize) -> usize;

    /// Fair coin.
    fn next_bool(&mut self) -> bool {
        self.next_f64() < 0.5
    }
}

/// Shuffles `values` in place (Fisher-Yates).
pub fn shuffle<T>(values: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..values.len()).rev() {
        let j = rng.next_index(i + 1);
        values.swap(i, j);
    }
}

/// A wrapper around the `rand` crate's `StdRng`.
#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible tests and benchmarks.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds a generator from an optional seed, falling back to entropy.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::from_seed)
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for RandomNumberGenerator {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    fn next_bool(&mut self) -> bool {
        self.rng.gen::<bool>()
    }
}

/// Replays fixed sequences of draws. Once a queue is exhausted the
/// corresponding fallback value is returned.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedRng {
    floats: std::collections::VecDeque<f64>,
    indices: std::collections::VecDeque<usize>,
    bools: std::collections::VecDeque<bool>,
    fallback_float: f64,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(floats: &[f64], indices: &[usize]) -> Self {
        Self {
            floats: floats.iter().copied().collect(),
            indices: indices.iter().copied().collect(),
            bools: Default::default(),
            fallback_float: 0.99,
        }
    }

    pub(crate) fn with_fallback(mut self, value: f64) -> Self {
        self.fallback_float = value;
        self
    }

    pub(crate) fn with_bools(mut self, bools: &[bool]) -> Self {
        self.bools = bools.iter().copied().collect();
        self
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        self.floats.pop_front().unwrap_or(self.fallback_float)
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.indices.pop_front().unwrap_or(0) % bound
    }

    fn next_bool(&mut self) -> bool {
        self.bools.pop_front().unwrap_or(false)
    }
}
