use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{MoebaError, Result};

/// Mutation probability, fixed or decreasing linearly from `max` to `min`
/// over `num_approx_operations` calls.
#[derive(Debug)]
pub struct MutationSchedule {
    max: f64,
    min: f64,
    num_approx_operations: usize,
    num_operations: AtomicUsize,
    // f64 bits of the latest probability
    current: AtomicU64,
}

impl MutationSchedule {
    pub fn new(max: f64, min: f64, num_approx_operations: usize) -> Result<Self> {
        for p in [max, min] {
            if !(0.0..=1.0).contains(&p) {
                return Err(MoebaError::Configuration(format!(
                    "mutation probability must lie in [0, 1], got {}",
                    p
                )));
            }
        }
        Ok(Self {
            max,
            min,
            num_approx_operations: num_approx_operations.max(1),
            num_operations: AtomicUsize::new(0),
            current: AtomicU64::new(max.to_bits()),
        })
    }

    /// Parses `"p"` or `"max-min"`.
    pub fn parse(raw: &str, num_approx_operations: usize) -> Result<Self> {
        let parse = |value: &str| {
            value.trim().parse::<f64>().map_err(|e| {
                MoebaError::Configuration(format!("invalid mutation probability {:?}: {}", raw, e))
            })
        };
        let parts: Vec<&str> = raw.split('-').collect();
        match parts.as_slice() {
            [p] => {
                let p = parse(p)?;
                Self::new(p, p, num_approx_operations)
            }
            [max, min] => Self::new(parse(max)?, parse(min)?, num_approx_operations),
            _ => Err(MoebaError::Configuration(format!(
                "invalid mutation probability: {:?}",
                raw
            ))),
        }
    }

    /// Advances the operation count and returns the probability for it.
    pub fn next_probability(&self) -> f64 {
        let k = self.num_operations.fetch_add(1, Ordering::Relaxed) + 1;
        let n = self.num_approx_operations as f64;
        let p = self.min + (self.max - self.min) * (n - k as f64) / n;
        let p = p.clamp(self.min.min(self.max), self.min.max(self.max));
        self.current.store(p.to_bits(), Ordering::Relaxed);
        p
    }

    pub fn current(&self) -> f64 {
        f64::from_bits(self.current.load(Ordering::Relaxed))
    }

    pub fn num_operations(&self) -> usize {
        self.num_operations.load(Ordering::Relaxed)
    }
}
