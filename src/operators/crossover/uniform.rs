use super::BitCrossover;
use crate::rng::RandomSource;

/// Exchanges each position between `a` and `b` with probability one half.
pub(crate) fn uniform_exchange<T>(a: &mut [T], b: &mut [T], rng: &mut dyn RandomSource) {
    for (x, y) in a.iter_mut().zip(b.iter_mut()) {
        if rng.next_f64() < 0.5 {
            std::mem::swap(x, y);
        }
    }
}

/// Uniform crossover over a bit vector. Serves as `BicUniformCrossover`,
/// `CellUniformCrossover` and `RowColUniformCrossover`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformCrossover;

impl BitCrossover for UniformCrossover {
    fn cross(&self, bits1: &mut [bool], bits2: &mut [bool], rng: &mut dyn RandomSource) {
        uniform_exchange(bits1, bits2, rng);
    }
}

/// Uniform exchange of cluster assignments between two row assignments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentUniformCrossover;

impl AssignmentUniformCrossover {
    pub fn cross(&self, assignment1: &mut [usize], assignment2: &mut [usize], rng: &mut dyn RandomSource) {
        uniform_exchange(assignment1, assignment2, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;

    #[test]
    fn test_only_first_bit_exchanged() {
        let mut bits1 = vec![true, false, true, false];
        let mut bits2 = vec![false, true, true, true];
        let mut rng = ScriptedRng::new(&[0.1], &[]).with_fallback(0.99);

        UniformCrossover.cross(&mut bits1, &mut bits2, &mut rng);

        assert_eq!(bits1, vec![false, false, true, false]);
        assert_eq!(bits2, vec![true, true, true, true]);
    }

    #[test]
    fn test_assignment_exchange() {
        let mut a = vec![0, 0, 0];
        let mut b = vec![1, 1, 1];
        let mut rng = ScriptedRng::new(&[0.9, 0.2, 0.7], &[]);

        AssignmentUniformCrossover.cross(&mut a, &mut b, &mut rng);

        assert_eq!(a, vec![0, 1, 0]);
        assert_eq!(b, vec![1, 0, 1]);
    }
}
