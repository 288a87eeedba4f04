use super::PermutationMutation;
use crate::rng::RandomSource;

/// Swaps each position, with the given probability, with a random position.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapMutation;

impl PermutationMutation for SwapMutation {
    fn mutate(&self, permutation: &mut [usize], probability: f64, rng: &mut dyn RandomSource) {
        let n = permutation.len();
        for i in 0..n {
            if rng.next_f64() < probability {
                let j = rng.next_index(n);
                permutation.swap(i, j);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;

    #[test]
    fn test_single_swap() {
        let mut permutation = vec![3, 6, 2, 1, 5, 4, 8, 7, 0, 9];
        let mut rng = ScriptedRng::new(&[0.4], &[6]).with_fallback(0.6);

        SwapMutation.mutate(&mut permutation, 0.5, &mut rng);

        assert_eq!(permutation, vec![8, 6, 2, 1, 5, 4, 3, 7, 0, 9]);
    }
}
