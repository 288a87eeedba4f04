use super::BitMutation;
use crate::genome::{next_clear_bit, next_set_bit, previous_clear_bit, previous_set_bit};
use crate::rng::RandomSource;

/// Flips each bit with the given probability. Serves as
/// `CellUniformMutation` and `RowColUniformMutation`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformMutation;

impl BitMutation for UniformMutation {
    fn mutate(&self, bits: &mut [bool], probability: f64, rng: &mut dyn RandomSource) {
        for bit in bits.iter_mut() {
            if rng.next_f64() < probability {
                *bit = !*bit;
            }
        }
    }
}

/// Boundary mutation that joins or splits neighbouring biclusters.
///
/// When position `i` is hit, a coin decides between joining (clearing the
/// next set bit at or after `i`) and splitting (setting the next clear bit
/// at or after `i`). Without such a bit ahead the closest one behind is
/// used, and failing that `i` itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct BicUniformMutation;

impl BitMutation for BicUniformMutation {
    fn mutate(&self, bits: &mut [bool], probability: f64, rng: &mut dyn RandomSource) {
        for i in 0..bits.len() {
            if rng.next_f64() < probability {
                let join = rng.next_bool();
                let target = if join {
                    next_set_bit(bits, i).or_else(|| previous_set_bit(bits, i))
                } else {
                    next_clear_bit(bits, i).or_else(|| previous_clear_bit(bits, i))
                }
                .unwrap_or(i);
                bits[target] = !bits[target];
            }
        }
    }
}

/// Reassigns each row, with the given probability, to a random cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentRandomMutation;

impl AssignmentRandomMutation {
    pub fn mutate(
        &self,
        assignment: &mut [usize],
        num_clusters: usize,
        probability: f64,
        rng: &mut dyn RandomSource,
    ) {
        if num_clusters == 0 {
            return;
        }
        for cluster in assignment.iter_mut() {
            if rng.next_f64() < probability {
                *cluster = rng.next_index(num_clusters);
            }
        }
    }
}
