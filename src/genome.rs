//! # Genome
//!
//! The encoded form of a candidate solution: an integer part and a list of
//! equally long bit vectors. What each part means depends on the codec; for
//! the generic representation the integers are a permutation of row indices,
//! bit vector 0 marks bicluster boundaries by position and bit vector `1 + j`
//! holds the column `j` votes, indexed by row value.

/// A fixed-length vector of bits.
pub type BitVector = Vec<bool>;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Genome {
    pub integers: Vec<usize>,
    pub bits: Vec<BitVector>,
}

impl Genome {
    pub fn new(integers: Vec<usize>, bits: Vec<BitVector>) -> Self {
        Self { integers, bits }
    }

    /// `true` when the integer part is a bijection over `[0, len)`.
    pub fn is_permutation(&self) -> bool {
        is_permutation(&self.integers)
    }

    /// Number of set bits in bit vector `index`.
    pub fn cardinality(&self, index: usize) -> usize {
        self.bits
            .get(index)
            .map_or(0, |bits| bits.iter().filter(|b| **b).count())
    }
}

/// `true` when `values` holds every index in `[0, values.len())` exactly once.
pub fn is_permutation(values: &[usize]) -> bool {
    let mut seen = vec![false; values.len()];
    for &v in values {
        if v >= values.len() || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Index of the first set bit at or after `from`.
pub fn next_set_bit(bits: &[bool], from: usize) -> Option<usize> {
    (from..bits.len()).find(|&i| bits[i])
}

/// Index of the first clear bit at or after `from`.
pub fn next_clear_bit(bits: &[bool], from: usize) -> Option<usize> {
    (from..bits.len()).find(|&i| !bits[i])
}

/// Index of the last set bit at or before `from`.
pub fn previous_set_bit(bits: &[bool], from: usize) -> Option<usize> {
    (0..=from.min(bits.len().checked_sub(1)?))
        .rev()
        .find(|&i| bits[i])
}

/// Index of the last clear bit at or before `from`.
pub fn previous_clear_bit(bits: &[bool], from: usize) -> Option<usize> {
    (0..=from.min(bits.len().checked_sub(1)?))
        .rev()
        .find(|&i| !bits[i])
}
