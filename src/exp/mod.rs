//! Exponentiation over abstract groups: per-base precomputation tables, the multi-exponentiation
//! accumulator and the windowed algorithms that consume it.

pub mod algorithms;
pub mod multiexp;
pub mod precomputation;

use crate::groups::group::GroupPrimitive;

/// Inversion cost, in group operations, below which signed digits pay off.
pub const INVERSION_COST_THRESHOLD: f64 = 1.5;

/// Which windowed method drives single and multi-exponentiations of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExponentiationAlgorithm {
    /// Unsigned odd digits; never inverts anything for non-negative exponents.
    SlidingWindow,
    /// Signed odd digits; about half as many non-zero digits, at the price of inversions.
    Wnaf,
}

impl ExponentiationAlgorithm {
    /// wNAF when inverting costs less than [`INVERSION_COST_THRESHOLD`] operations, otherwise
    /// sliding windows.
    pub fn select(inversion_cost_per_op: f64) -> Self {
        if inversion_cost_per_op < INVERSION_COST_THRESHOLD {
            ExponentiationAlgorithm::Wnaf
        } else {
            ExponentiationAlgorithm::SlidingWindow
        }
    }
}

pub(crate) fn inversion_is_cheap<G: GroupPrimitive>(group: &G) -> bool {
    group.estimate_inversion_cost_per_op() < INVERSION_COST_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_threshold() {
        assert_eq!(ExponentiationAlgorithm::select(0.0), ExponentiationAlgorithm::Wnaf);
        assert_eq!(ExponentiationAlgorithm::select(1.49), ExponentiationAlgorithm::Wnaf);
        assert_eq!(
            ExponentiationAlgorithm::select(1.5),
            ExponentiationAlgorithm::SlidingWindow
        );
        assert_eq!(
            ExponentiationAlgorithm::select(200.0),
            ExponentiationAlgorithm::SlidingWindow
        );
    }
}
