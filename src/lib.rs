//! # lazygroup: Lazy Evaluation for Group Arithmetic
//!
//! lazygroup wraps any finite abelian group behind a small set of primitives and evaluates
//! expressions over it lazily. Operations, inversions and exponentiations only record what
//! to compute. When a value is finally needed, the expression below it is flattened into one
//! multi-exponentiation and evaluated with interleaved windowed exponentiation, so chains of
//! operations cost about as much as a single exponentiation.
//!
//! ## Key Features
//!
//! - Lazy elements with at-most-once evaluation, synchronous or on a worker pool
//! - Sliding window and wNAF exponentiation, chosen by the group's inversion cost
//! - Interleaved multi-exponentiation with shared squarings
//! - Per-base tables of small odd powers that grow on demand and are shared across threads
//! - Homomorphisms, bilinear maps and hash-into-group nodes that defer to the source graph
//! - Concrete groups: Schnorr subgroups of `Z_p^*`, additive `Z_n`, and the units of the
//!   BN254 base field
//!
//! ## Basic Usage
//!
//! ```rust
//! use lazygroup::{GroupError, LazyGroup, SchnorrGroup};
//! use num_bigint::BigUint;
//!
//! let schnorr = SchnorrGroup::new(
//!     BigUint::from(47u8),
//!     BigUint::from(23u8),
//!     BigUint::from(2u8),
//! )?;
//! let group = LazyGroup::new(schnorr);
//! let g = group.generator()?;
//! let h = g.pow(5);
//!
//! // nothing is computed until the comparison needs both values
//! let x = g.op(&h)?.pow(3).op(&h.inv())?;
//! assert!(!x.is_computed());
//! assert_eq!(x, g.pow(13));
//! # Ok::<(), GroupError>(())
//! ```
//!
//! ## Core Components
//!
//! - [`GroupPrimitive`]: the operations a concrete group provides
//! - [`LazyGroup`], [`LazyGroupElement`]: the lazy engine
//! - [`SmallExponentPrecomputation`], [`Multiexponentiation`]: exponentiation building blocks
//! - [`LazyHomomorphism`], [`LazyBilinearMap`]: structure-preserving maps between lazy groups
//! - [`SchnorrHasher`], [`Bn254UnitsHasher`]: hashing into groups with [`XMDExpander`]

mod exp;
mod fields;
mod groups;
mod hasher;
mod lazy;
mod pairing;
pub(crate) mod utils;

#[cfg(test)]
mod testing;

pub use crate::exp::algorithms::{
    interleaved_sliding_window_multiexp, interleaved_wnaf_multiexp, sliding_window_digits,
    sliding_window_exp, square_and_multiply, wnaf_digits, wnaf_exp,
};
pub use crate::exp::multiexp::{MultiexpTerm, Multiexponentiation};
pub use crate::exp::precomputation::{SmallExponentPrecomputation, MAX_WINDOW_SIZE};
pub use crate::exp::{ExponentiationAlgorithm, INVERSION_COST_THRESHOLD};

pub use crate::fields::fp::Fp;
pub use crate::groups::additive::{Residue, ResidueGroup};
pub use crate::groups::group::{GroupError, GroupPrimitive};
pub use crate::groups::schnorr::{DiscreteExponentiation, SchnorrElement, SchnorrGroup};
pub use crate::groups::units::Bn254Units;

pub use crate::hasher::{Bn254UnitsHasher, HashIntoGroup, SchnorrHasher, XMDExpander};
pub use crate::lazy::element::LazyGroupElement;
pub use crate::lazy::group::{
    LazyGroup, LazyGroupConfig, DEFAULT_EXPONENTIATION_WINDOW_SIZE,
    DEFAULT_PRECOMPUTATION_WINDOW_SIZE,
};
pub use crate::lazy::homomorphism::{Homomorphism, LazyHomomorphism};
pub use crate::lazy::node::ComputationState;
pub use crate::lazy::pool::WorkerPool;
pub use crate::pairing::{BilinearMap, ExponentPairing, LazyBilinearMap};
