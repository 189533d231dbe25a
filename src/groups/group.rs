use num_bigint::{BigInt, BigUint};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use crate::exp::algorithms::square_and_multiply;
use crate::exp::multiexp::Multiexponentiation;
use crate::exp::precomputation::SmallExponentPrecomputation;

/// Everything that can go wrong while building or evaluating group expressions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupError {
    /// The group lacks the requested capability (generator, sampling, native exponentiation).
    UnsupportedOperation(&'static str),
    /// Operands from different groups, malformed elements, or out-of-range parameters.
    IllegalArgument(&'static str),
    /// Raised by the underlying arithmetic, e.g. inverting a non-unit.
    ArithmeticFailure(String),
    /// The worker pool could not be built.
    WorkerPool(String),
    /// The thread evaluating a node panicked before producing a value.
    EvaluationPanicked,
}

impl Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::UnsupportedOperation(what) => write!(f, "unsupported operation: {what}"),
            GroupError::IllegalArgument(what) => write!(f, "illegal argument: {what}"),
            GroupError::ArithmeticFailure(what) => write!(f, "arithmetic failure: {what}"),
            GroupError::WorkerPool(what) => write!(f, "worker pool unavailable: {what}"),
            GroupError::EvaluationPanicked => write!(f, "evaluation panicked"),
        }
    }
}

impl std::error::Error for GroupError {}

/// The contract a concrete group has to satisfy so that the lazy engine can drive it.
///
/// Elements are plain immutable values; the implementor only has to provide the group law, the
/// inverse and the neutral element. Everything else has a default in terms of those, and the
/// engine only ever calls the primitives it needs to, see [`crate::LazyGroup`].
///
/// The group is assumed to be abelian: the engine reorders factors freely when it flattens an
/// expression into a multi-exponentiation. Two primitives comparing equal must describe the same
/// group, since elements of one are then accepted by the other.
pub trait GroupPrimitive: Send + Sync + Debug + PartialEq + 'static {
    /// Concrete element representation.
    type Elem: Clone + Debug + PartialEq + Eq + Hash + Send + Sync + 'static;

    /// The group law.
    fn op(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;

    /// The inverse of `a`. Fallible for representations that admit non-units.
    fn inv(&self, a: &Self::Elem) -> Result<Self::Elem, GroupError>;

    fn square(&self, a: &Self::Elem) -> Self::Elem {
        self.op(a, a)
    }

    fn neutral_element(&self) -> Self::Elem;

    fn is_neutral_element(&self, a: &Self::Elem) -> bool {
        *a == self.neutral_element()
    }

    /// Plain square-and-multiply; the engine only falls back to this when asked to.
    fn pow(&self, base: &Self::Elem, exponent: &BigInt) -> Result<Self::Elem, GroupError>
    where
        Self: Sized,
    {
        square_and_multiply(self, base, exponent)
    }

    /// How many group operations one inversion costs. Drives the choice between sliding
    /// windows and wNAF.
    fn estimate_inversion_cost_per_op(&self) -> f64;

    fn implements_own_exp(&self) -> bool {
        false
    }

    /// Native single exponentiation, only called when [`Self::implements_own_exp`] is true.
    fn exp(
        &self,
        _base: &Self::Elem,
        _exponent: &BigInt,
        _precomputation: &SmallExponentPrecomputation<Self>,
    ) -> Result<Self::Elem, GroupError>
    where
        Self: Sized,
    {
        Err(GroupError::UnsupportedOperation("exp"))
    }

    fn implements_own_multiexp(&self) -> bool {
        false
    }

    /// Native multi-exponentiation, only called when [`Self::implements_own_multiexp`] is true.
    fn multiexp(&self, _multiexp: &Multiexponentiation<Self>) -> Result<Self::Elem, GroupError>
    where
        Self: Sized,
    {
        Err(GroupError::UnsupportedOperation("multiexp"))
    }

    fn generator(&self) -> Result<Self::Elem, GroupError> {
        Err(GroupError::UnsupportedOperation("generator"))
    }

    /// Whether [`Self::random_element`] is implemented.
    fn has_random_elements(&self) -> bool {
        false
    }

    fn random_element(&self) -> Result<Self::Elem, GroupError> {
        Err(GroupError::UnsupportedOperation("random element"))
    }

    /// Group order, if known.
    fn size(&self) -> Option<BigUint>;

    fn is_commutative(&self) -> bool {
        true
    }

    /// A byte string that identifies `a` uniquely within this group.
    fn unique_bytes(&self, a: &Self::Elem) -> Vec<u8>;
}
