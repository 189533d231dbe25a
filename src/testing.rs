//! Instrumented group primitives for tests.

use num_bigint::{BigInt, BigUint};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::exp::multiexp::Multiexponentiation;
use crate::groups::additive::{Residue, ResidueGroup};
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::groups::schnorr::SchnorrGroup;

/// The order-23 subgroup of `Z_47^*`, generated by 2.
pub(crate) fn small_schnorr() -> SchnorrGroup {
    SchnorrGroup::new(
        BigUint::from(47u8),
        BigUint::from(23u8),
        BigUint::from(2u8),
    )
    .expect("valid parameters")
}

/// Counts how often each primitive is invoked on the wrapped group.
#[derive(Debug)]
pub(crate) struct CountingGroup<G: GroupPrimitive> {
    inner: G,
    ops: AtomicUsize,
    squares: AtomicUsize,
    inversions: AtomicUsize,
    draws: AtomicUsize,
}

impl<G: GroupPrimitive> CountingGroup<G> {
    pub(crate) fn new(inner: G) -> Self {
        Self {
            inner,
            ops: AtomicUsize::new(0),
            squares: AtomicUsize::new(0),
            inversions: AtomicUsize::new(0),
            draws: AtomicUsize::new(0),
        }
    }

    pub(crate) fn ops(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    pub(crate) fn squares(&self) -> usize {
        self.squares.load(Ordering::SeqCst)
    }

    pub(crate) fn inversions(&self) -> usize {
        self.inversions.load(Ordering::SeqCst)
    }

    pub(crate) fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        for counter in [&self.ops, &self.squares, &self.inversions, &self.draws] {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

/// Counters make no two instances interchangeable.
impl<G: GroupPrimitive> PartialEq for CountingGroup<G> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl<G: GroupPrimitive> GroupPrimitive for CountingGroup<G> {
    type Elem = G::Elem;

    fn op(&self, a: &G::Elem, b: &G::Elem) -> G::Elem {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.op(a, b)
    }

    fn inv(&self, a: &G::Elem) -> Result<G::Elem, GroupError> {
        self.inversions.fetch_add(1, Ordering::SeqCst);
        self.inner.inv(a)
    }

    fn square(&self, a: &G::Elem) -> G::Elem {
        self.squares.fetch_add(1, Ordering::SeqCst);
        self.inner.op(a, a)
    }

    fn neutral_element(&self) -> G::Elem {
        self.inner.neutral_element()
    }

    fn estimate_inversion_cost_per_op(&self) -> f64 {
        self.inner.estimate_inversion_cost_per_op()
    }

    fn generator(&self) -> Result<G::Elem, GroupError> {
        self.inner.generator()
    }

    fn has_random_elements(&self) -> bool {
        self.inner.has_random_elements()
    }

    fn random_element(&self) -> Result<G::Elem, GroupError> {
        self.draws.fetch_add(1, Ordering::SeqCst);
        self.inner.random_element()
    }

    fn size(&self) -> Option<BigUint> {
        self.inner.size()
    }

    fn unique_bytes(&self, a: &G::Elem) -> Vec<u8> {
        self.inner.unique_bytes(a)
    }
}

/// A Schnorr group that cannot invert and does not reveal its order, so negative exponents
/// are never normalized away and every inversion fails.
#[derive(Debug, PartialEq)]
pub(crate) struct FragileGroup(pub(crate) SchnorrGroup);

impl GroupPrimitive for FragileGroup {
    type Elem = <SchnorrGroup as GroupPrimitive>::Elem;

    fn op(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem {
        self.0.op(a, b)
    }

    fn inv(&self, _a: &Self::Elem) -> Result<Self::Elem, GroupError> {
        Err(GroupError::ArithmeticFailure("inversion unavailable".to_string()))
    }

    fn neutral_element(&self) -> Self::Elem {
        self.0.neutral_element()
    }

    fn estimate_inversion_cost_per_op(&self) -> f64 {
        f64::INFINITY
    }

    fn generator(&self) -> Result<Self::Elem, GroupError> {
        self.0.generator()
    }

    fn size(&self) -> Option<BigUint> {
        None
    }

    fn unique_bytes(&self, a: &Self::Elem) -> Vec<u8> {
        self.0.unique_bytes(a)
    }
}

/// `Z_n` with a native multi-exponentiation (a plain weighted sum) that records its calls.
#[derive(Debug)]
pub(crate) struct NativeMultiexpGroup {
    inner: ResidueGroup,
    calls: AtomicUsize,
}

impl NativeMultiexpGroup {
    pub(crate) fn new(modulus: u64) -> Self {
        Self {
            inner: ResidueGroup::new(BigUint::from(modulus)).expect("valid modulus"),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PartialEq for NativeMultiexpGroup {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl GroupPrimitive for NativeMultiexpGroup {
    type Elem = Residue;

    fn op(&self, a: &Residue, b: &Residue) -> Residue {
        self.inner.op(a, b)
    }

    fn inv(&self, a: &Residue) -> Result<Residue, GroupError> {
        self.inner.inv(a)
    }

    fn neutral_element(&self) -> Residue {
        self.inner.neutral_element()
    }

    fn estimate_inversion_cost_per_op(&self) -> f64 {
        self.inner.estimate_inversion_cost_per_op()
    }

    fn implements_own_multiexp(&self) -> bool {
        true
    }

    fn multiexp(&self, multiexp: &Multiexponentiation<Self>) -> Result<Residue, GroupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let sum = multiexp
            .active_terms()
            .map(|term| BigInt::from(term.base().value().clone()) * term.exponent())
            .sum::<BigInt>();
        Ok(self.inner.element(&sum))
    }

    fn generator(&self) -> Result<Residue, GroupError> {
        self.inner.generator()
    }

    fn size(&self) -> Option<BigUint> {
        self.inner.size()
    }

    fn unique_bytes(&self, a: &Residue) -> Vec<u8> {
        self.inner.unique_bytes(a)
    }
}
