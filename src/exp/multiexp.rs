use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::exp::precomputation::SmallExponentPrecomputation;
use crate::groups::group::GroupPrimitive;

/// One factor `base^exponent` of a multi-exponentiation. The base is the one the
/// precomputation was built for.
pub struct MultiexpTerm<G: GroupPrimitive> {
    exponent: BigInt,
    precomputation: Arc<SmallExponentPrecomputation<G>>,
}

impl<G: GroupPrimitive> MultiexpTerm<G> {
    pub fn new(exponent: BigInt, precomputation: Arc<SmallExponentPrecomputation<G>>) -> Self {
        Self {
            exponent,
            precomputation,
        }
    }

    /// A term whose base has no cache yet.
    pub fn fresh(base: G::Elem, exponent: BigInt) -> Self {
        Self::new(exponent, Arc::new(SmallExponentPrecomputation::new(base)))
    }

    pub fn base(&self) -> &G::Elem {
        self.precomputation.base()
    }

    pub fn exponent(&self) -> &BigInt {
        &self.exponent
    }

    pub fn precomputation(&self) -> &Arc<SmallExponentPrecomputation<G>> {
        &self.precomputation
    }

    pub(crate) fn scaled(&self, factor: &BigInt) -> Self {
        Self::new(&self.exponent * factor, self.precomputation.clone())
    }
}

impl<G: GroupPrimitive> Clone for MultiexpTerm<G> {
    fn clone(&self) -> Self {
        Self::new(self.exponent.clone(), self.precomputation.clone())
    }
}

impl<G: GroupPrimitive> Debug for MultiexpTerm<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiexpTerm")
            .field("base", self.base())
            .field("exponent", &self.exponent)
            .finish()
    }
}

/// `constant * prod(base_i^exponent_i)`, built up while walking an expression graph and then
/// handed to an exponentiation algorithm once.
///
/// Terms sharing a precomputation object (that is, coming from the same graph node) are merged
/// by adding their exponents.
pub struct Multiexponentiation<G: GroupPrimitive> {
    terms: Vec<MultiexpTerm<G>>,
    positions: HashMap<usize, usize>,
    constant: Option<G::Elem>,
}

impl<G: GroupPrimitive> Default for Multiexponentiation<G> {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            positions: HashMap::new(),
            constant: None,
        }
    }
}

impl<G: GroupPrimitive> Multiexponentiation<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, term: MultiexpTerm<G>) {
        let key = Arc::as_ptr(&term.precomputation) as usize;
        match self.positions.get(&key) {
            Some(&i) => self.terms[i].exponent += term.exponent,
            None => {
                self.positions.insert(key, self.terms.len());
                self.terms.push(term);
            }
        }
    }

    /// Adds `base^exponent` with a fresh, unshared precomputation.
    pub fn put_base(&mut self, base: G::Elem, exponent: BigInt) {
        self.put(MultiexpTerm::fresh(base, exponent));
    }

    /// Multiplies `c` into the constant factor.
    pub fn put_constant(&mut self, group: &G, c: G::Elem) {
        self.constant = match self.constant.take() {
            None => Some(c),
            Some(existing) => Some(group.op(&existing, &c)),
        };
    }

    pub fn constant(&self) -> Option<&G::Elem> {
        self.constant.as_ref()
    }

    /// All terms, including ones whose exponent cancelled out to zero.
    pub fn terms(&self) -> &[MultiexpTerm<G>] {
        &self.terms
    }

    /// Terms that still contribute something.
    pub fn active_terms(&self) -> impl Iterator<Item = &MultiexpTerm<G>> {
        self.terms.iter().filter(|term| !term.exponent.is_zero())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if there is nothing to exponentiate; the constant may still be set.
    pub fn is_empty(&self) -> bool {
        self.active_terms().next().is_none()
    }

    /// Largest window size any term's precomputation already supports.
    pub fn largest_precomputed_window(&self) -> usize {
        self.active_terms()
            .map(|term| term.precomputation.window_size())
            .max()
            .unwrap_or(0)
    }
}

impl<G: GroupPrimitive> Debug for Multiexponentiation<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiexponentiation")
            .field("terms", &self.terms)
            .field("constant", &self.constant)
            .finish()
    }
}
