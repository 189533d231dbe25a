use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, Zero};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::exp::algorithms::{
    interleaved_sliding_window_multiexp, interleaved_wnaf_multiexp, sliding_window_exp, wnaf_exp,
};
use crate::exp::multiexp::{MultiexpTerm, Multiexponentiation};
use crate::exp::precomputation::{SmallExponentPrecomputation, MAX_WINDOW_SIZE};
use crate::exp::ExponentiationAlgorithm;
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::hasher::HashIntoGroup;
use crate::lazy::element::LazyGroupElement;
use crate::lazy::node::{Expr, Node};
use crate::lazy::pool::WorkerPool;

pub const DEFAULT_EXPONENTIATION_WINDOW_SIZE: usize = 4;
pub const DEFAULT_PRECOMPUTATION_WINDOW_SIZE: usize = 8;

/// Tuning knobs of a [`LazyGroup`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LazyGroupConfig {
    /// Window used for ad-hoc exponentiations. Each call may build a table of this size for
    /// every base involved, so it should stay small.
    pub exponentiation_window_size: usize,
    /// Window used by [`LazyGroupElement::precompute_pow`]. Tables of this size are meant to
    /// be kept for the lifetime of the base.
    pub precomputation_window_size: usize,
    /// Forces an algorithm instead of choosing by inversion cost.
    pub algorithm: Option<ExponentiationAlgorithm>,
}

impl Default for LazyGroupConfig {
    fn default() -> Self {
        Self {
            exponentiation_window_size: DEFAULT_EXPONENTIATION_WINDOW_SIZE,
            precomputation_window_size: DEFAULT_PRECOMPUTATION_WINDOW_SIZE,
            algorithm: None,
        }
    }
}

fn clamp_window(window: usize) -> usize {
    window.clamp(1, MAX_WINDOW_SIZE)
}

struct Inner<G: GroupPrimitive> {
    primitive: G,
    algorithm: ExponentiationAlgorithm,
    exponentiation_window: AtomicUsize,
    precomputation_window: AtomicUsize,
    pool: WorkerPool,
}

/// A group whose elements are evaluated lazily.
///
/// Wraps a [`GroupPrimitive`] and turns every expression built from its elements into as few
/// primitive-level (multi-)exponentiations as possible. Cloning is cheap and clones share
/// configuration.
pub struct LazyGroup<G: GroupPrimitive> {
    inner: Arc<Inner<G>>,
}

impl<G: GroupPrimitive> Clone for LazyGroup<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GroupPrimitive> LazyGroup<G> {
    /// Default configuration, asynchronous work on rayon's global pool.
    pub fn new(primitive: G) -> Self {
        Self::with_config(primitive, LazyGroupConfig::default(), WorkerPool::Shared)
    }

    pub fn with_pool(primitive: G, pool: WorkerPool) -> Self {
        Self::with_config(primitive, LazyGroupConfig::default(), pool)
    }

    pub fn with_config(primitive: G, config: LazyGroupConfig, pool: WorkerPool) -> Self {
        let cost = primitive.estimate_inversion_cost_per_op();
        let algorithm = config
            .algorithm
            .unwrap_or_else(|| ExponentiationAlgorithm::select(cost));
        tracing::debug!(
            ?algorithm,
            inversion_cost = cost,
            exponentiation_window = config.exponentiation_window_size,
            precomputation_window = config.precomputation_window_size,
            "LazyGroup::with_config"
        );
        Self {
            inner: Arc::new(Inner {
                primitive,
                algorithm,
                exponentiation_window: AtomicUsize::new(clamp_window(
                    config.exponentiation_window_size,
                )),
                precomputation_window: AtomicUsize::new(clamp_window(
                    config.precomputation_window_size,
                )),
                pool,
            }),
        }
    }

    pub fn primitive(&self) -> &G {
        &self.inner.primitive
    }

    pub fn algorithm(&self) -> ExponentiationAlgorithm {
        self.inner.algorithm
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    pub fn exponentiation_window_size(&self) -> usize {
        self.inner.exponentiation_window.load(Ordering::Relaxed)
    }

    pub fn set_exponentiation_window_size(&self, window: usize) {
        self.inner
            .exponentiation_window
            .store(clamp_window(window), Ordering::Relaxed);
    }

    pub fn precomputation_window_size(&self) -> usize {
        self.inner.precomputation_window.load(Ordering::Relaxed)
    }

    pub fn set_precomputation_window_size(&self, window: usize) {
        self.inner
            .precomputation_window
            .store(clamp_window(window), Ordering::Relaxed);
    }

    fn element(&self, node: Arc<Node<G>>) -> LazyGroupElement<G> {
        LazyGroupElement::from_node(self.clone(), node)
    }

    pub(crate) fn node_element(&self, expr: Expr<G>) -> LazyGroupElement<G> {
        self.element(Node::new(expr))
    }

    /// Lifts a concrete element; it counts as already computed.
    pub fn wrap(&self, value: G::Elem) -> LazyGroupElement<G> {
        self.element(Node::constant(value))
    }

    pub fn neutral_element(&self) -> LazyGroupElement<G> {
        self.node_element(Expr::Neutral)
    }

    pub fn generator(&self) -> Result<LazyGroupElement<G>, GroupError> {
        Ok(self.wrap(self.primitive().generator()?))
    }

    /// A uniformly random element, drawn once when first needed.
    pub fn random_element(&self) -> Result<LazyGroupElement<G>, GroupError> {
        if !self.primitive().has_random_elements() {
            return Err(GroupError::UnsupportedOperation("random element"));
        }
        Ok(self.node_element(Expr::UniformRandom))
    }

    /// The image of `bytes` under `hasher`, hashed once when first needed.
    pub fn hash_into<H: HashIntoGroup<G>>(
        &self,
        hasher: Arc<H>,
        bytes: &[u8],
    ) -> LazyGroupElement<G> {
        self.node_element(Expr::HashResult {
            preimage: bytes.to_vec(),
            hasher,
        })
    }

    pub fn size(&self) -> Option<BigUint> {
        self.primitive().size()
    }

    pub fn is_commutative(&self) -> bool {
        self.primitive().is_commutative()
    }

    /// Reduces `exponent` modulo the group order, if known. Sliding-window groups get the
    /// non-negative representative so they never invert; wNAF groups get the one of smallest
    /// magnitude.
    pub fn normalize_exponent(&self, exponent: &BigInt) -> BigInt {
        let Some(order) = self.size().filter(|n| !n.is_zero()) else {
            return exponent.clone();
        };
        let order = BigInt::from(order);
        let mut reduced = exponent % &order;
        if reduced.is_negative() {
            reduced += &order;
        }
        if self.algorithm() == ExponentiationAlgorithm::Wnaf && &reduced * 2 > order {
            reduced -= &order;
        }
        reduced
    }

    fn run(
        &self,
        terms: &[MultiexpTerm<G>],
        window: usize,
    ) -> Result<G::Elem, GroupError> {
        let primitive = self.primitive();
        match self.algorithm() {
            ExponentiationAlgorithm::SlidingWindow => {
                interleaved_sliding_window_multiexp(primitive, terms, window)
            }
            ExponentiationAlgorithm::Wnaf => interleaved_wnaf_multiexp(primitive, terms, window),
        }
    }

    /// `base^exponent`, using and growing `precomputation` (which must belong to `base`).
    pub fn compute_exp(
        &self,
        base: &G::Elem,
        exponent: &BigInt,
        precomputation: &SmallExponentPrecomputation<G>,
    ) -> Result<G::Elem, GroupError> {
        let primitive = self.primitive();
        let exponent = self.normalize_exponent(exponent);
        if exponent.is_zero() {
            return Ok(primitive.neutral_element());
        }
        if primitive.implements_own_exp() {
            return primitive.exp(base, &exponent, precomputation);
        }
        let window = self
            .exponentiation_window_size()
            .max(precomputation.window_size());
        tracing::trace!(window, algorithm = ?self.algorithm(), "LazyGroup::compute_exp");
        match self.algorithm() {
            ExponentiationAlgorithm::SlidingWindow => {
                sliding_window_exp(primitive, &exponent, precomputation, window)
            }
            ExponentiationAlgorithm::Wnaf => wnaf_exp(primitive, &exponent, precomputation, window),
        }
    }

    /// Evaluates `constant * prod(base_i^exponent_i)` with a single primitive-level call.
    pub fn compute_multiexp(
        &self,
        multiexp: &Multiexponentiation<G>,
    ) -> Result<G::Elem, GroupError> {
        let primitive = self.primitive();
        let terms: Vec<MultiexpTerm<G>> = multiexp
            .active_terms()
            .map(|term| {
                MultiexpTerm::new(
                    self.normalize_exponent(term.exponent()),
                    Arc::clone(term.precomputation()),
                )
            })
            .filter(|term| !term.exponent().is_zero())
            .collect();
        let product = match terms.as_slice() {
            [] => None,
            [term] => Some(self.compute_exp(term.base(), term.exponent(), term.precomputation())?),
            _ if primitive.implements_own_multiexp() => {
                let mut normalized = Multiexponentiation::new();
                for term in terms {
                    normalized.put(term);
                }
                Some(primitive.multiexp(&normalized)?)
            }
            _ => {
                let window = terms
                    .iter()
                    .map(|term| term.precomputation().window_size())
                    .fold(self.exponentiation_window_size(), usize::max);
                tracing::debug!(
                    terms = terms.len(),
                    window,
                    algorithm = ?self.algorithm(),
                    "LazyGroup::compute_multiexp"
                );
                Some(self.run(&terms, window)?)
            }
        };
        Ok(match (multiexp.constant(), product) {
            (None, None) => primitive.neutral_element(),
            (Some(c), None) => c.clone(),
            (None, Some(p)) => p,
            (Some(c), Some(p)) => primitive.op(c, &p),
        })
    }
}

impl<G: GroupPrimitive> PartialEq for LazyGroup<G> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.primitive == other.inner.primitive
    }
}

impl<G: GroupPrimitive> Debug for LazyGroup<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyGroup")
            .field("primitive", &self.inner.primitive)
            .field("algorithm", &self.inner.algorithm)
            .field("exponentiation_window", &self.exponentiation_window_size())
            .field("precomputation_window", &self.precomputation_window_size())
            .finish()
    }
}
