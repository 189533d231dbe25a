use num_bigint::BigInt;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::ops::Neg;
use std::sync::Arc;

use crate::exp::ExponentiationAlgorithm;
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::lazy::group::LazyGroup;
use crate::lazy::node::{ComputationState, Expr, Node};

/// An element of a [`LazyGroup`]: a handle to a node of an expression graph.
///
/// Group operations only record what to compute. The value is produced when it is asked for,
/// either explicitly ([`Self::compute`], [`Self::compute_sync`], [`Self::concrete_value`]) or by
/// anything that needs it (equality, hashing, [`Self::unique_bytes`], a parent whose own value
/// is needed). Clones are handles to the same node and share its cached value.
pub struct LazyGroupElement<G: GroupPrimitive> {
    group: LazyGroup<G>,
    node: Arc<Node<G>>,
}

impl<G: GroupPrimitive> Clone for LazyGroupElement<G> {
    fn clone(&self) -> Self {
        Self {
            group: self.group.clone(),
            node: Arc::clone(&self.node),
        }
    }
}

impl<G: GroupPrimitive> LazyGroupElement<G> {
    pub(crate) fn from_node(group: LazyGroup<G>, node: Arc<Node<G>>) -> Self {
        Self { group, node }
    }

    fn derive(&self, expr: Expr<G>) -> Self {
        self.group.node_element(expr)
    }

    pub fn group(&self) -> &LazyGroup<G> {
        &self.group
    }

    /// `self * other`. Fails right away if `other` belongs to a different group.
    pub fn op(&self, other: &Self) -> Result<Self, GroupError> {
        if self.group != other.group {
            return Err(GroupError::IllegalArgument("operands belong to different groups"));
        }
        Ok(self.derive(Expr::Op(Arc::clone(&self.node), Arc::clone(&other.node))))
    }

    pub fn inv(&self) -> Self {
        self.derive(Expr::Inv(Arc::clone(&self.node)))
    }

    /// `self * self`, recorded as an ordinary operation so accumulation merges both factors.
    pub fn square(&self) -> Self {
        self.derive(Expr::Op(Arc::clone(&self.node), Arc::clone(&self.node)))
    }

    pub fn pow<E: Into<BigInt>>(&self, exponent: E) -> Self {
        self.derive(Expr::Exp(Arc::clone(&self.node), exponent.into()))
    }

    /// Starts evaluating in the background and returns immediately. Repeated calls, or calls
    /// on an element already being evaluated, do nothing.
    pub fn compute(&self) -> &Self {
        self.node.request(&self.group);
        self
    }

    /// Evaluates on this thread, or waits for the thread already doing it.
    pub fn compute_sync(&self) -> Result<&Self, GroupError> {
        self.node.value(&self.group)?;
        Ok(self)
    }

    pub fn is_computed(&self) -> bool {
        self.computation_state() == ComputationState::Done
    }

    pub fn computation_state(&self) -> ComputationState {
        self.node.state()
    }

    /// The concrete value, blocking until it is available. Errors from evaluation, including
    /// asynchronous evaluation, surface here.
    pub fn concrete_value(&self) -> Result<G::Elem, GroupError> {
        self.node.value(&self.group)
    }

    /// Grows this element's table of small powers to the group's precomputation window
    /// size, so later exponentiations of it run with that window. wNAF groups also get the
    /// table of negative powers.
    pub fn precompute_pow(&self) -> Result<&Self, GroupError> {
        let window = self.group.precomputation_window_size();
        let primitive = self.group.primitive();
        let precomputation = self.node.precomputation(&self.group)?;
        precomputation.grow(primitive, window)?;
        if self.group.algorithm() == ExponentiationAlgorithm::Wnaf {
            precomputation.grow_negative(primitive, window)?;
        }
        Ok(self)
    }

    /// Window size of this element's table of small powers (zero if it has none).
    pub fn precomputed_window_size(&self) -> Result<usize, GroupError> {
        Ok(self.node.precomputation(&self.group)?.window_size())
    }

    pub fn unique_bytes(&self) -> Result<Vec<u8>, GroupError> {
        Ok(self.group.primitive().unique_bytes(&self.concrete_value()?))
    }
}

/// Forces both sides. An element whose evaluation failed only equals itself.
impl<G: GroupPrimitive> PartialEq for LazyGroupElement<G> {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        if self.group != other.group {
            return false;
        }
        match (self.concrete_value(), other.concrete_value()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl<G: GroupPrimitive> Eq for LazyGroupElement<G> {}

impl<G: GroupPrimitive> Hash for LazyGroupElement<G> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Ok(value) = self.concrete_value() {
            value.hash(state);
        }
    }
}

impl<G: GroupPrimitive> Neg for &LazyGroupElement<G> {
    type Output = LazyGroupElement<G>;

    fn neg(self) -> LazyGroupElement<G> {
        self.inv()
    }
}

impl<G: GroupPrimitive> Debug for LazyGroupElement<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyGroupElement")
            .field("node", &self.node)
            .finish()
    }
}
