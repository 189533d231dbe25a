//! Expression graph nodes.
//!
//! A node records how its value is obtained from other nodes, and memoizes two things: the
//! concrete value once somebody needs it, and its algebraic decomposition (an [`Accumulation`])
//! once some parent has flattened through it. Children are fixed at construction, so the graph
//! is acyclic and every blocking wait below eventually ends.

use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};

use crate::exp::multiexp::{MultiexpTerm, Multiexponentiation};
use crate::exp::precomputation::SmallExponentPrecomputation;
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::hasher::HashIntoGroup;
use crate::lazy::group::LazyGroup;
use crate::utils::lock;

/// Where a node is in its evaluation. Transitions only go forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComputationState {
    /// Nobody asked for the value yet.
    Nothing,
    /// Queued on the worker pool.
    Requested,
    /// Some thread is computing it; others wait.
    InProgress,
    /// Value (or the error evaluating it) is cached.
    Done,
}

/// A value living in another group's graph, evaluated and mapped into this one.
pub(crate) trait ForeignEvaluation<G: GroupPrimitive>: Send + Sync + Debug {
    fn evaluate(&self, group: &LazyGroup<G>) -> Result<G::Elem, GroupError>;
}

pub(crate) enum Expr<G: GroupPrimitive> {
    Const(G::Elem),
    Op(Arc<Node<G>>, Arc<Node<G>>),
    Inv(Arc<Node<G>>),
    Exp(Arc<Node<G>>, BigInt),
    Neutral,
    UniformRandom,
    HashResult {
        preimage: Vec<u8>,
        hasher: Arc<dyn HashIntoGroup<G>>,
    },
    HomomorphismResult(Box<dyn ForeignEvaluation<G>>),
    PairingResult(Box<dyn ForeignEvaluation<G>>),
}

impl<G: GroupPrimitive> Expr<G> {
    /// Variants whose value is a product of powers of other nodes.
    fn is_algebraic(&self) -> bool {
        matches!(
            self,
            Expr::Op(..) | Expr::Inv(..) | Expr::Exp(..) | Expr::Neutral
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Expr::Const(_) => "Const",
            Expr::Op(..) => "Op",
            Expr::Inv(_) => "Inv",
            Expr::Exp(..) => "Exp",
            Expr::Neutral => "Neutral",
            Expr::UniformRandom => "UniformRandom",
            Expr::HashResult { .. } => "HashResult",
            Expr::HomomorphismResult(_) => "HomomorphismResult",
            Expr::PairingResult(_) => "PairingResult",
        }
    }
}

enum Slot<G: GroupPrimitive> {
    Nothing,
    Requested,
    InProgress,
    Done(Result<G::Elem, GroupError>),
}

/// Algebraic content of a node: `constant * prod(terms) * prod(rest(part)^factor)`, where
/// `rest` is a part without its constant.
///
/// Immutable once built and shared by `Arc`. Records form a DAG in which a node reached along
/// many paths is stored once; [`Self::replay`] walks that DAG once, so the same record can feed
/// any number of accumulators at once.
pub(crate) struct Accumulation<G: GroupPrimitive> {
    terms: Vec<MultiexpTerm<G>>,
    parts: Vec<(Arc<Accumulation<G>>, BigInt)>,
    constant: Option<G::Elem>,
}

impl<G: GroupPrimitive> Default for Accumulation<G> {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            parts: Vec::new(),
            constant: None,
        }
    }
}

impl<G: GroupPrimitive> Accumulation<G> {
    pub(crate) fn constant(&self) -> Option<&G::Elem> {
        self.constant.as_ref()
    }

    fn key(record: &Self) -> usize {
        record as *const Self as usize
    }

    /// Appends the terms of this record and of every record below it, each exponent scaled
    /// by the product of factors along all paths leading to it. Constants are not replayed;
    /// [`Self::constant`] already includes those of the parts.
    pub(crate) fn replay(&self, into: &mut Multiexponentiation<G>) {
        let mut weights: HashMap<usize, BigInt> = HashMap::new();
        weights.insert(Self::key(self), BigInt::one());
        for record in self.topological_order() {
            let Some(weight) = weights.remove(&Self::key(record)) else {
                continue;
            };
            if weight.is_zero() {
                continue;
            }
            for term in &record.terms {
                into.put(term.scaled(&weight));
            }
            for (part, factor) in &record.parts {
                *weights.entry(Self::key(part)).or_default() += &weight * factor;
            }
        }
    }

    /// Every record reachable from this one, each listed before all records below it.
    fn topological_order(&self) -> Vec<&Self> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(self, false)];
        while let Some((record, expanded)) = stack.pop() {
            if expanded {
                order.push(record);
                continue;
            }
            if !seen.insert(Self::key(record)) {
                continue;
            }
            stack.push((record, true));
            for (part, _) in &record.parts {
                if !seen.contains(&Self::key(part)) {
                    stack.push((Arc::as_ref(part), false));
                }
            }
        }
        order.reverse();
        order
    }

    fn absorb_constant(&mut self, group: &G, c: G::Elem) {
        self.constant = Some(match self.constant.take() {
            None => c,
            Some(existing) => group.op(&existing, &c),
        });
    }

    /// Multiplies in `part^factor`: its constant becomes a term, the rest stays shared.
    fn absorb_part(&mut self, part: Arc<Accumulation<G>>, factor: &BigInt) {
        if let Some(c) = part.constant() {
            self.terms.push(MultiexpTerm::fresh(c.clone(), factor.clone()));
        }
        self.parts.push((part, factor.clone()));
    }
}

impl<G: GroupPrimitive> Drop for Accumulation<G> {
    fn drop(&mut self) {
        // unlink long chains one record at a time
        let mut pending: Vec<_> = self.parts.drain(..).map(|(part, _)| part).collect();
        while let Some(part) = pending.pop() {
            if let Some(mut record) = Arc::into_inner(part) {
                pending.extend(record.parts.drain(..).map(|(part, _)| part));
            }
        }
    }
}

/// How a child shows up in its parent's accumulation.
enum Part<G: GroupPrimitive> {
    /// A neutral node nobody asked to compute. Once computed it arrives as a `Value`.
    Nothing,
    Value(G::Elem),
    Record(Arc<Accumulation<G>>),
}

/// Publishes [`GroupError::EvaluationPanicked`] if evaluation unwinds, so waiters wake up.
struct PanicGuard<'a, G: GroupPrimitive>(&'a Node<G>);

impl<G: GroupPrimitive> Drop for PanicGuard<'_, G> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.publish(Err(GroupError::EvaluationPanicked));
        }
    }
}

pub(crate) struct Node<G: GroupPrimitive> {
    expr: Expr<G>,
    slot: Mutex<Slot<G>>,
    ready: Condvar,
    precomputation: OnceLock<Arc<SmallExponentPrecomputation<G>>>,
    accumulation: OnceLock<Arc<Accumulation<G>>>,
}

impl<G: GroupPrimitive> Node<G> {
    pub(crate) fn new(expr: Expr<G>) -> Arc<Self> {
        let slot = match &expr {
            Expr::Const(value) => Slot::Done(Ok(value.clone())),
            _ => Slot::Nothing,
        };
        Arc::new(Self {
            expr,
            slot: Mutex::new(slot),
            ready: Condvar::new(),
            precomputation: OnceLock::new(),
            accumulation: OnceLock::new(),
        })
    }

    pub(crate) fn constant(value: G::Elem) -> Arc<Self> {
        Self::new(Expr::Const(value))
    }

    pub(crate) fn state(&self) -> ComputationState {
        match *lock(&self.slot) {
            Slot::Nothing => ComputationState::Nothing,
            Slot::Requested => ComputationState::Requested,
            Slot::InProgress => ComputationState::InProgress,
            Slot::Done(_) => ComputationState::Done,
        }
    }

    /// Whether parents should use this node's value instead of decomposing it: somebody
    /// already asked for the value, or there is nothing to decompose.
    fn is_definite(&self) -> bool {
        !self.expr.is_algebraic() || self.state() != ComputationState::Nothing
    }

    /// The concrete value, computing it on this thread unless another thread already is.
    pub(crate) fn value(&self, group: &LazyGroup<G>) -> Result<G::Elem, GroupError> {
        {
            let mut slot = lock(&self.slot);
            loop {
                if let Slot::Done(result) = &*slot {
                    return result.clone();
                }
                if matches!(*slot, Slot::InProgress) {
                    slot = self
                        .ready
                        .wait(slot)
                        .unwrap_or_else(PoisonError::into_inner);
                } else {
                    *slot = Slot::InProgress;
                    break;
                }
            }
        }
        self.evaluate(group)
    }

    /// Queues evaluation on the group's pool. Only the first request for a fresh node does
    /// anything.
    pub(crate) fn request(self: &Arc<Self>, group: &LazyGroup<G>) {
        {
            let mut slot = lock(&self.slot);
            if !matches!(*slot, Slot::Nothing) {
                return;
            }
            *slot = Slot::Requested;
        }
        tracing::trace!(node = self.expr.name(), "LazyGroupElement::compute scheduled");
        let node = Arc::clone(self);
        let owner = group.clone();
        group.pool().execute(move || node.run_request(&owner));
    }

    fn run_request(&self, group: &LazyGroup<G>) {
        {
            let mut slot = lock(&self.slot);
            if !matches!(*slot, Slot::Requested) {
                return;
            }
            *slot = Slot::InProgress;
        }
        // errors stay in the slot for whoever asks next
        if panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(group))).is_err() {
            tracing::warn!(node = self.expr.name(), "asynchronous evaluation panicked");
        }
    }

    /// Caller has moved the slot to `InProgress`.
    fn evaluate(&self, group: &LazyGroup<G>) -> Result<G::Elem, GroupError> {
        let _guard = PanicGuard(self);
        let result = self.compute_concrete_value(group);
        self.publish(result.clone());
        result
    }

    fn publish(&self, result: Result<G::Elem, GroupError>) {
        *lock(&self.slot) = Slot::Done(result);
        self.ready.notify_all();
    }

    fn compute_concrete_value(&self, group: &LazyGroup<G>) -> Result<G::Elem, GroupError> {
        let primitive = group.primitive();
        match &self.expr {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Neutral => Ok(primitive.neutral_element()),
            Expr::UniformRandom => primitive.random_element(),
            Expr::HashResult { preimage, hasher } => hasher.hash_into(primitive, preimage),
            Expr::HomomorphismResult(evaluation) | Expr::PairingResult(evaluation) => {
                evaluation.evaluate(group)
            }
            Expr::Op(..) | Expr::Inv(_) | Expr::Exp(..) => {
                let record = self.accumulation(group)?;
                let mut multiexp = Multiexponentiation::new();
                record.replay(&mut multiexp);
                if let Some(c) = record.constant() {
                    multiexp.put_constant(primitive, c.clone());
                }
                group.compute_multiexp(&multiexp)
            }
        }
    }

    /// Cache of small powers of this node's value, shared by every exponentiation of it.
    pub(crate) fn precomputation(
        &self,
        group: &LazyGroup<G>,
    ) -> Result<Arc<SmallExponentPrecomputation<G>>, GroupError> {
        if let Some(precomputation) = self.precomputation.get() {
            return Ok(Arc::clone(precomputation));
        }
        let value = self.value(group)?;
        Ok(Arc::clone(self.precomputation.get_or_init(|| {
            Arc::new(SmallExponentPrecomputation::new(value))
        })))
    }

    fn part(&self, group: &LazyGroup<G>) -> Result<Part<G>, GroupError> {
        if self.is_definite() {
            return Ok(Part::Value(self.value(group)?));
        }
        match self.expr {
            Expr::Neutral => Ok(Part::Nothing),
            _ => Ok(Part::Record(self.accumulation(group)?)),
        }
    }

    fn children(&self) -> impl Iterator<Item = &Node<G>> {
        let (first, second) = match &self.expr {
            Expr::Op(lhs, rhs) => (Some(lhs), Some(rhs)),
            Expr::Inv(base) | Expr::Exp(base, _) => (Some(base), None),
            _ => (None, None),
        };
        first.into_iter().chain(second).map(Arc::as_ref)
    }

    /// A child its parent will decompose, and whose record is not built yet.
    fn lacks_accumulation(&self) -> bool {
        self.accumulation.get().is_none()
            && !self.is_definite()
            && !matches!(self.expr, Expr::Neutral)
    }

    /// Memoized decomposition of an algebraic node. Records are built bottom-up from an
    /// explicit stack, so graph depth is bounded by memory only. Two threads racing here both
    /// build a record; the first one stored wins and both are equivalent.
    pub(crate) fn accumulation(
        &self,
        group: &LazyGroup<G>,
    ) -> Result<Arc<Accumulation<G>>, GroupError> {
        let mut pending: Vec<&Node<G>> = vec![self];
        while let Some(&node) = pending.last() {
            if node.accumulation.get().is_some() {
                pending.pop();
                continue;
            }
            let missing: Vec<&Node<G>> = node
                .children()
                .filter(|child| child.lacks_accumulation())
                .collect();
            if missing.is_empty() {
                pending.pop();
                let record = Arc::new(node.build_accumulation(group)?);
                let _ = node.accumulation.set(record);
            } else {
                pending.extend(missing);
            }
        }
        self.accumulation.get().cloned().ok_or_else(|| {
            GroupError::ArithmeticFailure(format!("no accumulation for {}", self.expr.name()))
        })
    }

    /// Decomposes this node one level deep. Children that need a record already have one.
    fn build_accumulation(&self, group: &LazyGroup<G>) -> Result<Accumulation<G>, GroupError> {
        let primitive = group.primitive();
        let mut record = Accumulation::default();
        match &self.expr {
            Expr::Op(lhs, rhs) => {
                for child in [lhs, rhs] {
                    match child.part(group)? {
                        Part::Nothing => {}
                        Part::Value(value) => record.absorb_constant(primitive, value),
                        Part::Record(part) => {
                            if let Some(c) = part.constant() {
                                record.absorb_constant(primitive, c.clone());
                            }
                            record.parts.push((part, BigInt::one()));
                        }
                    }
                }
            }
            Expr::Inv(base) => Self::raise(&mut record, base, &BigInt::from(-1), group)?,
            Expr::Exp(base, exponent) => Self::raise(&mut record, base, exponent, group)?,
            _ => record.absorb_constant(primitive, self.value(group)?),
        }
        Ok(record)
    }

    /// Adds `base^exponent` to `record`: one term on the base's own cache if the base is a
    /// value, otherwise the base's record under `exponent`.
    fn raise(
        record: &mut Accumulation<G>,
        base: &Arc<Node<G>>,
        exponent: &BigInt,
        group: &LazyGroup<G>,
    ) -> Result<(), GroupError> {
        match base.part(group)? {
            Part::Nothing => {}
            Part::Value(_) => record.terms.push(MultiexpTerm::new(
                exponent.clone(),
                base.precomputation(group)?,
            )),
            Part::Record(part) => record.absorb_part(part, exponent),
        }
        Ok(())
    }
}

impl<G: GroupPrimitive> Drop for Node<G> {
    fn drop(&mut self) {
        // children uniquely owned by this node are torn down here instead of recursively
        let mut pending = Vec::new();
        Self::release_children(&mut self.expr, &mut pending);
        while let Some(child) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(child) {
                Self::release_children(&mut node.expr, &mut pending);
            }
        }
    }
}

impl<G: GroupPrimitive> Node<G> {
    fn release_children(expr: &mut Expr<G>, pending: &mut Vec<Arc<Node<G>>>) {
        match mem::replace(expr, Expr::Neutral) {
            Expr::Op(lhs, rhs) => pending.extend([lhs, rhs]),
            Expr::Inv(base) | Expr::Exp(base, _) => pending.push(base),
            _ => {}
        }
    }
}

impl<G: GroupPrimitive> Debug for Node<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("expr", &self.expr.name())
            .field("state", &self.state())
            .finish()
    }
}
