use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::groups::group::{GroupError, GroupPrimitive};
use crate::lazy::element::LazyGroupElement;
use crate::lazy::group::LazyGroup;
use crate::lazy::node::{Expr, ForeignEvaluation};

/// A structure-preserving map from `S` to `T`.
pub trait Homomorphism<S: GroupPrimitive, T: GroupPrimitive>: Send + Sync + Debug + 'static {
    fn apply(&self, target: &T, x: &S::Elem) -> Result<T::Elem, GroupError>;
}

/// Evaluates a preimage from the source graph and maps it.
struct HomomorphismEvaluation<S: GroupPrimitive, T: GroupPrimitive, H: Homomorphism<S, T>> {
    preimage: LazyGroupElement<S>,
    map: Arc<H>,
    _target: std::marker::PhantomData<fn() -> T>,
}

impl<S, T, H> Debug for HomomorphismEvaluation<S, T, H>
where
    S: GroupPrimitive,
    T: GroupPrimitive,
    H: Homomorphism<S, T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomomorphismEvaluation")
            .field("preimage", &self.preimage)
            .field("map", &self.map)
            .finish()
    }
}

impl<S, T, H> ForeignEvaluation<T> for HomomorphismEvaluation<S, T, H>
where
    S: GroupPrimitive,
    T: GroupPrimitive,
    H: Homomorphism<S, T>,
{
    fn evaluate(&self, group: &LazyGroup<T>) -> Result<T::Elem, GroupError> {
        let x = self.preimage.concrete_value()?;
        self.map.apply(group.primitive(), &x)
    }
}

/// A [`Homomorphism`] between two lazy groups. Images are lazy elements of the target group
/// and are only mapped when their value is needed.
pub struct LazyHomomorphism<S: GroupPrimitive, T: GroupPrimitive, H: Homomorphism<S, T>> {
    source: LazyGroup<S>,
    target: LazyGroup<T>,
    map: Arc<H>,
}

impl<S, T, H> LazyHomomorphism<S, T, H>
where
    S: GroupPrimitive,
    T: GroupPrimitive,
    H: Homomorphism<S, T>,
{
    pub fn new(source: LazyGroup<S>, target: LazyGroup<T>, map: H) -> Self {
        Self {
            source,
            target,
            map: Arc::new(map),
        }
    }

    pub fn source(&self) -> &LazyGroup<S> {
        &self.source
    }

    pub fn target(&self) -> &LazyGroup<T> {
        &self.target
    }

    pub fn apply(&self, x: &LazyGroupElement<S>) -> Result<LazyGroupElement<T>, GroupError> {
        if x.group() != &self.source {
            return Err(GroupError::IllegalArgument(
                "preimage is not in the homomorphism's source group",
            ));
        }
        Ok(self
            .target
            .node_element(Expr::HomomorphismResult(Box::new(HomomorphismEvaluation {
                preimage: x.clone(),
                map: Arc::clone(&self.map),
                _target: std::marker::PhantomData,
            }))))
    }
}

impl<S, T, H> Debug for LazyHomomorphism<S, T, H>
where
    S: GroupPrimitive,
    T: GroupPrimitive,
    H: Homomorphism<S, T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHomomorphism")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("map", &self.map)
            .finish()
    }
}
