//! Bilinear maps between lazy groups.
//!
//! A bilinear map `e: G1 x G2 -> GT` satisfies `e(a^x, b^y) = e(a, b)^(xy)`. The lazy wrapper
//! only records the pairing; the map runs once, when the value of the result is needed, and
//! its result can take part in further lazy arithmetic in `GT` like any other element.

use num_bigint::BigInt;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::groups::additive::{Residue, ResidueGroup};
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::groups::schnorr::{SchnorrElement, SchnorrGroup};
use crate::lazy::element::LazyGroupElement;
use crate::lazy::group::LazyGroup;
use crate::lazy::node::{Expr, ForeignEvaluation};

pub trait BilinearMap: Send + Sync + Debug + 'static {
    type G1: GroupPrimitive;
    type G2: GroupPrimitive;
    type GT: GroupPrimitive;

    fn apply(
        &self,
        gt: &Self::GT,
        a: &<Self::G1 as GroupPrimitive>::Elem,
        b: &<Self::G2 as GroupPrimitive>::Elem,
    ) -> Result<<Self::GT as GroupPrimitive>::Elem, GroupError>;
}

/// `(a, b) -> g^(ab)` from `Z_q x Z_q` into a Schnorr group of order `q`.
///
/// Bilinear, but anyone can compute discrete logarithms of the inputs, so it is only useful for
/// exercising code written against [`BilinearMap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExponentPairing;

impl BilinearMap for ExponentPairing {
    type G1 = ResidueGroup;
    type G2 = ResidueGroup;
    type GT = SchnorrGroup;

    fn apply(
        &self,
        gt: &SchnorrGroup,
        a: &Residue,
        b: &Residue,
    ) -> Result<SchnorrElement, GroupError> {
        let exponent = BigInt::from(a.value() * b.value());
        gt.pow(&gt.generator()?, &exponent)
    }
}

struct PairingEvaluation<M: BilinearMap> {
    lhs: LazyGroupElement<M::G1>,
    rhs: LazyGroupElement<M::G2>,
    map: Arc<M>,
}

impl<M: BilinearMap> Debug for PairingEvaluation<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingEvaluation")
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("map", &self.map)
            .finish()
    }
}

impl<M: BilinearMap> ForeignEvaluation<M::GT> for PairingEvaluation<M> {
    fn evaluate(
        &self,
        group: &LazyGroup<M::GT>,
    ) -> Result<<M::GT as GroupPrimitive>::Elem, GroupError> {
        let a = self.lhs.concrete_value()?;
        let b = self.rhs.concrete_value()?;
        self.map.apply(group.primitive(), &a, &b)
    }
}

pub struct LazyBilinearMap<M: BilinearMap> {
    g1: LazyGroup<M::G1>,
    g2: LazyGroup<M::G2>,
    gt: LazyGroup<M::GT>,
    map: Arc<M>,
}

impl<M: BilinearMap> LazyBilinearMap<M> {
    pub fn new(
        g1: LazyGroup<M::G1>,
        g2: LazyGroup<M::G2>,
        gt: LazyGroup<M::GT>,
        map: M,
    ) -> Self {
        Self {
            g1,
            g2,
            gt,
            map: Arc::new(map),
        }
    }

    pub fn g1(&self) -> &LazyGroup<M::G1> {
        &self.g1
    }

    pub fn g2(&self) -> &LazyGroup<M::G2> {
        &self.g2
    }

    pub fn gt(&self) -> &LazyGroup<M::GT> {
        &self.gt
    }

    /// `e(a, b)`. Both operands are checked against the map's groups before anything is
    /// recorded.
    pub fn apply(
        &self,
        a: &LazyGroupElement<M::G1>,
        b: &LazyGroupElement<M::G2>,
    ) -> Result<LazyGroupElement<M::GT>, GroupError> {
        if a.group() != &self.g1 || b.group() != &self.g2 {
            return Err(GroupError::IllegalArgument(
                "pairing operands are not in the map's source groups",
            ));
        }
        Ok(self
            .gt
            .node_element(Expr::PairingResult(Box::new(PairingEvaluation {
                lhs: a.clone(),
                rhs: b.clone(),
                map: Arc::clone(&self.map),
            }))))
    }

    /// `e(a, b)^x`.
    pub fn apply_pow<E: Into<BigInt>>(
        &self,
        a: &LazyGroupElement<M::G1>,
        b: &LazyGroupElement<M::G2>,
        x: E,
    ) -> Result<LazyGroupElement<M::GT>, GroupError> {
        Ok(self.apply(a, b)?.pow(x))
    }
}

impl<M: BilinearMap> Debug for LazyBilinearMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyBilinearMap")
            .field("g1", &self.g1)
            .field("g2", &self.g2)
            .field("gt", &self.gt)
            .field("map", &self.map)
            .finish()
    }
}
