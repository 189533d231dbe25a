//! Lazily evaluated group elements.
//!
//! Elements of a [`LazyGroup`] are nodes of an expression graph. When the value of a node is
//! needed, the subgraph below it is flattened into a single multi-exponentiation
//! `c * prod(b_i^x_i)` over concrete elements `b_i`, which is then evaluated with interleaved
//! windowed exponentiation. A chain like `g.op(h).pow(3).op(k.inv())` therefore costs one
//! multi-exponentiation instead of three exponentiations and a handful of group operations.

pub(crate) mod element;
pub(crate) mod group;
pub(crate) mod homomorphism;
pub(crate) mod node;
pub(crate) mod pool;
