//! Prime-order subgroups of `Z_p^*`.
//!
//! For primes `p = kq + 1` the elements of order dividing `q` form a cyclic group of prime order
//! `q`. Arithmetic is plain modular multiplication on arbitrary-precision integers, which makes
//! this the reference group the lazy engine is tested against: every engine result can be
//! checked with a single `modpow`.

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{One, Signed, Zero};

use crate::groups::additive::{Residue, ResidueGroup};
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::lazy::homomorphism::Homomorphism;

/// An element of a [`SchnorrGroup`], i.e. a residue mod `p` of order dividing `q`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchnorrElement(BigUint);

impl SchnorrElement {
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchnorrGroup {
    p: BigUint,
    q: BigUint,
    cofactor: BigUint,
    generator: BigUint,
}

impl SchnorrGroup {
    /// Builds the order-`q` subgroup of `Z_p^*` generated by `g`.
    ///
    /// Checks that `q` divides `p - 1` and that `g` is a non-trivial element of order `q`.
    /// Primality of `p` and `q` is the caller's responsibility.
    pub fn new(p: BigUint, q: BigUint, g: BigUint) -> Result<Self, GroupError> {
        if p <= BigUint::from(3u8) || q <= BigUint::one() {
            return Err(GroupError::IllegalArgument("modulus and order must exceed 3 and 1"));
        }
        let p_minus_one = &p - 1u8;
        if !(&p_minus_one % &q).is_zero() {
            return Err(GroupError::IllegalArgument("q does not divide p - 1"));
        }
        if g <= BigUint::one() || g >= p || !g.modpow(&q, &p).is_one() {
            return Err(GroupError::IllegalArgument("generator does not have order q"));
        }
        let cofactor = p_minus_one / &q;
        Ok(Self {
            p,
            q,
            cofactor,
            generator: g,
        })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    pub fn order(&self) -> &BigUint {
        &self.q
    }

    pub fn cofactor(&self) -> &BigUint {
        &self.cofactor
    }

    /// Checks membership and wraps `value`.
    pub fn element(&self, value: BigUint) -> Result<SchnorrElement, GroupError> {
        if value.is_zero() || value >= self.p || !value.modpow(&self.q, &self.p).is_one() {
            return Err(GroupError::IllegalArgument("value is not in the subgroup"));
        }
        Ok(SchnorrElement(value))
    }

    /// Byte length of `p`, the fixed width of [`GroupPrimitive::unique_bytes`].
    fn byte_len(&self) -> usize {
        ((self.p.bits() + 7) / 8) as usize
    }
}

impl GroupPrimitive for SchnorrGroup {
    type Elem = SchnorrElement;

    fn op(&self, a: &SchnorrElement, b: &SchnorrElement) -> SchnorrElement {
        SchnorrElement((&a.0 * &b.0) % &self.p)
    }

    /// `a^(q-1)`; every element has order dividing `q`.
    fn inv(&self, a: &SchnorrElement) -> Result<SchnorrElement, GroupError> {
        Ok(SchnorrElement(a.0.modpow(&(&self.q - 1u8), &self.p)))
    }

    fn neutral_element(&self) -> SchnorrElement {
        SchnorrElement(BigUint::one())
    }

    fn pow(&self, base: &SchnorrElement, exponent: &BigInt) -> Result<SchnorrElement, GroupError> {
        let q = BigInt::from(self.q.clone());
        let mut reduced = exponent % &q;
        if reduced.is_negative() {
            reduced += &q;
        }
        let reduced = reduced.magnitude();
        Ok(SchnorrElement(base.0.modpow(reduced, &self.p)))
    }

    /// An inversion is a full exponentiation by `q - 1`.
    fn estimate_inversion_cost_per_op(&self) -> f64 {
        1.5 * self.q.bits() as f64
    }

    fn generator(&self) -> Result<SchnorrElement, GroupError> {
        Ok(SchnorrElement(self.generator.clone()))
    }

    fn has_random_elements(&self) -> bool {
        true
    }

    fn random_element(&self) -> Result<SchnorrElement, GroupError> {
        let exponent = rand::thread_rng().gen_biguint_below(&self.q);
        Ok(SchnorrElement(self.generator.modpow(&exponent, &self.p)))
    }

    fn size(&self) -> Option<BigUint> {
        Some(self.q.clone())
    }

    fn unique_bytes(&self, a: &SchnorrElement) -> Vec<u8> {
        let bytes = a.0.to_bytes_be();
        let mut padded = vec![0u8; self.byte_len().saturating_sub(bytes.len())];
        padded.extend_from_slice(&bytes);
        padded
    }
}

/// `x -> g^x` from the exponent group `Z_q` into the Schnorr group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscreteExponentiation;

impl Homomorphism<ResidueGroup, SchnorrGroup> for DiscreteExponentiation {
    fn apply(&self, target: &SchnorrGroup, x: &Residue) -> Result<SchnorrElement, GroupError> {
        let g = target.generator()?;
        Ok(SchnorrElement(g.0.modpow(x.value(), &target.p)))
    }
}
