//! The additive group `Z_n`.
//!
//! Inversion is negation, so this is the reference group for the signed-digit (wNAF) code
//! paths. It also serves as the exponent group `Z_q` of a [`crate::SchnorrGroup`].

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{One, Signed, Zero};

use crate::groups::group::{GroupError, GroupPrimitive};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Residue(BigUint);

impl Residue {
    /// Canonical representative in `[0, n)`.
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResidueGroup {
    modulus: BigUint,
}

impl ResidueGroup {
    pub fn new(modulus: BigUint) -> Result<Self, GroupError> {
        if modulus <= BigUint::one() {
            return Err(GroupError::IllegalArgument("modulus must exceed 1"));
        }
        Ok(Self { modulus })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// `value mod n`.
    pub fn element(&self, value: &BigInt) -> Residue {
        let n = BigInt::from(self.modulus.clone());
        let mut reduced = value % &n;
        if reduced.is_negative() {
            reduced += &n;
        }
        Residue(reduced.magnitude().clone())
    }

    fn byte_len(&self) -> usize {
        ((self.modulus.bits() + 7) / 8) as usize
    }
}

impl GroupPrimitive for ResidueGroup {
    type Elem = Residue;

    fn op(&self, a: &Residue, b: &Residue) -> Residue {
        Residue((&a.0 + &b.0) % &self.modulus)
    }

    fn inv(&self, a: &Residue) -> Result<Residue, GroupError> {
        if a.0.is_zero() {
            return Ok(Residue(BigUint::zero()));
        }
        Ok(Residue(&self.modulus - &a.0))
    }

    fn neutral_element(&self) -> Residue {
        Residue(BigUint::zero())
    }

    fn pow(&self, base: &Residue, exponent: &BigInt) -> Result<Residue, GroupError> {
        Ok(self.element(&(BigInt::from(base.0.clone()) * exponent)))
    }

    fn estimate_inversion_cost_per_op(&self) -> f64 {
        1.0
    }

    fn generator(&self) -> Result<Residue, GroupError> {
        Ok(Residue(BigUint::one()))
    }

    fn has_random_elements(&self) -> bool {
        true
    }

    fn random_element(&self) -> Result<Residue, GroupError> {
        Ok(Residue(rand::thread_rng().gen_biguint_below(&self.modulus)))
    }

    fn size(&self) -> Option<BigUint> {
        Some(self.modulus.clone())
    }

    fn unique_bytes(&self, a: &Residue) -> Vec<u8> {
        let bytes = a.0.to_bytes_be();
        let mut padded = vec![0u8; self.byte_len().saturating_sub(bytes.len())];
        padded.extend_from_slice(&bytes);
        padded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn z23() -> ResidueGroup {
        ResidueGroup::new(BigUint::from(23u8)).expect("valid modulus")
    }

    #[test]
    fn test_rejects_trivial_modulus() {
        assert!(ResidueGroup::new(BigUint::one()).is_err());
    }

    #[test]
    fn test_negation() {
        let group = z23();
        let a = group.element(&BigInt::from(5));
        let b = group.inv(&a).expect("inverse");
        assert_eq!(b.value(), &BigUint::from(18u8));
        assert_eq!(group.op(&a, &b), group.neutral_element());
        assert_eq!(group.inv(&group.neutral_element()), Ok(group.neutral_element()));
    }

    #[quickcheck]
    fn prop_pow_is_multiplication(a: i64, x: i64) -> bool {
        let group = z23();
        let base = group.element(&BigInt::from(a));
        let expected = group.element(&(BigInt::from(a) * BigInt::from(x)));
        group.pow(&base, &BigInt::from(x)) == Ok(expected)
    }
}
