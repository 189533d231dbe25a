//! The multiplicative group of the BN254 base field.
//!
//! Elements are non-zero [`Fp`] values in Montgomery form. Exponentiation is delegated to the
//! constant-time `pow` of `crypto_bigint`, so the lazy engine hands single exponentiations
//! straight to the field instead of running its own windowed algorithms.

use crypto_bigint::{Encoding, U256};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{Pow, Signed};

use crate::exp::precomputation::SmallExponentPrecomputation;
use crate::fields::fp::Fp;
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::utils::biguint_to_be32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bn254Units;

impl Bn254Units {
    pub fn characteristic() -> BigUint {
        BigUint::from_bytes_be(&Fp::characteristic().to_be_bytes())
    }

    /// Wraps `value`, rejecting zero and anything not reduced mod p.
    pub fn element(&self, value: &BigUint) -> Result<Fp, GroupError> {
        if value >= &Self::characteristic() {
            return Err(GroupError::IllegalArgument("value is not reduced mod p"));
        }
        let bytes = biguint_to_be32(value).ok_or(GroupError::IllegalArgument("value too wide"))?;
        let element = Fp::new(U256::from_be_bytes(bytes));
        if element.is_zero() {
            return Err(GroupError::IllegalArgument("zero is not a unit"));
        }
        Ok(element)
    }

    /// Reduces a signed exponent into `[0, p - 1)` as a `U256`.
    fn reduce(exponent: &BigInt) -> Result<U256, GroupError> {
        let order = BigInt::from(Self::characteristic() - 1u8);
        let mut reduced = exponent % &order;
        if reduced.is_negative() {
            reduced += &order;
        }
        biguint_to_be32(reduced.magnitude())
            .map(U256::from_be_bytes)
            .ok_or(GroupError::ArithmeticFailure("exponent out of range".to_string()))
    }
}

impl GroupPrimitive for Bn254Units {
    type Elem = Fp;

    fn op(&self, a: &Fp, b: &Fp) -> Fp {
        *a * *b
    }

    fn inv(&self, a: &Fp) -> Result<Fp, GroupError> {
        Option::<Fp>::from(a.invert())
            .ok_or(GroupError::ArithmeticFailure("zero is not a unit".to_string()))
    }

    fn square(&self, a: &Fp) -> Fp {
        a.square()
    }

    fn neutral_element(&self) -> Fp {
        Fp::ONE
    }

    fn pow(&self, base: &Fp, exponent: &BigInt) -> Result<Fp, GroupError> {
        Ok((*base).pow(Self::reduce(exponent)?))
    }

    /// Bernstein-Yang inversion is worth a few dozen multiplications.
    fn estimate_inversion_cost_per_op(&self) -> f64 {
        40.0
    }

    fn implements_own_exp(&self) -> bool {
        true
    }

    fn exp(
        &self,
        base: &Fp,
        exponent: &BigInt,
        _precomputation: &SmallExponentPrecomputation<Self>,
    ) -> Result<Fp, GroupError> {
        self.pow(base, exponent)
    }

    fn generator(&self) -> Result<Fp, GroupError> {
        Ok(Fp::THREE)
    }

    fn has_random_elements(&self) -> bool {
        true
    }

    fn random_element(&self) -> Result<Fp, GroupError> {
        let value =
            rand::thread_rng().gen_biguint_range(&BigUint::from(1u8), &Self::characteristic());
        self.element(&value)
    }

    fn size(&self) -> Option<BigUint> {
        Some(Self::characteristic() - 1u8)
    }

    fn unique_bytes(&self, a: &Fp) -> Vec<u8> {
        a.value().to_be_bytes().to_vec()
    }
}
