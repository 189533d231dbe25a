//! This module implements the multiplicative structure of a prime field. The modulus is assumed
//! to be prime (and therefore odd), so every non-zero element is a unit. As in any Montgomery
//! implementation, elements are stored in Montgomery form and only converted back on demand.
//!
//! 1. Montgomery arithmetic:
//!     multiplication by a fixed modulus without divisions, relying
//!     on constants generated once per modulus. For more information, see Ref 1.
//! 2. Constant-time operations:
//!     all arithmetic goes through the `ConstMontyForm` struct of `crypto_bigint`,
//!     so exponentiation and inversion do not branch on secret values.
//!
//! References
//! ----------
//! 1. <https://cacr.uwaterloo.ca/hac/about/chap14.pdf>
//!
//! N.B.: the #[allow(unused_imports)] is a clippy quirk. The field struct is generated by a
//! macro, so crates used only inside the macro body look unused to the linter.

use crypto_bigint::subtle::{Choice, ConstantTimeEq};
#[allow(unused_imports)]
use crypto_bigint::{impl_modulus, modular::ConstMontyParams, Encoding, Zero, U256};
use num_traits::{One, Pow};
use std::hash::{Hash, Hasher};
use std::ops::{Mul, MulAssign};
use subtle::CtOption;

/// `crypto_bigint` requires the modulus to be declared through `impl_modulus!`, which
/// generates a zero-sized parameter struct. The element type is rolled into a macro around it.
#[allow(unused_macros)]
macro_rules! define_prime_field {
    ($wrapper_name:ident, $uint_type:ty, $modulus:expr) => {
        impl_modulus!(ModulusStruct, $uint_type, $modulus);

        // const-time arithmetic on montgomery form integers mod p
        type Output =
            crypto_bigint::modular::ConstMontyForm<ModulusStruct, { ModulusStruct::LIMBS }>;
        #[derive(Clone, Debug, Copy)]
        pub struct $wrapper_name(ModulusStruct, Output);

        impl $wrapper_name {
            pub const fn new(value: $uint_type) -> Self {
                Self(ModulusStruct, Output::new(&value))
            }
            /// Canonical (non-Montgomery) representative in `[0, p)`.
            pub const fn value(&self) -> $uint_type {
                self.1.retrieve()
            }
            pub fn characteristic() -> $uint_type {
                <$uint_type>::from(ModulusStruct::MODULUS.as_nz_ref().get())
            }
            pub fn is_zero(&self) -> bool {
                bool::from(self.1.is_zero())
            }
            pub fn square(&self) -> Self {
                (*self) * (*self)
            }
            /// Multiplicative inverse via Bernstein-Yang; none for zero.
            /// <https://eprint.iacr.org/2019/266.pdf>
            pub fn invert(&self) -> CtOption<Self> {
                let inverse = CtOption::from(self.1.inv());
                let is_some = inverse.is_some();
                CtOption::new(
                    Self::new(inverse.unwrap_or(Self::ZERO.1).retrieve()),
                    is_some,
                )
            }
            pub const ZERO: Self = Self::new(<$uint_type>::from_words([0x0; 4]));
            pub const ONE: Self = Self::new(<$uint_type>::from_words([0x1, 0x0, 0x0, 0x0]));
            pub const THREE: Self = Self::new(<$uint_type>::from_words([0x3, 0x0, 0x0, 0x0]));
        }
        impl From<u64> for $wrapper_name {
            fn from(value: u64) -> Self {
                Self(ModulusStruct, Output::new(&<$uint_type>::from_u64(value)))
            }
        }
        impl Mul for $wrapper_name {
            type Output = Self;
            fn mul(self, other: Self) -> Self {
                Self::new((self.1 * other.1).retrieve())
            }
        }
        impl MulAssign for $wrapper_name {
            fn mul_assign(&mut self, other: Self) {
                *self = *self * other;
            }
        }
        impl One for $wrapper_name {
            fn one() -> Self {
                Self::ONE
            }
        }
        impl Pow<$uint_type> for $wrapper_name {
            type Output = Self;
            fn pow(self, rhs: $uint_type) -> Self::Output {
                Self::new(self.1.pow(&rhs).retrieve())
            }
        }
        /// Equality goes through `subtle` so that comparing elements does not leak where
        /// they first differ.
        impl ConstantTimeEq for $wrapper_name {
            fn ct_eq(&self, other: &Self) -> Choice {
                self.1.ct_eq(&other.1)
            }
        }
        impl PartialEq for $wrapper_name {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                bool::from(self.ct_eq(other))
            }
        }
        impl Eq for $wrapper_name {}
        impl Hash for $wrapper_name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.value().to_be_bytes().hash(state);
            }
        }
    };
}

const BN254_MOD_STRING: &str = "30644e72e131a029b85045b68181585d97816a916871ca8d3c208c16d87cfd47";
define_prime_field!(Fp, U256, BN254_MOD_STRING);
