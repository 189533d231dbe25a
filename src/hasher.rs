//! Hashing arbitrary byte strings into groups.
//!
//! Message expansion follows RFC 9380 (`expand_message_xmd`): a domain separation tag (DST) and
//! the message are stretched into a uniformly random byte string, which each group then maps to
//! one of its elements. A hashed element has no known discrete logarithm with respect to any
//! other element, which is what makes it useful as an independent generator.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use sha3::digest::crypto_common::BlockSizeUser;
use sha3::Digest;
use std::fmt::{self, Debug};

use crate::fields::fp::Fp;
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::groups::schnorr::{SchnorrElement, SchnorrGroup};
use crate::groups::units::Bn254Units;

/// Hashed elements are retried with an incremented counter byte; this bounds the attempts.
const MAX_ATTEMPTS: u8 = 255;

fn to_hex(bytes: &[u8]) -> String {
    // A simple utility function to convert a byte array into a big endian hex string
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, &b| {
            acc.push_str(&format!("{:02x}", b));
            acc
        })
}

fn i2osp(val: u64, length: usize) -> Result<Vec<u8>, GroupError> {
    // this is an integer to octet representation of the given length
    if val >= (1 << (8 * length)) {
        return Err(GroupError::IllegalArgument("integer too large for octet string"));
    }
    Ok(val.to_be_bytes()[8 - length..].to_vec())
}

/// Maps byte strings into a group `G`.
pub trait HashIntoGroup<G: GroupPrimitive>: Send + Sync + Debug + 'static {
    fn hash_into(&self, group: &G, bytes: &[u8]) -> Result<G::Elem, GroupError>;
}

/// This implements the XMD function, which produces a uniformly random
/// byte string using a hash function that outputs b bits.
/// Usage of this function is recommended only with Sha2 and Sha3 hashes.
/// <https://datatracker.ietf.org/doc/html/rfc9380#name-expand_message_xmd>
pub struct XMDExpander<D: Digest + BlockSizeUser> {
    dst_prime: Vec<u8>,
    hash_fn: std::marker::PhantomData<fn() -> D>,
    security_param: u64,
}

impl<D: Digest + BlockSizeUser> XMDExpander<D> {
    const OVERSIZE_DST_PREFIX: &'static [u8] = b"H2C-OVERSIZE-DST-";

    pub fn new(dst: &[u8], security_param: u64) -> Self {
        let dst_prime = if dst.len() > 255 {
            D::new()
                .chain_update(Self::OVERSIZE_DST_PREFIX)
                .chain_update(dst)
                .finalize()
                .to_vec()
        } else {
            dst.to_vec()
        };

        XMDExpander {
            dst_prime,
            hash_fn: std::marker::PhantomData,
            security_param,
        }
    }

    pub fn expand_message(&self, msg: &[u8], len_in_bytes: usize) -> Result<Vec<u8>, GroupError> {
        let b_in_bytes = <D as Digest>::output_size();
        let r_in_bytes = D::block_size();
        let ell = len_in_bytes.div_ceil(b_in_bytes);
        let dst_prime = [
            self.dst_prime.as_slice(),
            &i2osp(self.dst_prime.len() as u64, 1)?,
        ]
        .concat();
        if 8 * b_in_bytes < 2 * self.security_param as usize || ell > 255 {
            return Err(GroupError::IllegalArgument("expansion parameters out of range"));
        }

        let z_pad = vec![0; r_in_bytes];
        let l_i_b_str = i2osp(len_in_bytes as u64, 2)?;

        let msg_prime = [&z_pad, msg, &l_i_b_str, &i2osp(0, 1)?, &dst_prime].concat();

        let b_0 = D::new().chain_update(msg_prime).finalize().to_vec();
        let mut b_vals = vec![Vec::new(); ell];
        b_vals[0] = D::new()
            .chain_update(&b_0)
            .chain_update(i2osp(1, 1)?)
            .chain_update(&dst_prime)
            .finalize()
            .to_vec();

        for i in 1..ell {
            let xored: Vec<u8> = b_0
                .iter()
                .zip(&b_vals[i - 1])
                .map(|(&x, &y)| x ^ y)
                .collect();
            b_vals[i] = D::new()
                .chain_update(xored)
                .chain_update(i2osp((i + 1) as u64, 1)?)
                .chain_update(&dst_prime)
                .finalize()
                .to_vec();
        }

        Ok(b_vals.into_iter().flatten().take(len_in_bytes).collect())
    }
}

impl<D: Digest + BlockSizeUser> Debug for XMDExpander<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XMDExpander")
            .field("dst_prime", &to_hex(&self.dst_prime))
            .field("security_param", &self.security_param)
            .finish()
    }
}

/// Expands the message (plus a counter byte) to `log2(p) + 128` bits, reduces mod `p` and
/// clears the cofactor. Retries if that lands on the neutral element.
pub struct SchnorrHasher<D: Digest + BlockSizeUser> {
    expander: XMDExpander<D>,
}

impl<D: Digest + BlockSizeUser> SchnorrHasher<D> {
    pub fn new(dst: &[u8]) -> Self {
        Self {
            expander: XMDExpander::new(dst, 128),
        }
    }
}

impl<D: Digest + BlockSizeUser> Debug for SchnorrHasher<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchnorrHasher").field(&self.expander).finish()
    }
}

impl<D: Digest + BlockSizeUser + 'static> HashIntoGroup<SchnorrGroup> for SchnorrHasher<D> {
    fn hash_into(&self, group: &SchnorrGroup, bytes: &[u8]) -> Result<SchnorrElement, GroupError> {
        let len_in_bytes = ((group.modulus().bits() + 7) / 8) as usize + 16;
        for counter in 0..MAX_ATTEMPTS {
            let msg = [bytes, &[counter][..]].concat();
            let expanded = self.expander.expand_message(&msg, len_in_bytes)?;
            let candidate = BigUint::from_bytes_be(&expanded) % group.modulus();
            if candidate.is_zero() {
                continue;
            }
            let value = candidate.modpow(group.cofactor(), group.modulus());
            if !value.is_one() {
                return group.element(value);
            }
        }
        Err(GroupError::ArithmeticFailure(
            "hash did not land in the group".to_string(),
        ))
    }
}

/// Expands to 48 bytes (RFC 9380's `L` for a 254-bit field), reduces mod `p` and retries on
/// zero.
pub struct Bn254UnitsHasher<D: Digest + BlockSizeUser> {
    expander: XMDExpander<D>,
}

impl<D: Digest + BlockSizeUser> Bn254UnitsHasher<D> {
    pub fn new(dst: &[u8]) -> Self {
        Self {
            expander: XMDExpander::new(dst, 128),
        }
    }
}

impl<D: Digest + BlockSizeUser> Debug for Bn254UnitsHasher<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bn254UnitsHasher")
            .field(&self.expander)
            .finish()
    }
}

impl<D: Digest + BlockSizeUser + 'static> HashIntoGroup<Bn254Units> for Bn254UnitsHasher<D> {
    fn hash_into(&self, group: &Bn254Units, bytes: &[u8]) -> Result<Fp, GroupError> {
        const L: usize = 48;
        let p = Bn254Units::characteristic();
        for counter in 0..MAX_ATTEMPTS {
            let msg = [bytes, &[counter][..]].concat();
            let expanded = self.expander.expand_message(&msg, L)?;
            let candidate = BigUint::from_bytes_be(&expanded) % &p;
            if !candidate.is_zero() {
                return group.element(&candidate);
            }
        }
        Err(GroupError::ArithmeticFailure(
            "hash did not land in the group".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::small_schnorr;
    use std::collections::HashMap;
    use std::sync::OnceLock;
    fn short_xmd_hashmap() -> &'static HashMap<&'static str, &'static str> {
        static HASHMAP: OnceLock<HashMap<&str, &str>> = OnceLock::new();
        HASHMAP.get_or_init(|| {
            let mut m = HashMap::new();
            m.insert("", "68a985b87eb6b46952128911f2a4412bbc302a9d759667f87f7a21d803f07235");
            m.insert("abc",
                     "d8ccab23b5985ccea865c6c97b6e5b8350e794e603b4b97902f53a8a0d605615");
            m.insert("q128_qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq", "b23a1d2b4d97b2ef7785562a7e8bac7eed54ed6e97e29aa51bfe3f12ddad1ff9");
            m
        })
    }
    fn long_xmd_hashmap() -> &'static HashMap<&'static str, &'static str> {
        static HASHMAP: OnceLock<HashMap<&str, &str>> = OnceLock::new();
        HASHMAP.get_or_init(|| {
            let mut m = HashMap::new();
            m.insert("", "e8dc0c8b686b7ef2074086fbdd2f30e3f8bfbd3bdf177f73f04b97ce618a3ed3");
            m.insert("abc",
                     "52dbf4f36cf560fca57dedec2ad924ee9c266341d8f3d6afe5171733b16bbb12");
            m.insert("q128_qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq", "01b637612bb18e840028be900a833a74414140dde0c4754c198532c3a0ba42bc");
            m
        })
    }
    mod xmd {
        use super::*;
        use sha2::Sha256;

        #[test]
        fn test_short_xmd() {
            let k = 128;
            let len_in_bytes = 0x20;
            let dst = b"QUUX-V01-CS02-with-expander-SHA256-128";

            let expander = XMDExpander::<Sha256>::new(dst, k);
            for (msg, expected_expanded_msg) in short_xmd_hashmap().iter() {
                let expanded_msg = expander
                    .expand_message(msg.as_bytes(), len_in_bytes)
                    .expect("Hashing for short XMD failed");
                assert_eq!(
                    to_hex(expanded_msg.as_slice()),
                    *expected_expanded_msg,
                    "Conversion for short XMD failed"
                );
            }
        }
        #[test]
        fn test_long_xmd() {
            let k = 128;
            let len_in_bytes = 0x20;
            let dst = b"QUUX-V01-CS02-with-expander-SHA256-128-long-DST-1111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111";
            let expander = XMDExpander::<Sha256>::new(dst, k);
            for (msg, expected_expanded_msg) in long_xmd_hashmap().iter() {
                let expanded_msg = expander
                    .expand_message(msg.as_bytes(), len_in_bytes)
                    .expect("Hashing for long XMD failed");
                assert_eq!(
                    to_hex(expanded_msg.as_slice()),
                    *expected_expanded_msg,
                    "Conversion for long XMD failed"
                );
            }
        }
        #[test]
        fn test_rejects_oversized_output() {
            let expander = XMDExpander::<Sha256>::new(b"DST", 128);
            assert!(expander.expand_message(b"", 32 * 256).is_err());
        }
    }
    mod into_group {
        use super::*;
        use sha3::Sha3_256;

        #[test]
        fn test_schnorr_hash_is_deterministic_member() {
            let group = small_schnorr();
            let hasher = SchnorrHasher::<Sha3_256>::new(b"LAZYGROUP-TEST");
            let a = hasher.hash_into(&group, b"message").expect("hash");
            let b = hasher.hash_into(&group, b"message").expect("hash");
            assert_eq!(a, b);
            assert!(group.element(a.value().clone()).is_ok());
            assert_ne!(a, group.neutral_element());
        }
        #[test]
        fn test_units_hash_is_deterministic_unit() {
            let hasher = Bn254UnitsHasher::<Sha3_256>::new(b"LAZYGROUP-TEST");
            let a = hasher.hash_into(&Bn254Units, b"abc").expect("hash");
            assert_eq!(hasher.hash_into(&Bn254Units, b"abc"), Ok(a));
            assert_ne!(hasher.hash_into(&Bn254Units, b"abd"), Ok(a));
            assert!(!a.is_zero());
        }
    }
}
