use num_bigint::BigUint;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Left-pads a big-endian byte string to exactly `M` bytes.
///
/// Used to move arbitrary-precision integers into fixed-width `crypto_bigint` words. Returns
/// `None` if the value does not fit.
///
/// # Arguments
/// * `bytes`: big-endian representation, possibly shorter than `M`
pub(crate) fn to_fixed_width<const M: usize>(bytes: &[u8]) -> Option<[u8; M]> {
    if bytes.len() > M {
        return None;
    }
    let mut padded = [0u8; M];
    padded[M - bytes.len()..].copy_from_slice(bytes);
    Some(padded)
}

/// Converts a `BigUint` below `2^256` to the 32-byte big-endian form `U256` expects.
pub(crate) fn biguint_to_be32(value: &BigUint) -> Option<[u8; 32]> {
    to_fixed_width::<32>(&value.to_bytes_be())
}

/// Locks a mutex, recovering the guard if a previous holder panicked. Every structure guarded
/// this way stays consistent across a panic, since it is only ever appended to.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
