//! Exponentiation algorithms over an abstract abelian group.
//!
//! Both windowed methods are expressed the same way: the exponent is recoded into a little-endian
//! vector of signed digits, where every non-zero digit is odd and small enough to be looked up in
//! the base's [`SmallExponentPrecomputation`]. Evaluation then walks the digit positions from the
//! most significant one down, squaring a single running result once per position and multiplying
//! in the cached power of every term whose digit at that position is non-zero. With one term this
//! is the textbook left-to-right method; with many terms the squarings are shared, which is the
//! whole point of interleaving.
//!
//! References
//! ----------
//! 1. <https://cacr.uwaterloo.ca/hac/about/chap14.pdf>, algorithms 14.85 and 14.88
//! 2. Möller, "Algorithms for multi-exponentiation", SAC 2001

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Signed;

use crate::exp::multiexp::MultiexpTerm;
use crate::exp::precomputation::{window_for, SmallExponentPrecomputation, MAX_WINDOW_SIZE};
use crate::groups::group::{GroupError, GroupPrimitive};

/// Binary left-to-right exponentiation. Negative exponents are handled by inverting the result.
pub fn square_and_multiply<G: GroupPrimitive>(
    group: &G,
    base: &G::Elem,
    exponent: &BigInt,
) -> Result<G::Elem, GroupError> {
    let magnitude = exponent.magnitude();
    let bits = magnitude.bits();
    if bits == 0 {
        return Ok(group.neutral_element());
    }
    let mut result = base.clone();
    for i in (0..bits - 1).rev() {
        result = group.square(&result);
        if magnitude.bit(i) {
            result = group.op(&result, base);
        }
    }
    match exponent.sign() {
        Sign::Minus => group.inv(&result),
        _ => Ok(result),
    }
}

/// Sliding-window recoding of `exponent`.
///
/// Scanning from the top, each set bit opens a window of at most `window` bits that is shrunk
/// until it also ends in a set bit; the window's value is stored at its lowest position. Digits
/// are therefore odd and below `2^window`.
pub fn sliding_window_digits(exponent: &BigUint, window: usize) -> Vec<i64> {
    let window = window.clamp(1, MAX_WINDOW_SIZE) as i64;
    let bits = exponent.bits() as i64;
    let mut digits = vec![0i64; bits as usize];
    let mut i = bits - 1;
    while i >= 0 {
        if !exponent.bit(i as u64) {
            i -= 1;
            continue;
        }
        let mut low = (i - window + 1).max(0);
        while !exponent.bit(low as u64) {
            low += 1;
        }
        let value = (low..=i)
            .rev()
            .fold(0i64, |acc, j| (acc << 1) | i64::from(exponent.bit(j as u64)));
        digits[low as usize] = value;
        i = low - 1;
    }
    digits
}

/// Little-endian byte source for the wNAF recoder.
///
/// Holds the not yet consumed low part of the exponent in `acc`; `loaded` counts how many bit
/// positions of `acc` come from bytes already read. The remaining exponent is always
/// `acc + (unread bytes << loaded)`, so adding into `acc` may carry past `loaded` safely.
struct ByteWindow<'a> {
    bytes: &'a [u8],
    next: usize,
    acc: u128,
    loaded: usize,
}

impl<'a> ByteWindow<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            next: 0,
            acc: 0,
            loaded: 0,
        }
    }

    fn refill(&mut self) {
        while self.loaded <= 64 && self.next < self.bytes.len() {
            self.acc += u128::from(self.bytes[self.next]) << self.loaded;
            self.loaded += 8;
            self.next += 1;
        }
    }

    fn is_exhausted(&self) -> bool {
        self.acc == 0 && self.next == self.bytes.len()
    }

    fn subtract(&mut self, digit: i64) {
        if digit >= 0 {
            self.acc -= u128::from(digit.unsigned_abs());
        } else {
            self.acc += u128::from(digit.unsigned_abs());
        }
    }

    /// Length of the run of zero bits at the bottom, capped at what is loaded.
    fn zero_run(&self) -> usize {
        let trailing = self.acc.trailing_zeros() as usize;
        if self.loaded == 0 {
            trailing
        } else {
            trailing.min(self.loaded)
        }
    }

    fn shift(&mut self, amount: usize) {
        self.acc >>= amount;
        self.loaded = self.loaded.saturating_sub(amount);
    }
}

/// Width-`width` non-adjacent form of `exponent`, little-endian.
///
/// Non-zero digits are odd, bounded in magnitude by `2^(width-1)`, and any two of them are at
/// least `width` positions apart. Runs of zero bits are skipped in one step.
pub fn wnaf_digits(exponent: &BigUint, width: usize) -> Vec<i64> {
    let width = width.clamp(2, MAX_WINDOW_SIZE + 1);
    let modulus = 1i64 << width;
    let half = modulus >> 1;
    let bytes = exponent.to_bytes_le();
    let mut window = ByteWindow::new(&bytes);
    let mut digits = Vec::with_capacity(bytes.len() * 8 + 1);
    loop {
        window.refill();
        if window.is_exhausted() {
            break;
        }
        if window.acc & 1 == 1 {
            let mut digit = (window.acc & (modulus as u128 - 1)) as i64;
            if digit >= half {
                digit -= modulus;
            }
            window.subtract(digit);
            digits.push(digit);
            window.shift(1);
        } else {
            let run = window.zero_run();
            digits.extend(std::iter::repeat(0).take(run));
            window.shift(run);
        }
    }
    digits
}

fn signed(mut digits: Vec<i64>, exponent: &BigInt) -> Vec<i64> {
    if exponent.is_negative() {
        digits.iter_mut().for_each(|d| *d = -*d);
    }
    digits
}

/// Digit schedule of one term.
struct Schedule<'a, G: GroupPrimitive> {
    digits: Vec<i64>,
    precomputation: &'a SmallExponentPrecomputation<G>,
}

/// Makes sure every cached power the schedules will ask for exists before the main loop.
fn prepare<G: GroupPrimitive>(group: &G, schedules: &[Schedule<'_, G>]) -> Result<(), GroupError> {
    for schedule in schedules {
        let largest = schedule.digits.iter().copied().max().unwrap_or(0);
        let smallest = schedule.digits.iter().copied().min().unwrap_or(0);
        if largest > 0 {
            schedule
                .precomputation
                .grow(group, window_for(largest.unsigned_abs()))?;
        }
        if smallest < 0 {
            schedule
                .precomputation
                .grow_negative(group, window_for(smallest.unsigned_abs()))?;
        }
    }
    Ok(())
}

/// Shared left-to-right loop: one squaring per digit position, one group operation per
/// non-zero digit.
fn interleave<G: GroupPrimitive>(
    group: &G,
    schedules: &[Schedule<'_, G>],
) -> Result<G::Elem, GroupError> {
    prepare(group, schedules)?;
    let length = schedules.iter().map(|s| s.digits.len()).max().unwrap_or(0);
    let mut result: Option<G::Elem> = None;
    for i in (0..length).rev() {
        if let Some(r) = result.as_ref() {
            result = Some(group.square(r));
        }
        for schedule in schedules {
            let digit = schedule.digits.get(i).copied().unwrap_or(0);
            if digit == 0 {
                continue;
            }
            let power = schedule.precomputation.get(group, digit)?;
            result = Some(match result {
                None => power,
                Some(r) => group.op(&r, &power),
            });
        }
    }
    Ok(result.unwrap_or_else(|| group.neutral_element()))
}

/// `base^exponent` by the sliding-window method, using and extending `precomputation`.
pub fn sliding_window_exp<G: GroupPrimitive>(
    group: &G,
    exponent: &BigInt,
    precomputation: &SmallExponentPrecomputation<G>,
    window: usize,
) -> Result<G::Elem, GroupError> {
    let digits = signed(sliding_window_digits(exponent.magnitude(), window), exponent);
    interleave(
        group,
        &[Schedule {
            digits,
            precomputation,
        }],
    )
}

/// `base^exponent` by wNAF. A window of `w` uses digits up to `2^w - 1`, i.e. a width of
/// `w + 1`, so it needs the same table size as a sliding window of `w`.
pub fn wnaf_exp<G: GroupPrimitive>(
    group: &G,
    exponent: &BigInt,
    precomputation: &SmallExponentPrecomputation<G>,
    window: usize,
) -> Result<G::Elem, GroupError> {
    let digits = signed(wnaf_digits(exponent.magnitude(), window + 1), exponent);
    interleave(
        group,
        &[Schedule {
            digits,
            precomputation,
        }],
    )
}

/// `prod(term.base^term.exponent)` with interleaved sliding windows.
pub fn interleaved_sliding_window_multiexp<G: GroupPrimitive>(
    group: &G,
    terms: &[MultiexpTerm<G>],
    window: usize,
) -> Result<G::Elem, GroupError> {
    let schedules: Vec<_> = terms
        .iter()
        .map(|term| Schedule {
            digits: signed(
                sliding_window_digits(term.exponent().magnitude(), window),
                term.exponent(),
            ),
            precomputation: term.precomputation().as_ref(),
        })
        .collect();
    interleave(group, &schedules)
}

/// `prod(term.base^term.exponent)` with interleaved wNAF.
pub fn interleaved_wnaf_multiexp<G: GroupPrimitive>(
    group: &G,
    terms: &[MultiexpTerm<G>],
    window: usize,
) -> Result<G::Elem, GroupError> {
    let schedules: Vec<_> = terms
        .iter()
        .map(|term| Schedule {
            digits: signed(wnaf_digits(term.exponent().magnitude(), window + 1), term.exponent()),
            precomputation: term.precomputation().as_ref(),
        })
        .collect();
    interleave(group, &schedules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::additive::ResidueGroup;
    use crate::testing::{small_schnorr, CountingGroup};
    use num_bigint::BigUint;
    use num_traits::One;

    fn recompose(digits: &[i64]) -> BigInt {
        digits
            .iter()
            .rev()
            .fold(BigInt::from(0), |acc, &d| (acc << 1) + BigInt::from(d))
    }

    mod recoding {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn test_sliding_window_known_value() {
            // 0b1011_0001 with window 3: windows 101 (at bit 5) and 1 (at bit 4), then 1 at 0
            let digits = sliding_window_digits(&BigUint::from(0b1011_0001u32), 3);
            assert_eq!(digits, vec![1, 0, 0, 0, 1, 5, 0, 0]);
        }

        #[test]
        fn test_wnaf_known_value() {
            // 7 = 8 - 1 in NAF
            assert_eq!(wnaf_digits(&BigUint::from(7u8), 2), vec![-1, 0, 0, 1]);
            assert_eq!(wnaf_digits(&BigUint::from(0u8), 4), Vec::<i64>::new());
        }

        #[test]
        fn test_wnaf_carry_across_bytes() {
            // all-ones patterns force a carry out of every loaded chunk
            let value = (BigUint::one() << 200u32) - BigUint::one();
            let digits = wnaf_digits(&value, 5);
            assert_eq!(recompose(&digits), BigInt::from(value));
        }

        proptest! {
            #[test]
            fn test_sliding_window_recomposes(bytes in proptest::collection::vec(any::<u8>(), 0..48), w in 1usize..8) {
                let value = BigUint::from_bytes_le(&bytes);
                let digits = sliding_window_digits(&value, w);
                prop_assert_eq!(recompose(&digits), BigInt::from(value));
                for d in digits.into_iter().filter(|d| *d != 0) {
                    prop_assert!(d % 2 == 1 && d < (1 << w));
                }
            }

            #[test]
            fn test_wnaf_recomposes(bytes in proptest::collection::vec(any::<u8>(), 0..48), w in 2usize..9) {
                let value = BigUint::from_bytes_le(&bytes);
                let digits = wnaf_digits(&value, w);
                prop_assert_eq!(recompose(&digits), BigInt::from(value));
                let nonzero: Vec<usize> = digits
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| **d != 0)
                    .map(|(i, _)| i)
                    .collect();
                for pair in nonzero.windows(2) {
                    prop_assert!(pair[1] - pair[0] >= w);
                }
                for d in digits.into_iter().filter(|d| *d != 0) {
                    prop_assert!(d.rem_euclid(2) == 1 && d.abs() < (1 << (w - 1)));
                }
            }
        }
    }

    mod exponentiation {
        use super::*;

        #[test]
        fn test_prime_order_23_scenario() {
            let group = ResidueGroup::new(BigUint::from(23u8)).expect("valid modulus");
            let g = group.generator().expect("generator");
            let mut expected = group.neutral_element();
            for _ in 0..17 {
                expected = group.op(&expected, &g);
            }
            let x = BigInt::from(17);
            let precomputation = SmallExponentPrecomputation::new(g.clone());
            assert_eq!(square_and_multiply(&group, &g, &x), Ok(expected.clone()));
            assert_eq!(sliding_window_exp(&group, &x, &precomputation, 3), Ok(expected.clone()));
            assert_eq!(wnaf_exp(&group, &x, &precomputation, 3), Ok(expected));
        }

        #[test]
        fn test_negative_exponents() {
            let group = small_schnorr();
            let g = group.generator().expect("generator");
            let precomputation = SmallExponentPrecomputation::new(g.clone());
            for x in [-1i64, -2, -17, -1000, -123_456_789] {
                let x = BigInt::from(x);
                let expected = square_and_multiply(&group, &g, &x).expect("pow");
                assert_eq!(sliding_window_exp(&group, &x, &precomputation, 4), Ok(expected.clone()));
                assert_eq!(wnaf_exp(&group, &x, &precomputation, 4), Ok(expected));
            }
        }

        #[test]
        fn test_zero_exponent_is_neutral() {
            let group = small_schnorr();
            let g = group.generator().expect("generator");
            let precomputation = SmallExponentPrecomputation::new(g);
            let zero = BigInt::from(0);
            assert_eq!(
                sliding_window_exp(&group, &zero, &precomputation, 4),
                Ok(group.neutral_element())
            );
            assert_eq!(precomputation.window_size(), 0);
        }

        #[test]
        fn test_interleaving_shares_squarings() {
            let group = CountingGroup::new(small_schnorr());
            let g = group.generator().expect("generator");
            let h = group.op(&g, &g);
            let x = (BigInt::one() << 64u32) - BigInt::one();
            let terms = vec![
                MultiexpTerm::fresh(g.clone(), x.clone()),
                MultiexpTerm::fresh(h.clone(), x.clone()),
            ];
            for term in &terms {
                term.precomputation().grow(&group, 4).expect("grow");
            }
            group.reset();
            interleaved_sliding_window_multiexp(&group, &terms, 4).expect("multiexp");
            // sixteen 4-bit windows: 60 shared squarings, not 120
            assert_eq!(group.squares(), 60);
        }
    }
}
