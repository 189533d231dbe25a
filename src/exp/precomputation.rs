//! Per-base tables of small odd powers.
//!
//! The table for a base `b` is split into chunks by bit length: chunk `w` holds the odd powers
//! `b^k` with `2^(w-1) <= k < 2^w`, so a table of window size `w` holds every odd power up to
//! `b^(2^w - 1)`. Chunks are written once, in order, under the growth lock, and are read
//! without locking afterwards. Nothing is ever removed, so a table can live as long as its base.
//!
//! Negative odd powers live in a mirrored set of chunks that is only built when some
//! exponentiation actually needs them.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::exp::inversion_is_cheap;
use crate::groups::group::{GroupError, GroupPrimitive};
use crate::utils::lock;

/// Largest supported window size; a full table of this size holds 2^23 odd powers.
pub const MAX_WINDOW_SIZE: usize = 24;

/// Number of bits needed for `k`, i.e. the window size whose table contains `b^k`.
pub(crate) fn window_for(k: u64) -> usize {
    (u64::BITS - k.leading_zeros()) as usize
}

fn chunk_index(k: u64, window: usize) -> usize {
    if window == 1 {
        0
    } else {
        ((k - (1 << (window - 1)) - 1) / 2) as usize
    }
}

/// Monotonically growing cache of `base^k` for small odd `k`, shared between exponentiations.
pub struct SmallExponentPrecomputation<G: GroupPrimitive> {
    base: G::Elem,
    square: OnceLock<G::Elem>,
    inverse: OnceLock<G::Elem>,
    positive: Vec<OnceLock<Vec<G::Elem>>>,
    negative: Vec<OnceLock<Vec<G::Elem>>>,
    positive_window: AtomicUsize,
    negative_window: AtomicUsize,
    growth: Mutex<()>,
}

impl<G: GroupPrimitive> SmallExponentPrecomputation<G> {
    pub fn new(base: G::Elem) -> Self {
        Self {
            base,
            square: OnceLock::new(),
            inverse: OnceLock::new(),
            positive: (0..=MAX_WINDOW_SIZE).map(|_| OnceLock::new()).collect(),
            negative: (0..=MAX_WINDOW_SIZE).map(|_| OnceLock::new()).collect(),
            positive_window: AtomicUsize::new(0),
            negative_window: AtomicUsize::new(0),
            growth: Mutex::new(()),
        }
    }

    pub fn base(&self) -> &G::Elem {
        &self.base
    }

    /// Largest window size the positive table currently supports.
    pub fn window_size(&self) -> usize {
        self.positive_window.load(Ordering::Acquire)
    }

    /// Largest window size the negative table currently supports.
    pub fn negative_window_size(&self) -> usize {
        self.negative_window.load(Ordering::Acquire)
    }

    /// Cached `base^k` for odd `k`, without growing the table.
    pub fn odd_power(&self, k: u64) -> Option<&G::Elem> {
        Self::lookup(&self.positive, k)
    }

    /// Cached `base^(-k)` for odd `k`, without growing the table.
    pub fn negative_odd_power(&self, k: u64) -> Option<&G::Elem> {
        Self::lookup(&self.negative, k)
    }

    fn lookup(chunks: &[OnceLock<Vec<G::Elem>>], k: u64) -> Option<&G::Elem> {
        if k % 2 == 0 {
            return None;
        }
        let window = window_for(k);
        chunks
            .get(window)?
            .get()
            .and_then(|chunk| chunk.get(chunk_index(k, window)))
    }

    /// Grow the positive table to `window`. Requests at or below the current size are no-ops.
    pub fn grow(&self, group: &G, window: usize) -> Result<(), GroupError> {
        if window > MAX_WINDOW_SIZE {
            return Err(GroupError::IllegalArgument("window size too large"));
        }
        if self.window_size() >= window {
            return Ok(());
        }
        let _guard = lock(&self.growth);
        let current = self.window_size();
        if current >= window {
            return Ok(());
        }
        let square = self
            .square
            .get_or_init(|| group.square(&self.base))
            .clone();
        self.extend_chunks(&self.positive, &self.positive_window, current, window, |w, prev| {
            if w == 1 {
                return Ok(vec![self.base.clone()]);
            }
            let mut acc = prev.clone();
            let mut chunk = Vec::with_capacity(1 << (w - 2));
            for _ in 0..(1usize << (w - 2)) {
                acc = group.op(&acc, &square);
                chunk.push(acc.clone());
            }
            Ok(chunk)
        })?;
        tracing::debug!(from = current, to = window, "SmallExponentPrecomputation::grow");
        Ok(())
    }

    /// Grow the negative table to `window`.
    ///
    /// When inversion is cheap every cached positive power is inverted; otherwise the base is
    /// inverted once and the odd powers of the inverse are built with group operations.
    pub fn grow_negative(&self, group: &G, window: usize) -> Result<(), GroupError> {
        if window > MAX_WINDOW_SIZE {
            return Err(GroupError::IllegalArgument("window size too large"));
        }
        if self.negative_window_size() >= window {
            return Ok(());
        }
        let cheap = inversion_is_cheap(group);
        if cheap {
            self.grow(group, window)?;
        }
        let _guard = lock(&self.growth);
        let current = self.negative_window_size();
        if current >= window {
            return Ok(());
        }
        if cheap {
            self.extend_chunks(&self.negative, &self.negative_window, current, window, |w, _| {
                self.positive[w]
                    .get()
                    .into_iter()
                    .flatten()
                    .map(|power| group.inv(power))
                    .collect()
            })?;
        } else {
            let inverse = match self.inverse.get() {
                Some(inverse) => inverse.clone(),
                None => {
                    let inverse = group.inv(&self.base)?;
                    self.inverse.get_or_init(|| inverse).clone()
                }
            };
            let inverse_square = group.square(&inverse);
            self.extend_chunks(&self.negative, &self.negative_window, current, window, |w, prev| {
                if w == 1 {
                    return Ok(vec![inverse.clone()]);
                }
                let mut acc = prev.clone();
                let mut chunk = Vec::with_capacity(1 << (w - 2));
                for _ in 0..(1usize << (w - 2)) {
                    acc = group.op(&acc, &inverse_square);
                    chunk.push(acc.clone());
                }
                Ok(chunk)
            })?;
        }
        tracing::debug!(
            from = current,
            to = window,
            cheap,
            "SmallExponentPrecomputation::grow_negative"
        );
        Ok(())
    }

    /// Fill chunks `current + 1 ..= window`. `build` receives the window and the largest power
    /// of the previous chunk. Caller holds the growth lock.
    fn extend_chunks<F>(
        &self,
        chunks: &[OnceLock<Vec<G::Elem>>],
        size: &AtomicUsize,
        current: usize,
        window: usize,
        mut build: F,
    ) -> Result<(), GroupError>
    where
        F: FnMut(usize, &G::Elem) -> Result<Vec<G::Elem>, GroupError>,
    {
        for w in current + 1..=window {
            let chunk = {
                let prev = chunks[w - 1].get().and_then(|chunk| chunk.last());
                build(w, prev.unwrap_or(&self.base))?
            };
            // only ever written here, under the growth lock
            let _ = chunks[w].set(chunk);
            size.store(w, Ordering::Release);
        }
        Ok(())
    }

    /// `base^k` for any `k` whose magnitude fits in [`MAX_WINDOW_SIZE`] bits, growing the
    /// tables on demand.
    pub fn get(&self, group: &G, k: i64) -> Result<G::Elem, GroupError> {
        let magnitude = k.unsigned_abs();
        match k {
            0 => Ok(group.neutral_element()),
            k if k > 0 && k % 2 == 0 => Ok(group.op(&self.get(group, k - 1)?, &self.base)),
            k if k > 0 => {
                self.grow(group, window_for(magnitude))?;
                self.odd_power(magnitude)
                    .cloned()
                    .ok_or(GroupError::IllegalArgument("exponent outside precomputation"))
            }
            k if k % 2 == 0 => Ok(group.op(&self.get(group, k + 1)?, &self.get(group, -1)?)),
            _ => {
                self.grow_negative(group, window_for(magnitude))?;
                self.negative_odd_power(magnitude)
                    .cloned()
                    .ok_or(GroupError::IllegalArgument("exponent outside precomputation"))
            }
        }
    }
}

impl<G: GroupPrimitive> Debug for SmallExponentPrecomputation<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmallExponentPrecomputation")
            .field("base", &self.base)
            .field("window_size", &self.window_size())
            .field("negative_window_size", &self.negative_window_size())
            .finish()
    }
}
