//! Randomness seam.
//!
//! Every random decision the eater makes (timer jitter, infection dice,
//! self-cure, its rock-paper-scissors sign) goes through a
//! [`RandomSource`], so tests can pin the outcome.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniformly distributed random numbers.
pub trait RandomSource: Send + Sync {
    /// A uniformly random `u64`.
    fn next_u64(&self) -> u64;

    /// A fair coin.
    fn coin_flip(&self) -> bool {
        self.next_u64() & 1 == 1
    }

    /// A value in `0..bound`, or `0` when `bound` is zero.
    fn below(&self, bound: u64) -> u64 {
        self.next_u64().checked_rem(bound).unwrap_or(0)
    }
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_u64(&self) -> u64 {
        rand::rng().random()
    }
}

/// A reproducible generator.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_u64(&self) -> u64 {
        self.rng.lock().random()
    }
}

/// Always returns the same value.
///
/// `FixedRandom(0)` disables jitter and makes every coin land "no";
/// `FixedRandom(1)` makes every coin land "yes".
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRandom(pub u64);

impl RandomSource for FixedRandom {
    fn next_u64(&self) -> u64 {
        self.0
    }
}

/// Spread `value` by up to `pct` percent in either direction.
pub fn deviate(random: &dyn RandomSource, value: u64, pct: u32) -> u64 {
    let range = value
        .saturating_mul(u64::from(pct.min(100)))
        .checked_div(100)
        .unwrap_or(0);
    if range == 0 {
        return value;
    }
    let delta = random.below(range);
    if random.coin_flip() {
        value.saturating_add(delta)
    } else {
        value.saturating_sub(delta)
    }
}

/// Jitter a duration by up to `pct` percent, at millisecond resolution.
pub fn jittered(random: &dyn RandomSource, base: Duration, pct: u32) -> Duration {
    let millis = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(deviate(random, millis, pct))
}
