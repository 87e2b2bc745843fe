//! Injectable randomness for the price walk and demand jitter.
//!
//! All randomness in a turn flows through a [`RandomSource`], so a seeded
//! source replays a game exactly and tests can switch noise off entirely
//! with [`NoJitter`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Precision of sampled noise: four decimal places.
const JITTER_SCALE: u32 = 4;
/// `10^JITTER_SCALE`.
const JITTER_UNITS: i64 = 10_000;

/// Source of bounded noise.
pub trait RandomSource: core::fmt::Debug {
    /// Uniform value in `[-amplitude, amplitude]`.
    ///
    /// A zero or negative amplitude yields zero.
    fn jitter(&mut self, amplitude: Decimal) -> Decimal;
}

/// Reproducible noise from a seeded standard RNG.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create a source from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn jitter(&mut self, amplitude: Decimal) -> Decimal {
        if amplitude <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        // Sample whole units of 10^-4 so the result is an exact decimal.
        let bound = amplitude
            .checked_mul(Decimal::from(JITTER_UNITS))
            .and_then(|v| v.trunc().to_i64())
            .unwrap_or(i64::MAX);
        if bound == 0 {
            return Decimal::ZERO;
        }
        let step: i64 = self.rng.random_range(-bound..=bound);
        Decimal::new(step, JITTER_SCALE)
    }
}

/// A source that never adds noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl RandomSource for NoJitter {
    fn jitter(&mut self, _amplitude: Decimal) -> Decimal {
        Decimal::ZERO
    }
}
