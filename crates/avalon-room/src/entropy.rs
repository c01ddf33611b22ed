//! Randomness sources for room numbers, role deals and leader draws.
//!
//! The pool never calls `rand` directly; it goes through [`Entropy`] so
//! that a failing generator turns into a clean rejection instead of a
//! panic, and so tests can pin the draws.

use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng, TryRngCore};

use crate::EntropyError;

/// A source of uniform draws.
pub trait Entropy: Send + Sync + 'static {
    /// Returns a uniformly distributed value in `[0, bound)`.
    ///
    /// # Errors
    /// [`EntropyError::EmptyRange`] when `bound` is 0, or
    /// [`EntropyError::Source`] when the generator fails.
    fn pick(&self, bound: usize) -> Result<usize, EntropyError>;
}

/// Draws from the operating system's generator.
///
/// This is the production source. Failures of the OS generator are
/// surfaced, not retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    fn pick(&self, bound: usize) -> Result<usize, EntropyError> {
        if bound == 0 {
            return Err(EntropyError::EmptyRange);
        }
        let bound = bound as u64;
        // Largest value whose acceptance keeps every residue equally likely.
        let zone = u64::MAX - (u64::MAX - bound + 1) % bound;
        let mut rng = OsRng;
        loop {
            let value = rng
                .try_next_u64()
                .map_err(|e| EntropyError::Source(e.to_string()))?;
            if value <= zone {
                return Ok((value % bound) as usize);
            }
        }
    }
}

/// A reproducible source seeded from a `u64`.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Entropy for SeededEntropy {
    fn pick(&self, bound: usize) -> Result<usize, EntropyError> {
        if bound == 0 {
            return Err(EntropyError::EmptyRange);
        }
        Ok(self.rng.lock().random_range(0..bound))
    }
}

impl<E: Entropy> Entropy for std::sync::Arc<E> {
    fn pick(&self, bound: usize) -> Result<usize, EntropyError> {
        (**self).pick(bound)
    }
}
