//! Deterministic random number generation.
//!
//! Games are reproducible from their seed. `fork()` produces an independent
//! but deterministic stream so a cloned state can be simulated without
//! disturbing the original game.
//!
//! ```
//! use rust_lore::core::GameRng;
//!
//! let mut a = GameRng::new(7);
//! let mut b = GameRng::new(7);
//! let mut deck_a = vec![1, 2, 3, 4, 5, 6];
//! let mut deck_b = deck_a.clone();
//! a.shuffle(&mut deck_a);
//! b.shuffle(&mut deck_b);
//! assert_eq!(deck_a, deck_b);
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded ChaCha8 RNG with forking.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork an independent stream.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forks_are_deterministic() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        let mut fa = a.fork();
        let mut fb = b.fork();

        let mut xs: Vec<u32> = (0..20).collect();
        let mut ys = xs.clone();
        fa.shuffle(&mut xs);
        fb.shuffle(&mut ys);
        assert_eq!(xs, ys);
        assert_ne!(fa.seed(), a.seed());
    }

    #[test]
    fn test_shuffle_permutes() {
        let mut rng = GameRng::new(3);
        let before: Vec<u32> = (0..20).collect();
        let mut after = before.clone();
        rng.shuffle(&mut after);
        assert_ne!(before, after);

        after.sort_unstable();
        assert_eq!(before, after);
    }
}
