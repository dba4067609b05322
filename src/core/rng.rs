//! Seeded move choice for the random agent and the random default-move
//! policy.
//!
//! A match holds one `GameRng` and forks it once per ply; a random agent
//! derives its own stream from its seed and role name. Either way the same
//! seed replays the same choices.
//!
//! ```
//! use rust_ggp::core::GameRng;
//!
//! let moves = ["a", "b", "c", "d"];
//! let mut white = GameRng::new(42).for_context("white");
//! let mut again = GameRng::new(42).for_context("white");
//! assert_eq!(white.choose(&moves), again.choose(&moves));
//! ```

use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;

const FORK_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic chooser backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    forks: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            forks: 0,
        }
    }

    /// The next per-ply stream. The n-th fork of a seed is always the same.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.forks += 1;
        Self::new(self.seed.wrapping_add(self.forks.wrapping_mul(FORK_STRIDE)))
    }

    /// A stream for a named context, usually a role.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Pick one element, `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }
}
