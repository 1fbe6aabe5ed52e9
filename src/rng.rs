//! Deterministic random number generation
//!
//! Every model owns its own generator. Generators are forked from a master seed
//! by stream name, so the same seed always hands the same sequence to the same
//! model no matter in which order the models are built.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generator type owned by the environment and mission models.
pub type SimRng = ChaCha8Rng;

pub struct RngManager {
    master_seed: u64,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive an independent generator for the named stream.
    pub fn fork(&self, name: &str) -> SimRng {
        ChaCha8Rng::seed_from_u64(self.derive_seed(name))
    }

    fn derive_seed(&self, name: &str) -> u64 {
        // FNV-1a over the stream name, then mixed with the master seed
        let mut name_hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in name.bytes() {
            name_hash ^= byte as u64;
            name_hash = name_hash.wrapping_mul(0x0100_0000_01b3);
        }
        let mut seed = self.master_seed;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= name_hash;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed
    }
}

impl Default for RngManager {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Helpers for the bounded uniform noise used across the models.
pub trait RngExt {
    /// Uniform sample in `[min, max)`; returns `min` when the range is empty.
    fn uniform(&mut self, min: f64, max: f64) -> f64;
    fn chance(&mut self, probability: f64) -> bool;
}

impl<R: Rng> RngExt for R {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.gen_range(min..max)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }
}
