//! Deterministic hashing and pseudo-random numbers.
//!
//! Two tools live here. The stateless hashes (`hash_u64`, `hash01`,
//! `hash_signed`) turn any seed into a well-mixed value with no hidden
//! state, which is what builder scripts use to key randomness on a repeat
//! index. [`Xorshift64`] is a seedable stream for places that need many
//! values in sequence, such as scattering particles at creation.
//!
//! Everything is pure integer arithmetic at the core, so results are
//! identical across platforms.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// SplitMix64 finalizer: full 64-bit avalanche of `x`.
pub fn hash_u64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mixes two values into one hash. Order matters.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    hash_u64(a ^ hash_u64(b).rotate_left(17))
}

/// Maps the upper 53 bits of a hash to [0, 1).
fn unit_from_bits(h: u64) -> f64 {
    (h >> 11) as f64 / (1u64 << 53) as f64
}

/// Hashes a float seed to a value in [0, 1).
///
/// `0.0` and `-0.0` hash identically so that progress values computed as
/// `-x * 0.0` do not fork a sequence.
pub fn hash01(seed: f64) -> f64 {
    let bits = if seed == 0.0 { 0 } else { seed.to_bits() };
    unit_from_bits(hash_u64(bits))
}

/// Hashes a float seed to a value in [-1, 1).
pub fn hash_signed(seed: f64) -> f64 {
    hash01(seed) * 2.0 - 1.0
}

/// Hashes an integer key pair to [0, 1).
pub fn hash01_pair(a: u64, b: u64) -> f64 {
    unit_from_bits(hash_combine(a, b))
}

/// Xorshift64 deterministic PRNG. Same seed always produces the same sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Replacement for seed 0, the xorshift fixed point.
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Creates a new PRNG with the given seed. A zero seed uses a fixed
    /// non-zero fallback.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Creates a PRNG whose state is derived from two keys, e.g. a scene
    /// seed and a group index.
    pub fn keyed(seed: u64, key: u64) -> Self {
        Self::new(hash_combine(seed, key))
    }

    /// Advances the state with shifts (13, 7, 17) and returns it.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        unit_from_bits(self.next_u64())
    }

    /// Uniform f64 in [-1, 1).
    pub fn next_signed(&mut self) -> f64 {
        self.next_f64() * 2.0 - 1.0
    }

    /// Uniform f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform usize in [0, max).
    ///
    /// # Panics
    ///
    /// Panics if `max` is 0.
    pub fn next_usize(&mut self, max: usize) -> usize {
        (self.next_u64() as usize) % max
    }

    /// Uniform point inside the axis-aligned rectangle `[min, max)`.
    pub fn next_in_rect(&mut self, min: DVec2, max: DVec2) -> DVec2 {
        DVec2::new(self.next_range(min.x, max.x), self.next_range(min.y, max.y))
    }
}
