//! Seeded pseudo-random generator owned by each game state.
//!
//! `xoshiro128**` with the 128-bit state seeded from a string through
//! FNV-1a and SplitMix64. The state is four `u32` words so a JSON snapshot
//! stays exact for clients whose numbers are IEEE doubles.
//!
//! There is no shared instance: every [`GameState`](crate::state::GameState)
//! owns one, and cloning the state clones the generator.

use serde::{Deserialize, Serialize};

/// Captured generator state, sufficient to resume the exact sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RngState {
    /// The seed string the generator was created from.
    pub seed: String,
    /// Internal `xoshiro128**` words.
    pub words: [u32; 4],
}

/// Deterministic generator for dice and any other randomness in the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeterministicRng {
    seed: String,
    words: [u32; 4],
}

impl DeterministicRng {
    /// Create a generator from a string seed.
    #[must_use]
    pub fn new(seed: &str) -> Self {
        let mut sm = SplitMix64 {
            state: fnv1a_64(seed.as_bytes()),
        };
        let a = sm.next();
        let b = sm.next();
        let mut words = [a as u32, (a >> 32) as u32, b as u32, (b >> 32) as u32];
        // The all-zero state is a fixed point of xoshiro.
        if words == [0; 4] {
            words[0] = 1;
        }
        Self {
            seed: seed.to_string(),
            words,
        }
    }

    /// Restore a generator from a previously captured state.
    #[must_use]
    pub fn from_state(state: RngState) -> Self {
        let mut words = state.words;
        if words == [0; 4] {
            words[0] = 1;
        }
        Self {
            seed: state.seed,
            words,
        }
    }

    /// Capture the seed and internal state.
    #[must_use]
    pub fn get_state(&self) -> RngState {
        RngState {
            seed: self.seed.clone(),
            words: self.words,
        }
    }

    /// The seed string this generator was created from.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let s = &mut self.words;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 9;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;
        s[3] = s[3].rotate_left(11);

        result
    }

    /// Uniform float in `[0, 1)` with 53 bits of precision.
    pub fn next(&mut self) -> f64 {
        let hi = u64::from(self.next_u32() >> 5);
        let lo = u64::from(self.next_u32() >> 6);
        ((hi << 26) | lo) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[min, max)`.
    ///
    /// Returns `min` when the range is empty.
    pub fn next_int_exclusive(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min) as f64;
        min + (self.next() * span).floor() as i64
    }

    /// Roll one six-sided die.
    pub fn roll_die(&mut self) -> u8 {
        self.next_int_exclusive(1, 7) as u8
    }
}

struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
