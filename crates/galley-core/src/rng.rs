//! Deterministic PRNG for simulation use (NPC order selection).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable.

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, so a fixed seed plus a fixed request
/// trace replays the same service every time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..n`. Returns 0 when `n == 0`.
    ///
    /// Uses the multiply-shift reduction, which avoids modulo bias without
    /// a rejection loop.
    pub fn uniform_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let r = self.next_u64();
        ((r as u128 * n as u128) >> 64) as usize
    }

    /// Get the internal state (for hashing).
    pub fn state(&self) -> u64 {
        self.state
    }
}
