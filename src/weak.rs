// SPDX-License-Identifier: MIT

//! A weak, reseedable generator used only for internal seeding.
//!
//! [`WeakRng`] reproduces the additive lagged-Fibonacci generator behind
//! the C library `random()`/`srandom()` pair (degree 31, separation 3),
//! output for output. The cipher key and substitution table are drawn
//! from it, as is the plaintext of the self-check, so the integrity
//! checksum of [`QualityRng`](crate::rng::QualityRng) only holds if this
//! generator is bit-exact.
//!
//! It is not a source of entropy. Every value it yields is a function of
//! the 32-bit seed.

const DEGREE: usize = 31;
const SEPARATION: usize = 3;
const WARMUP: usize = DEGREE * 10;

/// Additive-feedback generator, seeded explicitly.
#[derive(Clone, Debug)]
pub struct WeakRng {
    state: [u32; DEGREE],
    front: usize,
    rear: usize,
}

impl WeakRng {
    /// Create a generator seeded with `seed`. A zero seed behaves as 1.
    pub fn new(seed: u32) -> Self {
        let mut rng = Self {
            state: [0; DEGREE],
            front: SEPARATION,
            rear: 0,
        };
        rng.reseed(seed);
        rng
    }

    /// Create a generator seeded with the current wall-clock second.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn from_clock() -> Self {
        Self::new(clock_seed())
    }

    /// Restart the sequence from `seed`.
    pub fn reseed(&mut self, seed: u32) {
        let seed = if seed == 0 { 1 } else { seed };
        self.state[0] = seed;
        // Park-Miller minimal standard step, via Schrage's method.
        let mut word = seed as i32 as i64;
        for i in 1..DEGREE {
            let hi = word / 127_773;
            let lo = word % 127_773;
            word = 16_807 * lo - 2_836 * hi;
            if word < 0 {
                word += 2_147_483_647;
            }
            self.state[i] = word as u32;
        }
        self.front = SEPARATION;
        self.rear = 0;
        for _ in 0..WARMUP {
            self.next();
        }
    }

    /// Next 31-bit output.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u32 {
        let val = self.state[self.front].wrapping_add(self.state[self.rear]);
        self.state[self.front] = val;
        self.front = (self.front + 1) % DEGREE;
        self.rear = (self.rear + 1) % DEGREE;
        val >> 1
    }

    /// Fill `bytes` with successive outputs, each stored as a
    /// little-endian 32-bit word. `bytes.len()` must be a multiple of 4.
    pub(crate) fn fill_words(&mut self, bytes: &mut [u8]) {
        debug_assert_eq!(bytes.len() % 4, 0);
        for word in bytes.chunks_exact_mut(4) {
            word.copy_from_slice(&self.next().to_le_bytes());
        }
    }
}

/// Seconds since the Unix epoch, truncated to 32 bits.
#[cfg(feature = "std")]
pub(crate) fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
