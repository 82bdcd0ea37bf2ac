//
// Copyright (c) 2023 Daniel Ottavio
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE
//
//! A random number generator running GOST 28147-89 in feedback mode.
//!
//! The generator is implemented via the [`QualityRng`] type. This type
//! may be instantiated using the builder class [`RngBuilder`].
//!
use crate::{
    entropy::Entropy,
    error::Error,
    gost::{Gost, SyncVector, FIXED_SEED},
    quality,
    weak::WeakRng,
};

/// Bytes in the generator buffer.
pub const BUFFER_LEN: usize = quality::SAMPLE_BITS / 8;

/// Checksum of the fixed-seed self-check.
pub const INTEGRITY_CHECKSUM: u64 = 0xA5DC_0000_7F6B;

/// Default limit of consecutive rejected buffers.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1 << 10;

const CHECK_SYNC: u64 = 10_781;
const CHECK_DRAWS: usize = 100;
const CHECK_MOD: u32 = 65_535;

/// Random number generator built on [`Gost`] in cipher feedback mode.
///
/// Random data is produced a buffer of [`BUFFER_LEN`] bytes at a time by
/// encrypting fresh entropy under the running sync vector. A buffer is
/// handed out only after it passes the monobit, poker and runs tests;
/// otherwise it is discarded and generated again.
///
/// # Example
///
/// ```
/// use crypton::{rng::RngBuilder, entropy::OsEntropy};
///
/// # use crypton::error::Error;
/// #
/// # fn main() -> Result<(), Error> {
/// #
/// // Build a new instance. This runs the self-check.
/// let mut rng = RngBuilder::new(OsEntropy::default()).build()?;
///
/// // Generate random data
/// let mut random_data = [0u8; 32];
/// rng.fill_bytes(&mut random_data)?;
/// let n = rng.next_u64()?;
/// # let _ = n;
///
/// // Fresh key, table and sync vector
/// rng.reseed()?;
/// #
/// # Ok(())
/// # }
/// ```
pub struct QualityRng<E> {
    gost: Gost,
    weak: WeakRng,
    sync: SyncVector,
    buf: [u8; BUFFER_LEN],
    pos: usize,
    seeded: bool,
    max_attempts: u32,
    entropy: E,
}

/// Builder class for allocating `QualityRng` instances.
///
/// # Example
/// ```
/// use crypton::{rng::RngBuilder, entropy::OsEntropy};
///
/// # use crypton::error::Error;
/// #
/// # fn main() -> Result<(), Error> {
/// #
/// let mut rng = RngBuilder::new(OsEntropy::default())
///     .max_attempts(64)
///     .build()?;
/// #
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RngBuilder<E> {
    weak_seed: Option<u32>,
    max_attempts: u32,
    entropy: E,
}

/// Compare a self-check result against [`INTEGRITY_CHECKSUM`].
fn check_integrity(actual: u64) -> Result<(), Error> {
    if actual != INTEGRITY_CHECKSUM {
        tracing::error!(
            expected = INTEGRITY_CHECKSUM,
            actual,
            "generator self-check failed"
        );
        return Err(Error::IntegrityFailure {
            expected: INTEGRITY_CHECKSUM,
            actual,
        });
    }
    Ok(())
}

impl<E> RngBuilder<E>
where
    E: Entropy,
{
    pub fn new(entropy: E) -> Self {
        Self {
            weak_seed: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            entropy,
        }
    }

    /// Seed of the weak generator that draws the working key and table
    /// and the lower half of the initial sync vector.
    ///
    /// By default, this is the current time in seconds with the `std`
    /// feature, and a word read from the `Entropy` source without it.
    pub fn weak_seed(mut self, seed: u32) -> RngBuilder<E> {
        self.weak_seed = Some(seed);
        self
    }

    /// Limit on consecutive rejected buffers (and rejected initial sync
    /// vectors) before giving up with
    /// [`Error::QualityGateExhausted`].
    ///
    /// By default, this value is [`DEFAULT_MAX_ATTEMPTS`].
    ///
    /// # Panics
    ///
    /// This function panics if `attempts` is zero.
    pub fn max_attempts(mut self, attempts: u32) -> RngBuilder<E> {
        if attempts == 0 {
            panic!("QualityRng: max attempts must be positive")
        }
        self.max_attempts = attempts;
        self
    }

    /// Build and return a new [`QualityRng`] instance.
    ///
    /// The fixed-seed self-check runs first. The engine is then keyed
    /// from the weak seed, the sync vector is seeded and the first buffer
    /// is generated from the `Entropy` source.
    ///
    /// # Error
    ///
    /// Returns [`Error::IntegrityFailure`] if the self-check fails,
    /// [`Error::Entropy`] if the entropy source cannot be read, and
    /// [`Error::QualityGateExhausted`] if seeding keeps failing its tests.
    pub fn build(self) -> Result<QualityRng<E>, Error> {
        let mut rng = QualityRng::new(self.entropy, self.max_attempts);
        check_integrity(rng.checksum()?)?;
        let seed = match self.weak_seed {
            Some(seed) => seed,
            None => rng.default_weak_seed()?,
        };
        rng.seed(seed)?;
        tracing::info!("generator initialized");
        Ok(rng)
    }
}

impl<E> QualityRng<E>
where
    E: Entropy,
{
    /// Next random byte.
    ///
    /// # Error
    ///
    /// Returns an error when the buffer is exhausted and cannot be
    /// regenerated.
    pub fn next_u8(&mut self) -> Result<u8, Error> {
        if self.pos == BUFFER_LEN {
            self.refill()?;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Next four bytes, little-endian.
    pub fn next_u32(&mut self) -> Result<u32, Error> {
        let mut word = [0u8; 4];
        self.fill_bytes(&mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Next eight bytes, little-endian.
    pub fn next_u64(&mut self) -> Result<u64, Error> {
        let mut word = [0u8; 8];
        self.fill_bytes(&mut word)?;
        Ok(u64::from_le_bytes(word))
    }

    /// Fill the slice `bytes` with random data, regenerating the buffer
    /// as often as needed.
    ///
    /// # Error
    ///
    /// Returns an error when there is a problem reading from the
    /// entropy source or a buffer keeps failing the quality tests.
    pub fn fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        while filled < bytes.len() {
            if self.pos == BUFFER_LEN {
                self.refill()?;
            }
            let n = (bytes.len() - filled).min(BUFFER_LEN - self.pos);
            bytes[filled..filled + n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            filled += n;
        }
        Ok(())
    }

    /// Rekey from a weak seed read from the entropy source, seed a new
    /// sync vector and discard the current buffer.
    ///
    /// # Error
    ///
    /// Returns an error when there is a problem reading from the
    /// entropy source or seeding keeps failing the quality tests.
    /// If no new sync vector could be seeded, the previous key, sync
    /// vector and buffer stay in use. If only the first buffer under the
    /// new key fails, the buffer is left empty and the next draw
    /// regenerates it.
    pub fn reseed(&mut self) -> Result<(), Error> {
        let seed = self.entropy.next_u32()?;
        self.seed(seed)
    }

    fn new(entropy: E, max_attempts: u32) -> Self {
        Self {
            gost: Gost::new(),
            weak: WeakRng::new(FIXED_SEED),
            sync: SyncVector::default(),
            buf: [0u8; BUFFER_LEN],
            pos: BUFFER_LEN,
            seeded: false,
            max_attempts,
            entropy,
        }
    }

    #[cfg(feature = "std")]
    fn default_weak_seed(&mut self) -> Result<u32, Error> {
        Ok(crate::weak::clock_seed())
    }

    #[cfg(not(feature = "std"))]
    fn default_weak_seed(&mut self) -> Result<u32, Error> {
        Ok(self.entropy.next_u32()?)
    }

    /// Run the generator from the fixed key schedule on weak input only
    /// and fold 100 outputs into a Fletcher-style checksum.
    ///
    /// The first buffer is encrypted and then thrown away: the cursor is
    /// left at the end, so the draws go through a regular quality-gated
    /// refill.
    fn checksum(&mut self) -> Result<u64, Error> {
        self.weak.reseed(FIXED_SEED);
        self.gost.init(&mut self.weak);
        self.seeded = false;
        self.sync = SyncVector(CHECK_SYNC);
        self.weak.fill_words(&mut self.buf);
        self.sync = self.gost.encrypt_feedback(&mut self.buf, self.sync);
        self.pos = BUFFER_LEN;

        let (mut s0, mut s1) = (0u32, 0u32);
        for _ in 0..CHECK_DRAWS {
            s0 = s0.wrapping_add(self.next_u32()?) % CHECK_MOD;
            s1 = (s1 + s0) % CHECK_MOD;
        }
        Ok(s0 as u64 | ((CHECK_MOD - s1) as u64) << 32)
    }

    /// The new key and sync vector replace the current ones only once both
    /// exist; until then the generator keeps serving its current buffer.
    fn seed(&mut self, weak_seed: u32) -> Result<(), Error> {
        self.weak.reseed(weak_seed);
        let mut gost = Gost::new();
        gost.init(&mut self.weak);
        let sync = self.seed_sync(&gost)?;
        self.gost = gost;
        self.sync = sync;
        self.seeded = true;
        self.refill()
    }

    /// Weak low half, strong high half, one block encryption under `gost`.
    /// Retried until the set and unset bits are balanced.
    fn seed_sync(&mut self, gost: &Gost) -> Result<SyncVector, Error> {
        for attempt in 1..=self.max_attempts {
            let low = self.weak.next();
            let high = self.entropy.next_u32()?;
            let sync = gost.encrypt_u64(SyncVector::from_halves(low, high).0);
            if quality::sync_balanced(sync) {
                return Ok(SyncVector(sync));
            }
            tracing::debug!(attempt, "unbalanced sync vector rejected");
        }
        Err(Error::QualityGateExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Regenerate the whole buffer until it passes the quality tests.
    /// Plaintext comes from the weak generator until seeding completes
    /// and from the entropy source afterwards.
    fn refill(&mut self) -> Result<(), Error> {
        self.pos = BUFFER_LEN;
        for attempt in 1..=self.max_attempts {
            if self.seeded {
                self.entropy.fill_bytes(&mut self.buf)?;
            } else {
                self.weak.fill_words(&mut self.buf);
            }
            self.sync = self.gost.encrypt_feedback(&mut self.buf, self.sync);
            if quality::accept(&self.buf) {
                tracing::trace!(attempt, seeded = self.seeded, "buffer regenerated");
                self.pos = 0;
                return Ok(());
            }
            tracing::debug!(attempt, "buffer rejected by quality tests");
        }
        Err(Error::QualityGateExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl<E: Entropy> rand_core::TryCryptoRng for QualityRng<E> {}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl<E: Entropy> rand_core::TryRngCore for QualityRng<E> {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        self.next_u32()
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        self.next_u64()
    }

    fn try_fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.fill_bytes(bytes)
    }
}
