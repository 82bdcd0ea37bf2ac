// SPDX-License-Identifier: MIT

//! A thread-local interface for the quality-gated generator.
use crate::{
    entropy::OsEntropy,
    error::Error,
    rng::{QualityRng, RngBuilder},
};

use std::{cell::RefCell, rc::Rc, thread_local};

#[cfg(feature = "rand_core")]
use rand_core::{TryCryptoRng, TryRngCore};

/// A thread-local instance of [`QualityRng`].
///
/// A call to [`LocalRng::default()`] returns a handle to a thread-local
/// slot. The generator in it is built on first use with the default
/// [`RngBuilder`] configuration:
///
/// - [`OsEntropy`] as entropy source.
///
/// - The wall clock as weak seed.
///
/// - Up to 1024 attempts per buffer refill.
///
/// A failed build, including a failed self-check, is reported by the
/// call that triggered it and retried on the next call.
///
/// # Example
///
/// ```
/// # use crypton::error::Error;
/// use crypton::thread::LocalRng;
///
/// # fn main() -> Result<(),Error> {
/// let rng = LocalRng::default();
/// let mut random_data = [0u8; 32];
/// rng.fill_bytes(&mut random_data)?;
/// # Ok(())
/// # }
/// ```
pub struct LocalRng {
    rng: Rc<RefCell<Option<QualityRng<OsEntropy>>>>,
}

thread_local!(
    static LOCAL_RNG: Rc<RefCell<Option<QualityRng<OsEntropy>>>> = Rc::new(RefCell::new(None))
);

impl Default for LocalRng {
    fn default() -> Self {
        Self {
            rng: LOCAL_RNG.with(|v| v.clone()),
        }
    }
}

impl LocalRng {
    /// See [`fill_bytes`](crate::rng::QualityRng::fill_bytes) for details.
    pub fn fill_bytes(&self, bytes: &mut [u8]) -> Result<(), Error> {
        self.with(|rng| rng.fill_bytes(bytes))
    }

    /// See [`next_u32`](crate::rng::QualityRng::next_u32) for details.
    pub fn next_u32(&self) -> Result<u32, Error> {
        self.with(|rng| rng.next_u32())
    }

    /// See [`next_u64`](crate::rng::QualityRng::next_u64) for details.
    pub fn next_u64(&self) -> Result<u64, Error> {
        self.with(|rng| rng.next_u64())
    }

    /// See [`reseed`](crate::rng::QualityRng::reseed) for details.
    pub fn reseed(&self) -> Result<(), Error> {
        self.with(|rng| rng.reseed())
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&mut QualityRng<OsEntropy>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut slot = self.rng.borrow_mut();
        let rng = match slot.take() {
            Some(rng) => rng,
            None => RngBuilder::new(OsEntropy::default()).build()?,
        };
        f(slot.insert(rng))
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl TryCryptoRng for LocalRng where LocalRng: TryRngCore {}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl TryRngCore for LocalRng {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        LocalRng::next_u32(self)
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        LocalRng::next_u64(self)
    }

    fn try_fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), Self::Error> {
        LocalRng::fill_bytes(self, bytes)
    }
}
