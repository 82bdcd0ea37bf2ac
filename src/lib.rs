// SPDX-License-Identifier: MIT

//! An implementation of the GOST 28147-89 block cipher, a random number
//! generator built on it, and a password generator built on that.
//!
//! [`Gost`](gost::Gost) encrypts caller-owned buffers in simple
//! replacement, counter (gamma) and cipher feedback modes and computes
//! the 32-bit imitation tag. [`QualityRng`](rng::QualityRng) runs the
//! cipher in feedback mode over fresh entropy and only hands out buffers
//! that pass the FIPS 140-1 statistical tests. Each instance verifies a
//! fixed-seed checksum of the whole pipeline before it is returned.
//!
//! None of this is a vetted cryptographic library. The round key
//! addition and the handling of trailing blocks deviate from the
//! published standard.
//!
//! # Quick Example
//!
//! A simple way to obtain random data is to use the
//! [`LocalRng::default()`](crate::thread::LocalRng::default())
//! function. This returns a handle to a thread-local instance of
//! [`QualityRng`](rng::QualityRng) using entropy supplied by the OS. The
//! `std` feature is required for this approach.
//!
//! ```
//! # #[cfg(feature = "std")]
//! use crypton::thread::LocalRng;
//!
//! # use crypton::error::Error;
//! #
//! # fn main() -> Result<(),Error> {
//! #
//! # #[cfg(feature = "std")]
//! let rng = LocalRng::default();
//! let mut random_data = [0u8; 32];
//! # #[cfg(feature = "std")]
//! rng.fill_bytes(&mut random_data)?;
//! #
//! # Ok(())
//! # }
//! ```
//!
//! Otherwise an instance may be constructed by hand using
//! [`RngBuilder`](rng::RngBuilder). This approach doesn't require the
//! `std` feature and accepts any [`Entropy`](entropy::Entropy) source.
//!
//! Passwords come from [`SequenceGenerator`](sequence::SequenceGenerator),
//! which also requires `std`.
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod entropy;
pub mod error;
pub mod gost;
pub mod quality;
pub mod rng;
pub mod weak;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod sequence;

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod thread;
