// SPDX-License-Identifier: MIT

//! Random symbol sequences, such as passwords.
//!
//! [`SequenceGenerator`] maps bytes of a [`QualityRng`] onto an alphabet
//! by reduction modulo its size. Symbols are produced in batches of 1200
//! (alphabets under 100 symbols) or 2400; a batch is handed out only if
//! every symbol occurs about equally often, otherwise it is regenerated
//! as a whole.
//!
//! The default [`ALPHANUMERIC`] alphabet reduces every byte, which favours
//! its first `256 % 62` symbols within what the uniformity test tolerates.
//! Alphabets given to [`SequenceGenerator::with_alphabet`] skip bytes at or
//! above the largest multiple of their size, so every symbol is equally
//! likely whatever the size.
//!
//! ```
//! use crypton::{rng::RngBuilder, entropy::OsEntropy, sequence::{SequenceGenerator, ALPHANUMERIC}};
//!
//! # use crypton::error::Error;
//! # fn main() -> Result<(), Error> {
//! let rng = RngBuilder::new(OsEntropy::default()).build()?;
//! let mut passwords = SequenceGenerator::new(rng);
//! let password = passwords.generate(12)?;
//! assert_eq!(12, password.len());
//! assert!(password.chars().all(|c| ALPHANUMERIC.contains(c)));
//! # Ok(())
//! # }
//! ```
use crate::{
    entropy::Entropy,
    error::Error,
    quality,
    rng::{QualityRng, DEFAULT_MAX_ATTEMPTS},
};
use alloc::{string::String, vec, vec::Vec};

/// Digits, lower case and upper case Latin letters.
pub const ALPHANUMERIC: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const LARGE_ALPHABET: usize = 100;
const SHORT_BATCH: usize = 1200;
const LONG_BATCH: usize = 2400;
const BYTE_VALUES: usize = 256;

/// Generator of uniformly distributed symbol sequences.
pub struct SequenceGenerator<E> {
    rng: QualityRng<E>,
    alphabet: Vec<char>,
    batch: Vec<u8>,
    pos: usize,
    /// Bytes at or above this are skipped.
    limit: usize,
    max_attempts: u32,
}

impl<E> SequenceGenerator<E>
where
    E: Entropy,
{
    /// A generator over [`ALPHANUMERIC`].
    pub fn new(rng: QualityRng<E>) -> Self {
        Self::from_symbols(rng, ALPHANUMERIC.chars().collect(), BYTE_VALUES)
    }

    /// A generator over the characters of `alphabet`.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidAlphabet`] unless `alphabet` holds between
    /// 2 and 256 characters, none repeated.
    pub fn with_alphabet(rng: QualityRng<E>, alphabet: &str) -> Result<Self, Error> {
        let symbols: Vec<char> = alphabet.chars().collect();
        if !(2..=256).contains(&symbols.len()) {
            return Err(Error::InvalidAlphabet);
        }
        if symbols
            .iter()
            .enumerate()
            .any(|(i, c)| symbols[..i].contains(c))
        {
            return Err(Error::InvalidAlphabet);
        }
        let limit = BYTE_VALUES - BYTE_VALUES % symbols.len();
        Ok(Self::from_symbols(rng, symbols, limit))
    }

    fn from_symbols(rng: QualityRng<E>, alphabet: Vec<char>, limit: usize) -> Self {
        let len = if alphabet.len() < LARGE_ALPHABET {
            SHORT_BATCH
        } else {
            LONG_BATCH
        };
        Self {
            rng,
            alphabet,
            batch: vec![0; len],
            pos: len,
            limit,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Limit on consecutive rejected batches.
    ///
    /// # Panics
    ///
    /// This function panics if `attempts` is zero.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        if attempts == 0 {
            panic!("SequenceGenerator: max attempts must be positive")
        }
        self.max_attempts = attempts;
        self
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Give back the underlying generator.
    pub fn into_inner(self) -> QualityRng<E> {
        self.rng
    }

    /// Next symbol of the current batch.
    ///
    /// # Error
    ///
    /// Returns an error when the batch is exhausted and cannot be
    /// regenerated.
    pub fn next_symbol(&mut self) -> Result<char, Error> {
        if self.pos == self.batch.len() {
            self.refill()?;
        }
        let symbol = self.alphabet[self.batch[self.pos] as usize];
        self.pos += 1;
        Ok(symbol)
    }

    /// A sequence of `len` symbols.
    ///
    /// # Error
    ///
    /// Returns an error when a batch cannot be regenerated.
    pub fn generate(&mut self, len: usize) -> Result<String, Error> {
        (0..len).map(|_| self.next_symbol()).collect()
    }

    fn refill(&mut self) -> Result<(), Error> {
        self.pos = self.batch.len();
        let m = self.alphabet.len();
        let mut counts = vec![0u32; m];
        for attempt in 1..=self.max_attempts {
            counts.fill(0);
            for slot in self.batch.iter_mut() {
                let index = loop {
                    let b = self.rng.next_u8()? as usize;
                    if b < self.limit {
                        break b % m;
                    }
                };
                *slot = index as u8;
                counts[index] += 1;
            }
            if quality::uniform(&counts, self.batch.len()) {
                tracing::trace!(attempt, "symbol batch regenerated");
                self.pos = 0;
                return Ok(());
            }
            tracing::debug!(attempt, "symbol batch rejected by uniformity test");
        }
        Err(Error::QualityGateExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::Error,
        quality,
        rng::{tests::MockEntropy, QualityRng, RngBuilder},
        sequence::{SequenceGenerator, ALPHANUMERIC},
    };
    use alloc::{vec, vec::Vec};

    fn rng(seed: u64) -> Result<QualityRng<MockEntropy>, Error> {
        RngBuilder::new(MockEntropy::new(seed)).weak_seed(42).build()
    }

    #[test]
    fn eight_symbol_password() -> Result<(), Error> {
        let mut gen = SequenceGenerator::new(rng(1)?);
        let password = gen.generate(8)?;
        assert_eq!(8, password.chars().count());
        assert!(password.chars().all(|c| ALPHANUMERIC.contains(c)));
        Ok(())
    }

    #[test]
    fn empty_sequence() -> Result<(), Error> {
        let mut gen = SequenceGenerator::new(rng(1)?);
        assert_eq!("", gen.generate(0)?);
        Ok(())
    }

    #[test]
    fn accepted_batch_is_uniform() -> Result<(), Error> {
        let mut gen = SequenceGenerator::new(rng(2)?);
        assert_eq!(1200, gen.batch.len());
        gen.next_symbol()?;
        assert_eq!(1, gen.pos);
        let mut counts = vec![0u32; 62];
        for &i in &gen.batch {
            counts[i as usize] += 1;
        }
        assert!(quality::uniform(&counts, 1200));
        Ok(())
    }

    #[test]
    fn sequences_span_batches() -> Result<(), Error> {
        let mut gen = SequenceGenerator::new(rng(3)?);
        let long = gen.generate(1500)?;
        assert_eq!(1500, long.len());
        assert_eq!(300, gen.pos);
        Ok(())
    }

    #[test]
    fn deterministic_for_fixed_inputs() -> Result<(), Error> {
        let mut a = SequenceGenerator::new(rng(4)?);
        let mut b = SequenceGenerator::new(rng(4)?);
        assert_eq!(a.generate(64)?, b.generate(64)?);
        Ok(())
    }

    #[test]
    fn custom_alphabet() -> Result<(), Error> {
        let mut gen = SequenceGenerator::with_alphabet(rng(5)?, "01")?;
        let bits = gen.generate(256)?;
        assert!(bits.chars().all(|c| c == '0' || c == '1'));
        assert!(bits.contains('0') && bits.contains('1'));
        Ok(())
    }

    #[test]
    fn large_alphabet_uses_long_batch() -> Result<(), Error> {
        let symbols: Vec<char> = (0..128u8).map(char::from).collect();
        let alphabet: alloc::string::String = symbols.iter().collect();
        let mut gen = SequenceGenerator::with_alphabet(rng(6)?, &alphabet)?;
        assert_eq!(2400, gen.batch.len());
        assert_eq!(symbols, gen.alphabet());
        assert_eq!(10, gen.generate(10)?.chars().count());
        Ok(())
    }

    #[test]
    fn uneven_alphabet_is_served() -> Result<(), Error> {
        // 256 % 150 = 106: plain reduction would make 106 symbols twice as
        // likely as the rest and no batch would pass.
        let alphabet: alloc::string::String = (0..150u8).map(char::from).collect();
        let mut gen = SequenceGenerator::with_alphabet(rng(9)?, &alphabet)?;
        assert_eq!(150, gen.limit);
        assert_eq!(20, gen.generate(20)?.chars().count());
        let mut counts = vec![0u32; 150];
        for &i in &gen.batch {
            counts[i as usize] += 1;
        }
        assert!(quality::uniform(&counts, 2400));
        Ok(())
    }

    #[test]
    fn only_custom_alphabets_skip_bytes() -> Result<(), Error> {
        assert_eq!(256, SequenceGenerator::new(rng(10)?).limit);
        let custom = SequenceGenerator::with_alphabet(rng(10)?, ALPHANUMERIC)?;
        assert_eq!(248, custom.limit);
        let bits = SequenceGenerator::with_alphabet(rng(10)?, "01")?;
        assert_eq!(256, bits.limit);
        Ok(())
    }

    #[test]
    fn rejects_bad_alphabets() -> Result<(), Error> {
        for bad in ["", "x", "abca"] {
            assert!(matches!(
                SequenceGenerator::with_alphabet(rng(7)?, bad),
                Err(Error::InvalidAlphabet)
            ));
        }
        let too_many: alloc::string::String = (0..257u32).filter_map(char::from_u32).collect();
        assert!(matches!(
            SequenceGenerator::with_alphabet(rng(7)?, &too_many),
            Err(Error::InvalidAlphabet)
        ));
        Ok(())
    }

    #[test]
    fn into_inner_returns_generator() -> Result<(), Error> {
        let gen = SequenceGenerator::new(rng(8)?);
        let mut inner = gen.into_inner();
        inner.next_u32()?;
        Ok(())
    }
}
