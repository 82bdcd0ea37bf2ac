// SPDX-License-Identifier: MIT

//! Error type shared by the cipher engine and the generators.
use crate::entropy;
use core::{
    fmt,
    fmt::{Display, Formatter},
};

/// Errors reported by this crate.
///
/// A buffer failing one of the statistical tests is not an error: the
/// generators regenerate it internally. Only when regeneration keeps
/// failing past the configured limit is
/// [`QualityGateExhausted`](Error::QualityGateExhausted) returned.
#[derive(Debug)]
pub enum Error {
    /// Block mode input whose length is not a multiple of 8 bytes.
    InvalidLength { len: usize },
    /// Substitution table entry outside `[0, 15]`.
    InvalidSubstitution { lane: usize, index: usize, value: u8 },
    /// Alphabet with fewer than 2 or more than 256 symbols, or with
    /// repeated symbols.
    InvalidAlphabet,
    /// The fixed-seed self-check produced the wrong checksum. The
    /// implementation is corrupt and must not be used.
    IntegrityFailure { expected: u64, actual: u64 },
    /// The entropy source could not be read.
    Entropy(entropy::Error),
    /// A buffer failed its acceptance tests `attempts` times in a row.
    QualityGateExhausted { attempts: u32 },
}

impl Error {
    /// Returns `true` for errors after which the generator must not be
    /// used again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::IntegrityFailure { .. } | Error::Entropy(_))
    }
}

impl From<entropy::Error> for Error {
    fn from(error: entropy::Error) -> Self {
        Error::Entropy(error)
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Entropy(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Error::InvalidLength { len } => {
                write!(f, "buffer length {} is not a multiple of 8", len)
            }
            Error::InvalidSubstitution { lane, index, value } => write!(
                f,
                "substitution table entry [{}][{}] = {} exceeds 15",
                lane, index, value
            ),
            Error::InvalidAlphabet => {
                write!(f, "alphabet must hold 2 to 256 distinct symbols")
            }
            Error::IntegrityFailure { expected, actual } => write!(
                f,
                "integrity check failed: expected {:#x}, got {:#x}",
                expected, actual
            ),
            Error::Entropy(e) => Display::fmt(e, f),
            Error::QualityGateExhausted { attempts } => {
                write!(f, "quality gate rejected {} buffers in a row", attempts)
            }
        }
    }
}
