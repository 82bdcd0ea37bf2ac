// SPDX-License-Identifier: MIT

//! The GOST 28147-89 transformation and its operating modes.
//!
//! [`Gost`] holds a 256-bit key and an 8×16 substitution table and
//! exposes four modes over caller-owned byte buffers:
//!
//! | mode            | method                                                        |
//! |-----------------|---------------------------------------------------------------|
//! | simple replace  | [`encrypt_blocks`](Gost::encrypt_blocks), [`decrypt_blocks`](Gost::decrypt_blocks) |
//! | gamma (counter) | [`apply_counter`](Gost::apply_counter)                        |
//! | gamma feedback  | [`encrypt_feedback`](Gost::encrypt_feedback), [`decrypt_feedback`](Gost::decrypt_feedback) |
//! | imitation tag   | [`mac`](Gost::mac)                                            |
//!
//! Blocks are 64-bit words read from and written to the buffer in
//! little-endian order. The streaming modes take the [`SyncVector`] by
//! value and return the advanced one so a stream can be resumed.
//!
//! Two details differ from the published standard and are kept as is:
//! the key is added to the round input modulo 2^32 − 1, and the streaming
//! modes treat the last 1 to 8 bytes of the buffer as a tail. For a
//! buffer whose length is a multiple of 8 the final full block is
//! therefore the tail: in counter mode it reuses the keystream block of
//! the block before it, and in feedback mode it does not feed back into
//! the returned sync vector.
//!
//! # Example
//!
//! ```
//! use crypton::gost::Gost;
//!
//! # use crypton::error::Error;
//! # fn main() -> Result<(), Error> {
//! let cipher = Gost::from_seed(0);
//! let mut data = *b"12345678";
//! cipher.encrypt_blocks(&mut data)?;
//! assert_ne!(b"12345678", &data);
//! cipher.decrypt_blocks(&mut data)?;
//! assert_eq!(b"12345678", &data);
//! # Ok(())
//! # }
//! ```
use crate::{error::Error, weak::WeakRng};
use core::fmt;

/// Size of a cipher block in bytes.
pub const BLOCK_LEN: usize = 8;

/// Seed of the deterministic key schedule used by the self-check.
pub const FIXED_SEED: u32 = 0;

/// Counter increments of the gamma mode, low and high half.
const C1: u32 = 0x0101_0101;
const C2: u32 = 0x0101_0104;

/// Modulus of the round key addition.
const KEY_MOD: u64 = 0xffff_ffff;

/// The 256-bit key, as eight 32-bit words.
pub type Key = [u32; 8];

/// Substitution table. Row `i` replaces the `i`-th nibble (counting from
/// the least significant) of the round input. Every entry is in `[0, 15]`.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct SBox([[u8; 16]; 8]);

impl SBox {
    /// Validate and wrap a table.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidSubstitution`] for the first entry above 15.
    pub fn new(table: [[u8; 16]; 8]) -> Result<Self, Error> {
        for (lane, row) in table.iter().enumerate() {
            if let Some(index) = row.iter().position(|&v| v > 0xf) {
                return Err(Error::InvalidSubstitution {
                    lane,
                    index,
                    value: row[index],
                });
            }
        }
        Ok(Self(table))
    }

    pub fn rows(&self) -> &[[u8; 16]; 8] {
        &self.0
    }

    fn substitute(&self, word: u32) -> u32 {
        self.0.iter().enumerate().fold(0, |acc, (lane, row)| {
            let nibble = (word >> (4 * lane)) & 0xf;
            acc | (row[nibble as usize] as u32) << (4 * lane)
        })
    }
}

impl TryFrom<[[u8; 16]; 8]> for SBox {
    type Error = Error;

    fn try_from(table: [[u8; 16]; 8]) -> Result<Self, Error> {
        Self::new(table)
    }
}

impl fmt::Debug for SBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SBox { .. }")
    }
}

/// State threaded through the streaming modes.
///
/// In counter mode the low half advances by `0x01010101` modulo 2^32 and
/// the high half by `0x01010104` modulo 2^32 − 1, never reaching zero.
/// In feedback mode it holds the last ciphertext block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SyncVector(pub u64);

impl SyncVector {
    pub fn from_halves(low: u32, high: u32) -> Self {
        Self(low as u64 | (high as u64) << 32)
    }

    pub fn low(self) -> u32 {
        self.0 as u32
    }

    pub fn high(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// One counter step of the gamma mode.
    pub fn advance(self) -> Self {
        let low = self.low().wrapping_add(C1);
        let high = (self.high().wrapping_add(C2).wrapping_sub(1) as u64 % KEY_MOD + 1) as u32;
        Self::from_halves(low, high)
    }
}

/// GOST 28147-89 cipher engine.
///
/// The engine performs no interior mutation, so the key and table cannot
/// change during a call. It is not synchronized: share it across threads
/// only behind your own lock.
#[derive(Clone, Default)]
pub struct Gost {
    key: Key,
    sbox: SBox,
}

impl fmt::Debug for Gost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Gost { .. }")
    }
}

/// Offset of the tail (the last 1..=8 bytes) of a streaming buffer.
fn tail_start(len: usize) -> usize {
    len.saturating_sub(1) / BLOCK_LEN * BLOCK_LEN
}

/// Load up to 8 bytes as a little-endian block, zero-extended.
fn load(bytes: &[u8]) -> u64 {
    let mut blk = [0u8; BLOCK_LEN];
    blk[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(blk)
}

/// XOR the low-order bytes of `gamma` into `bytes`.
fn xor_into(bytes: &mut [u8], gamma: u64) {
    for (b, g) in bytes.iter_mut().zip(gamma.to_le_bytes()) {
        *b ^= g;
    }
}

impl Gost {
    /// An engine with an all-zero key and table. Call [`init`](Gost::init)
    /// or the setters before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose key and table are drawn from `WeakRng::new(seed)`.
    pub fn from_seed(seed: u32) -> Self {
        let mut cipher = Self::new();
        cipher.init(&mut WeakRng::new(seed));
        cipher
    }

    /// Fill the key and table from `weak`, interleaved: key word `i`, then
    /// the 16 entries of row `i`.
    ///
    /// Table entries are drawn modulo 15, so they never take the value
    /// 15 and rows are not permutations. The round function does not need
    /// them to be.
    pub fn init(&mut self, weak: &mut WeakRng) {
        for (key, row) in self.key.iter_mut().zip(self.sbox.0.iter_mut()) {
            *key = weak.next();
            for entry in row.iter_mut() {
                *entry = (weak.next() % 15) as u8;
            }
        }
    }

    pub fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    /// Replace the substitution table.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidSubstitution`] if an entry exceeds 15. The
    /// current table is kept in that case.
    pub fn set_sbox(&mut self, table: [[u8; 16]; 8]) -> Result<(), Error> {
        self.sbox = SBox::new(table)?;
        Ok(())
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn sbox(&self) -> &SBox {
        &self.sbox
    }

    /// Encrypt `data` in place, block by block, with no chaining.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidLength`] and leaves `data` untouched if its
    /// length is not a multiple of [`BLOCK_LEN`].
    pub fn encrypt_blocks(&self, data: &mut [u8]) -> Result<(), Error> {
        self.replace(data, true)
    }

    /// Inverse of [`encrypt_blocks`](Gost::encrypt_blocks).
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidLength`] and leaves `data` untouched if its
    /// length is not a multiple of [`BLOCK_LEN`].
    pub fn decrypt_blocks(&self, data: &mut [u8]) -> Result<(), Error> {
        self.replace(data, false)
    }

    fn replace(&self, data: &mut [u8], encrypting: bool) -> Result<(), Error> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(Error::InvalidLength { len: data.len() });
        }
        for blk in data.chunks_exact_mut(BLOCK_LEN) {
            let input = load(blk);
            let output = if encrypting {
                self.encrypt_u64(input)
            } else {
                self.decrypt_u64(input)
            };
            blk.copy_from_slice(&output.to_le_bytes());
        }
        Ok(())
    }

    /// XOR `data` with the counter-mode keystream derived from `sync`.
    /// The same call encrypts and decrypts. Returns the sync vector to
    /// pass to the next call of the stream.
    pub fn apply_counter(&self, data: &mut [u8], sync: SyncVector) -> SyncVector {
        let mut sync = SyncVector(self.encrypt_u64(sync.0));
        let (head, tail) = data.split_at_mut(tail_start(data.len()));
        for blk in head.chunks_exact_mut(BLOCK_LEN) {
            sync = sync.advance();
            xor_into(blk, self.encrypt_u64(sync.0));
        }
        if !tail.is_empty() {
            xor_into(tail, self.encrypt_u64(sync.0));
        }
        sync
    }

    /// Encrypt `data` in cipher feedback mode. Returns the last
    /// ciphertext block fed back.
    pub fn encrypt_feedback(&self, data: &mut [u8], sync: SyncVector) -> SyncVector {
        self.feedback(data, sync, true)
    }

    /// Decrypt `data` in cipher feedback mode. Replaying the `sync` given
    /// to [`encrypt_feedback`](Gost::encrypt_feedback) restores the
    /// plaintext.
    pub fn decrypt_feedback(&self, data: &mut [u8], sync: SyncVector) -> SyncVector {
        self.feedback(data, sync, false)
    }

    fn feedback(&self, data: &mut [u8], mut sync: SyncVector, encrypting: bool) -> SyncVector {
        let (head, tail) = data.split_at_mut(tail_start(data.len()));
        for blk in head.chunks_exact_mut(BLOCK_LEN) {
            let input = load(blk);
            let output = input ^ self.encrypt_u64(sync.0);
            blk.copy_from_slice(&output.to_le_bytes());
            sync = SyncVector(if encrypting { output } else { input });
        }
        if !tail.is_empty() {
            xor_into(tail, self.encrypt_u64(sync.0));
        }
        sync
    }

    /// Imitation insert (integrity tag) of `data`: the low 32 bits of the
    /// 16-round fold of every block. An empty buffer yields 0.
    pub fn mac(&self, data: &[u8]) -> u32 {
        let (head, tail) = data.split_at(tail_start(data.len()));
        let mut acc = head
            .chunks_exact(BLOCK_LEN)
            .fold(0u64, |acc, blk| self.mac_u64(acc ^ load(blk)));
        if !tail.is_empty() {
            acc = self.mac_u64(acc ^ load(tail));
        }
        acc as u32
    }

    /// The 32-Z cycle: one block encryption.
    pub fn encrypt_u64(&self, block: u64) -> u64 {
        let mut blk = block;
        for _ in 0..3 {
            for k in 0..8 {
                blk = self.round(blk, k);
            }
        }
        for k in (0..8).rev() {
            blk = self.round(blk, k);
        }
        blk.rotate_left(32)
    }

    /// The 32-R cycle: one block decryption.
    pub fn decrypt_u64(&self, block: u64) -> u64 {
        let mut blk = block;
        for k in 0..8 {
            blk = self.round(blk, k);
        }
        for _ in 0..3 {
            for k in (0..8).rev() {
                blk = self.round(blk, k);
            }
        }
        blk.rotate_left(32)
    }

    /// The 16-Z cycle of the imitation insert. No final swap.
    fn mac_u64(&self, block: u64) -> u64 {
        let mut blk = block;
        for _ in 0..2 {
            for k in 0..8 {
                blk = self.round(blk, k);
            }
        }
        blk
    }

    /// One Feistel round with key word `k`. The low half N1 moves up,
    /// the high half N2 is mixed with the round function of N1.
    fn round(&self, block: u64, k: usize) -> u64 {
        let n1 = block as u32;
        let n2 = (block >> 32) as u32;
        let sum = ((n1 as u64 + self.key[k] as u64) % KEY_MOD) as u32;
        let mixed = self.sbox.substitute(sum).rotate_left(11) ^ n2;
        (n1 as u64) << 32 | mixed as u64
    }
}
