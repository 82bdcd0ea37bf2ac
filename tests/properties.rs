//! Property-based tests for the cipher modes and the weak generator.
//!
//! These hold for every key and substitution table:
//! - Simple replacement and feedback mode decrypt what they encrypt
//! - Counter mode is its own inverse
//! - Equal plaintext blocks give equal simple replacement blocks
//! - The imitation tag depends on every byte

use crypton::{
    error::Error,
    gost::{Gost, SBox, SyncVector, BLOCK_LEN},
    quality,
    weak::WeakRng,
};
use proptest::prelude::*;

// Strategy for generating valid substitution tables
fn table_strategy() -> impl Strategy<Value = [[u8; 16]; 8]> {
    proptest::array::uniform8(proptest::array::uniform16(0u8..16))
}

// Strategy for generating ciphers with arbitrary key and table
fn cipher_strategy() -> impl Strategy<Value = Gost> {
    (any::<[u32; 8]>(), table_strategy()).prop_map(|(key, table)| {
        let mut cipher = Gost::new();
        cipher.set_key(key);
        cipher.set_sbox(table).unwrap();
        cipher
    })
}

// Strategy for generating whole-block buffers (0-16 blocks)
fn blocks_strategy() -> impl Strategy<Value = Vec<u8>> {
    (0usize..=16).prop_flat_map(|n| proptest::collection::vec(any::<u8>(), n * BLOCK_LEN))
}

// Strategy for generating buffers of any length (0-100 bytes)
fn bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..100)
}

#[test]
fn prop_simple_replace_round_trip() {
    proptest!(|(cipher in cipher_strategy(), data in blocks_strategy())| {
        let mut buf = data.clone();
        cipher.encrypt_blocks(&mut buf).unwrap();
        cipher.decrypt_blocks(&mut buf).unwrap();
        prop_assert_eq!(data, buf);
    });
}

#[test]
fn prop_simple_replace_rejects_partial_blocks() {
    proptest!(|(cipher in cipher_strategy(), data in bytes_strategy())| {
        prop_assume!(data.len() % BLOCK_LEN != 0);
        let mut buf = data.clone();
        let result = cipher.encrypt_blocks(&mut buf);
        prop_assert!(
            matches!(result, Err(Error::InvalidLength { .. })),
            "expected InvalidLength, got {:?}",
            result
        );
        prop_assert_eq!(data, buf);
    });
}

#[test]
fn prop_simple_replace_is_per_block() {
    proptest!(|(cipher in cipher_strategy(), block in any::<[u8; 8]>())| {
        let mut buf = [block, block].concat();
        cipher.encrypt_blocks(&mut buf).unwrap();
        prop_assert_eq!(&buf[..BLOCK_LEN], &buf[BLOCK_LEN..]);
        prop_assert_eq!(
            &cipher.encrypt_u64(u64::from_le_bytes(block)).to_le_bytes()[..],
            &buf[..BLOCK_LEN]
        );
    });
}

#[test]
fn prop_counter_is_self_inverse() {
    proptest!(|(cipher in cipher_strategy(), data in bytes_strategy(), sync in any::<u64>())| {
        let mut buf = data.clone();
        let after_encrypt = cipher.apply_counter(&mut buf, SyncVector(sync));
        let after_decrypt = cipher.apply_counter(&mut buf, SyncVector(sync));
        prop_assert_eq!(data, buf);
        prop_assert_eq!(after_encrypt, after_decrypt);
    });
}

#[test]
fn prop_feedback_round_trip() {
    proptest!(|(cipher in cipher_strategy(), data in bytes_strategy(), sync in any::<u64>())| {
        let mut buf = data.clone();
        let after_encrypt = cipher.encrypt_feedback(&mut buf, SyncVector(sync));
        let after_decrypt = cipher.decrypt_feedback(&mut buf, SyncVector(sync));
        prop_assert_eq!(data, buf);
        prop_assert_eq!(after_encrypt, after_decrypt);
    });
}

#[test]
fn prop_mac_depends_on_every_byte() {
    proptest!(|(
        cipher in cipher_strategy(),
        data in proptest::collection::vec(any::<u8>(), 1..100),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    )| {
        let tag = cipher.mac(&data);
        prop_assert_eq!(tag, cipher.mac(&data));
        let mut flipped = data.clone();
        flipped[index.index(data.len())] ^= 1 << bit;
        prop_assert_ne!(tag, cipher.mac(&flipped));
    });
}

#[test]
fn prop_sbox_rejects_wide_entries() {
    proptest!(|(table in table_strategy(), lane in 0usize..8, index in 0usize..16, value in 16u8..)| {
        let mut table = table;
        table[lane][index] = value;
        prop_assert!(SBox::new(table).is_err());
    });
}

#[test]
fn prop_weak_rng_is_a_function_of_the_seed() {
    proptest!(|(seed in any::<u32>())| {
        let mut a = WeakRng::new(seed);
        let mut b = WeakRng::new(seed);
        for _ in 0..64 {
            let x = a.next();
            prop_assert_eq!(x, b.next());
            prop_assert!(x < 1 << 31);
        }
    });
}

#[test]
fn prop_sync_balance_is_symmetric() {
    proptest!(|(sync in any::<u64>())| {
        prop_assert_eq!(quality::sync_balanced(sync), quality::sync_balanced(!sync));
    });
}
