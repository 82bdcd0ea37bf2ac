// SPDX-License-Identifier: MIT

//! Statistical acceptance tests.
//!
//! The generator buffer tests are the FIPS 140-1 monobit, poker and runs
//! tests over a 20000-bit sample, with bits taken least significant first
//! from each byte. A buffer that fails any of them is regenerated.

/// Bits in a generator buffer.
pub const SAMPLE_BITS: usize = 20_000;

const MONOBIT_MIN: u32 = 9_725;
const MONOBIT_MAX: u32 = 10_275;

const POKER_MIN: f32 = 2.16;
const POKER_MAX: f32 = 46.17;

/// Bounds for runs of length 1, 2, 3, 4, 5 and 6 or more.
const RUN_MIN: [u32; 6] = [2_343, 1_135, 542, 251, 111, 111];
const RUN_MAX: [u32; 6] = [2_657, 1_365, 708, 373, 201, 201];
const LONG_RUN: u32 = 26;

/// Largest tolerated `|ones - zeros|` of a sync vector, as a share of
/// its 64 bits.
const SYNC_IMBALANCE: f64 = 0.12;

/// Normal quantile of the per-symbol count bounds (99%).
#[cfg(feature = "std")]
const COUNT_Z: f64 = 2.58;
/// Normal quantile of the chi-squared bounds.
#[cfg(feature = "std")]
const CHI_Z: f64 = 2.33;

fn bit(buf: &[u8], i: usize) -> bool {
    buf[i / 8] & (1 << (i % 8)) != 0
}

/// All three buffer tests.
pub fn accept(buf: &[u8]) -> bool {
    monobit(buf) && poker(buf) && runs(buf)
}

/// Count of set bits within `[9725, 10275]`.
pub fn monobit(buf: &[u8]) -> bool {
    let ones: u32 = buf.iter().map(|b| b.count_ones()).sum();
    (MONOBIT_MIN..=MONOBIT_MAX).contains(&ones)
}

/// Frequency of the 16 four-bit patterns, over non-overlapping windows.
pub fn poker(buf: &[u8]) -> bool {
    let mut counts = [0u64; 16];
    for b in buf {
        counts[(b & 0xf) as usize] += 1;
        counts[(b >> 4) as usize] += 1;
    }
    let sum: u64 = counts.iter().map(|n| n * n).sum();
    let x = ((16.0 / 5000.0) * sum as f64 - 5000.0) as f32;
    (POKER_MIN..=POKER_MAX).contains(&x)
}

/// Histogram of runs of equal bits, indexed `[bit][length - 1]` with the
/// last bucket holding runs of 6 or more. `None` when a run is longer
/// than 26 bits.
///
/// A run that reaches the end of the buffer is counted one bit short, and
/// dropped if that leaves it empty.
pub(crate) fn run_histogram(buf: &[u8]) -> Option<[[u32; 6]; 2]> {
    let bits = buf.len() * 8;
    let mut hist = [[0u32; 6]; 2];
    let mut i = 1;
    while i < bits {
        let mut len = 0;
        let mut prev;
        loop {
            let cur = bit(buf, i);
            prev = bit(buf, i - 1);
            len += 1;
            i += 1;
            if i >= bits || cur != prev {
                break;
            }
        }
        if len > LONG_RUN {
            return None;
        }
        hist[prev as usize][len.min(6) as usize - 1] += 1;
    }
    Some(hist)
}

/// Runs of zeros and runs of ones, per length, within fixed bounds; no
/// run longer than 26 bits.
pub fn runs(buf: &[u8]) -> bool {
    let Some(hist) = run_histogram(buf) else {
        return false;
    };
    hist.iter().all(|counts| {
        counts
            .iter()
            .zip(RUN_MIN.iter().zip(RUN_MAX.iter()))
            .all(|(n, (lo, hi))| (lo..=hi).contains(&n))
    })
}

/// A sync vector whose set and unset bit counts differ by less than 12%
/// of its width.
pub fn sync_balanced(sync: u64) -> bool {
    let ones = sync.count_ones() as i32;
    let diff = ones - (64 - ones);
    (diff.unsigned_abs() as f64) < 64.0 * SYNC_IMBALANCE
}

/// Uniformity of `n` symbols over an alphabet of `counts.len()` symbols,
/// given the occurrence count of each.
///
/// Every count must lie within the 99% normal-approximation interval
/// around `n / m`, and the chi-squared statistic within
/// `[(√(2m−1) − 2.33)²/2, (√(2m−1) + 2.33)²/2]`.
#[cfg(feature = "std")]
pub fn uniform(counts: &[u32], n: usize) -> bool {
    let m = counts.len() as f64;
    let n = n as f64;
    let spread = COUNT_Z * (n * (m - 1.0)).sqrt();
    let (lo, hi) = ((n - spread) / m, (n + spread) / m);
    if counts.iter().any(|&c| (c as f64) < lo || (c as f64) > hi) {
        return false;
    }
    let expected = n / m;
    let chi2: f64 = counts
        .iter()
        .map(|&c| (c as f64 - expected).powi(2) / expected)
        .sum();
    let root = (2.0 * m - 1.0).sqrt();
    let (g1, g2) = ((root - CHI_Z).powi(2) / 2.0, (root + CHI_Z).powi(2) / 2.0);
    (g1..=g2).contains(&chi2)
}

#[cfg(test)]
mod tests {
    use crate::{
        gost::{Gost, SyncVector, FIXED_SEED},
        quality::*,
        weak::WeakRng,
    };
    use alloc::vec;

    const BUF_LEN: usize = SAMPLE_BITS / 8;

    fn encrypted_sample(seed: u32) -> [u8; BUF_LEN] {
        let mut buf = [0u8; BUF_LEN];
        WeakRng::new(seed).fill_words(&mut buf);
        Gost::from_seed(FIXED_SEED).encrypt_feedback(&mut buf, SyncVector(10781));
        buf
    }

    #[test]
    fn monobit_bounds() {
        let mut buf = [0x55u8; BUF_LEN];
        assert!(monobit(&buf));
        buf[0] = 0xff;
        buf[1] = 0xff;
        assert!(monobit(&buf));
        assert!(!monobit(&[0u8; BUF_LEN]));
        assert!(!monobit(&[0xffu8; BUF_LEN]));
    }

    #[test]
    fn monobit_edges() {
        let with_ones = |n: usize| {
            let mut buf = [0u8; BUF_LEN];
            for i in 0..n {
                buf[i / 8] |= 1 << (i % 8);
            }
            buf
        };
        assert!(!monobit(&with_ones(9_724)));
        assert!(monobit(&with_ones(9_725)));
        assert!(monobit(&with_ones(10_275)));
        assert!(!monobit(&with_ones(10_276)));
    }

    #[test]
    fn poker_rejects_patterns() {
        // Every nibble is 0x5: sum of squares is 5000^2.
        assert!(!poker(&[0x55u8; BUF_LEN]));
        // Each nibble value 312 or 313 times: far too even.
        let pattern = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
        let even: vec::Vec<u8> = (0..BUF_LEN).map(|i| pattern[i % 8]).collect();
        assert!(!poker(&even));
        assert!(poker(&encrypted_sample(5)));
    }

    #[test]
    fn runs_rejects_alternating_bits() {
        // 0b0101_0101: only runs of length 1.
        assert!(!runs(&[0x55u8; BUF_LEN]));
    }

    #[test]
    fn runs_rejects_long_run() {
        let mut buf = encrypted_sample(3);
        buf[100..104].copy_from_slice(&[0; 4]);
        assert!(run_histogram(&buf).is_none());
        assert!(!runs(&buf));
    }

    #[test]
    fn run_histogram_counts() {
        // Bits LSB first: 0 1 1 0 0 0 1 1 | 1 1 1 1 1 1 1 1
        let hist = run_histogram(&[0b1100_0110, 0xff]).unwrap();
        // zero runs: length 1, length 3
        assert_eq!([1, 0, 1, 0, 0, 0], hist[0]);
        // one runs: length 2, then the final run of 10 counted as 9
        assert_eq!([0, 1, 0, 0, 0, 1], hist[1]);
    }

    #[test]
    fn encrypted_buffers_mostly_pass() {
        let passed = (1..=20).filter(|&s| accept(&encrypted_sample(s))).count();
        assert!(passed >= 18, "only {} of 20 buffers passed", passed);
    }

    #[test]
    fn sync_balance() {
        assert!(sync_balanced(0x0000_0000_ffff_ffff));
        assert!(sync_balanced(0x5555_5555_5555_5555));
        // 35 ones, 29 zeros: difference 6.
        assert!(sync_balanced(0x0000_0007_ffff_ffff));
        // 36 ones, 28 zeros: difference 8.
        assert!(!sync_balanced(0x0000_000f_ffff_ffff));
        // 28 ones, 36 zeros.
        assert!(!sync_balanced(0x0000_0000_0fff_ffff));
        assert!(!sync_balanced(0));
    }

    #[cfg(feature = "std")]
    #[test]
    fn uniform_accepts_noisy_counts() {
        // 62 symbols, 1193 draws: about 19.2 expected per symbol.
        let mut counts = vec![19u32; 62];
        for (i, c) in counts.iter_mut().enumerate() {
            *c = match i % 4 {
                0 => 14,
                1 => 24,
                2 => 17,
                _ => 22,
            };
        }
        let n: u32 = counts.iter().sum();
        assert!(uniform(&counts, n as usize));
    }

    #[cfg(feature = "std")]
    #[test]
    fn uniform_rejects_too_even_counts() {
        // Chi-squared of zero is below the lower bound.
        assert!(!uniform(&[20u32; 62], 1240));
    }

    #[cfg(feature = "std")]
    #[test]
    fn uniform_rejects_outlier() {
        let mut counts = vec![19u32; 62];
        counts[0] = 60;
        let n: u32 = counts.iter().sum();
        assert!(!uniform(&counts, n as usize));
    }
}
