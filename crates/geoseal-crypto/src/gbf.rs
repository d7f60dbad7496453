//! Garbled Bloom filter.
//!
//! A GBF stores, per inserted item, k XOR shares of the item's ψ-bit
//! fingerprint at the item's k hash positions. Membership is tested by
//! XOR-ing the cells at those positions and comparing against the
//! fingerprint; absent items reconstruct pseudorandom bytes instead.

use crate::prf::{digest_mod, xor_in_place};
use md5::Md5;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// ψ-bit fingerprint of an item: the leading bytes of its SHA-256 digest.
pub fn fingerprint(item: &str, psi: usize) -> Vec<u8> {
    let digest = Sha256::digest(item.as_bytes());
    digest[..psi / 8].to_vec()
}

/// The k candidate positions of an item under double hashing:
/// `(h1 + i·h2) mod size` with h1 = SHA-256, h2 = MD5 (digest-as-integer).
///
/// The returned list is positional, not a set: duplicates are preserved
/// and every consumer must iterate it verbatim so that XOR cancellation
/// stays consistent across setup, planning, decryption, and verification.
pub fn hash_positions(item: &str, size: usize, count: usize) -> Vec<usize> {
    let m = size as u64;
    let h1 = digest_mod(&Sha256::digest(item.as_bytes()), m);
    let h2 = digest_mod(&Md5::digest(item.as_bytes()), m);
    (0..count as u64)
        .map(|i| (((h1 as u128 + i as u128 * h2 as u128) % m as u128) as usize))
        .collect()
}

/// A garbled Bloom filter over `size` cells of `chunk_len` bytes each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarbledBloomFilter {
    size: usize,
    hash_count: usize,
    psi: usize,
    /// Cell array; every cell is exactly `chunk_len` bytes.
    pub array: Vec<Vec<u8>>,
}

impl GarbledBloomFilter {
    /// Create an all-zero filter. `psi` must be a multiple of 8.
    pub fn new(size: usize, hash_count: usize, psi: usize) -> Self {
        Self {
            size,
            hash_count,
            psi,
            array: vec![vec![0u8; psi / 8]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn chunk_len(&self) -> usize {
        self.psi / 8
    }

    /// Insert an item.
    ///
    /// One position from the raw position list is chosen uniformly as the
    /// special slot; all other positions receive fresh random shares and
    /// the special slot receives the share completing the fingerprint XOR.
    /// Shares are XOR-accumulated into the existing cells, so insertions
    /// commute.
    pub fn add<R: RngCore + CryptoRng>(&mut self, item: &str, rng: &mut R) {
        let chunk_len = self.chunk_len();
        let fp = fingerprint(item, self.psi);
        let positions = hash_positions(item, self.size, self.hash_count);

        // Uniform over the raw list: a duplicated position is proportionally
        // more likely to become the special slot.
        let special = positions[(rng.next_u32() as usize) % positions.len()];

        let mut shares: HashMap<usize, Vec<u8>> = HashMap::new();
        let mut xor_sum = vec![0u8; chunk_len];
        for &pos in &positions {
            if pos == special {
                continue;
            }
            let mut share = vec![0u8; chunk_len];
            rng.fill_bytes(&mut share);
            xor_in_place(&mut xor_sum, &share);
            shares.insert(pos, share);
        }
        xor_in_place(&mut xor_sum, &fp);
        shares.insert(special, xor_sum);

        for &pos in &positions {
            let share = &shares[&pos];
            xor_in_place(&mut self.array[pos], share);
        }
    }

    /// Membership test: XOR of the cells at the item's positions equals
    /// the item's fingerprint. One-sided error: false positives possible,
    /// false negatives not (absent same-position collisions).
    pub fn query(&self, item: &str) -> bool {
        let positions = hash_positions(item, self.size, self.hash_count);
        let mut acc = vec![0u8; self.chunk_len()];
        for &pos in &positions {
            xor_in_place(&mut acc, &self.array[pos]);
        }
        acc == fingerprint(item, self.psi)
    }
}
