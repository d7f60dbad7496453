//! Distributed multi-party point-function shares.
//!
//! `gen` hands each of U parties a bit per domain point such that the XOR
//! of all parties' bits is the indicator of the selection set. The first
//! U−1 parties' bits are derived from a SHA-256 stream keyed by a canonical
//! serialization of the set, the last party holds the correction. The
//! canonical `base` string is the only cross-party coordination channel:
//! any two callers generating shares for the same logical set produce
//! aligned keys.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// One party's selection-bit key over a contiguous domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmpfKey {
    /// Party-specific key handle (hex digest of the share stream seed).
    pub seed: String,
    /// Selection bit per domain point.
    pub bits: Vec<u8>,
}

impl DmpfKey {
    /// Selection bit at `j`; 0 outside the domain.
    pub fn eval(&self, j: usize) -> u8 {
        self.bits.get(j).copied().unwrap_or(0)
    }
}

/// Canonical serialization of a selection set: comma-joined sorted decimal.
fn base_string(indices: &[usize]) -> String {
    let set: BTreeSet<usize> = indices.iter().copied().collect();
    set.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn share_bit(base: &str, party: usize, security_param: usize, j: usize) -> u8 {
    let digest = Sha256::digest(format!("{}|{}|{}|{}", base, party, security_param, j).as_bytes());
    digest[0] & 1
}

/// Generate U keys whose evaluations XOR to the indicator of `indices`
/// over `[0, domain_size)`.
pub fn gen(
    security_param: usize,
    indices: &[usize],
    domain_size: usize,
    num_parties: usize,
) -> Vec<DmpfKey> {
    assert!(num_parties >= 2, "need at least two parties");
    let base = base_string(indices);
    let selected: BTreeSet<usize> = indices.iter().copied().collect();

    let mut bits = vec![vec![0u8; domain_size]; num_parties];
    for j in 0..domain_size {
        let desired = u8::from(selected.contains(&j));
        let mut xor_prev = 0u8;
        for (party, party_bits) in bits.iter_mut().take(num_parties - 1).enumerate() {
            let bit = share_bit(&base, party, security_param, j);
            party_bits[j] = bit;
            xor_prev ^= bit;
        }
        bits[num_parties - 1][j] = desired ^ xor_prev;
    }

    bits.into_iter()
        .enumerate()
        .map(|(party, bits)| {
            let seed_input = format!("{}|{}|{}", base, party, security_param);
            DmpfKey {
                seed: hex::encode(Sha256::digest(seed_input.as_bytes())),
                bits,
            }
        })
        .collect()
}
