//! Keyed pseudorandom functions and the seeded permutation.
//!
//! Everything here is HMAC-SHA256 or SHA-256 based and fully deterministic.
//! `fx` is the one construction with structure: it is XOR-homomorphic over
//! its input bits, which is what lets column tags authenticate XOR
//! aggregates (see the index and verifier crates).

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 with an arbitrary-length key.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// XOR `other` into `acc`. Both slices must have equal length.
pub fn xor_in_place(acc: &mut [u8], other: &[u8]) {
    debug_assert_eq!(acc.len(), other.len());
    for (a, b) in acc.iter_mut().zip(other) {
        *a ^= b;
    }
}

/// XOR two equal-length byte strings into a new buffer.
pub fn xor_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

/// Variable-length PRF `F(key, data, out_len)`.
///
/// For `out_len` ≤ 32 this is truncated HMAC-SHA256 of `data`. Longer
/// outputs concatenate `HMAC(key, data ‖ counter_be32)` blocks for
/// counter = 0, 1, …
pub fn f_expand(key: &[u8], data: &[u8], out_len: usize) -> Vec<u8> {
    let first = hmac_sha256(key, data);
    if out_len <= first.len() {
        return first[..out_len].to_vec();
    }
    let mut out = Vec::with_capacity(out_len + 32);
    let mut counter: u32 = 0;
    while out.len() < out_len {
        let mut block_input = data.to_vec();
        block_input.extend_from_slice(&counter.to_be_bytes());
        out.extend_from_slice(&hmac_sha256(key, &block_input));
        counter += 1;
    }
    out.truncate(out_len);
    out
}

/// Per-record key derivation: first `out_len` bytes of HMAC-SHA256.
pub fn fc_eval(key: &[u8], data: &[u8], out_len: usize) -> Vec<u8> {
    hmac_sha256(key, data)[..out_len].to_vec()
}

/// Constrained-key factoring: derive a sub-key from a prefix.
///
/// Same shape as [`fc_eval`]; kept separate because callers constrain a
/// master key with a random prefix rather than evaluate at a point.
pub fn fc_cons(key: &[u8], prefix: &[u8], out_len: usize) -> Vec<u8> {
    hmac_sha256(key, prefix)[..out_len].to_vec()
}

/// XOR-homomorphic PRF over input bits.
///
/// For each set bit b of `data` (byte-major, LSB-first within a byte),
/// XORs in `HMAC(key, "FX" ‖ b_be32)[..out_len]`. Consequently
/// `fx(k, a ⊕ b) == fx(k, a) ⊕ fx(k, b)` for equal-length a, b.
pub fn fx(key: &[u8], data: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; out_len];
    let mut bit_index: u32 = 0;
    for byte in data {
        for k in 0..8 {
            if (byte >> k) & 1 == 1 {
                let mut input = Vec::with_capacity(6);
                input.extend_from_slice(b"FX");
                input.extend_from_slice(&bit_index.to_be_bytes());
                let block = hmac_sha256(key, &input);
                xor_in_place(&mut out, &block[..out_len]);
            }
            bit_index += 1;
        }
    }
    out
}

/// Reduce a big-endian digest modulo `m` (Horner over bytes).
pub(crate) fn digest_mod(digest: &[u8], m: u64) -> u64 {
    debug_assert!(m > 0);
    let mut acc: u64 = 0;
    for &byte in digest {
        acc = ((acc as u128 * 256 + byte as u128) % m as u128) as u64;
    }
    acc
}

/// Seeded permutation output reduced modulo `m`.
///
/// `SHA-256(seed ‖ x_be64)` interpreted as a big-endian integer mod `m`;
/// used for cuckoo bucket placement, so every party must share `seed`.
pub fn prp_mod(seed: &[u8], x: u64, m: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(x.to_be_bytes());
    digest_mod(&hasher.finalize(), m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f_expand_short_is_truncated_hmac() {
        let key = b"key";
        let out = f_expand(key, b"data", 16);
        assert_eq!(out, hmac_sha256(key, b"data")[..16].to_vec());
    }

    #[test]
    fn test_f_expand_long_output() {
        let out = f_expand(b"key", b"data", 100);
        assert_eq!(out.len(), 100);
        // First block is HMAC(key, data || 0_be32).
        let mut block_input = b"data".to_vec();
        block_input.extend_from_slice(&0u32.to_be_bytes());
        assert_eq!(out[..32], hmac_sha256(b"key", &block_input));
    }

    #[test]
    fn test_f_expand_prefix_consistency() {
        // Outputs longer than one block share a prefix for the same inputs.
        let a = f_expand(b"k", b"d", 64);
        let b = f_expand(b"k", b"d", 96);
        assert_eq!(a, b[..64].to_vec());
    }

    #[test]
    fn test_fx_is_xor_homomorphic() {
        let key = b"fx-key";
        let a = [0b1010_0110u8, 0x3c, 0x01];
        let b = [0b0110_1100u8, 0xf0, 0x80];
        let ab: Vec<u8> = a.iter().zip(&b).map(|(x, y)| x ^ y).collect();

        let fa = fx(key, &a, 16);
        let fb = fx(key, &b, 16);
        let fab = fx(key, &ab, 16);
        assert_eq!(fab, xor_bytes(&fa, &fb));
    }

    #[test]
    fn test_fx_of_zero_is_zero() {
        assert_eq!(fx(b"k", &[0u8; 8], 16), vec![0u8; 16]);
    }

    #[test]
    fn test_fx_bit_order() {
        // Bit 0 is the LSB of byte 0: fx on 0x01 uses block index 0.
        let key = b"k";
        let mut input = Vec::new();
        input.extend_from_slice(b"FX");
        input.extend_from_slice(&0u32.to_be_bytes());
        let expected = hmac_sha256(key, &input)[..16].to_vec();
        assert_eq!(fx(key, &[0x01], 16), expected);

        // Bit 8 is the LSB of byte 1.
        let mut input = Vec::new();
        input.extend_from_slice(b"FX");
        input.extend_from_slice(&8u32.to_be_bytes());
        let expected = hmac_sha256(key, &input)[..16].to_vec();
        assert_eq!(fx(key, &[0x00, 0x01], 16), expected);
    }

    #[test]
    fn test_digest_mod_matches_wide_arithmetic() {
        // 0x0102 mod 251 = 258 mod 251 = 7.
        assert_eq!(digest_mod(&[0x01, 0x02], 251), 7);
        assert_eq!(digest_mod(&[0xff; 32], 1), 0);
    }

    #[test]
    fn test_prp_mod_deterministic_and_in_range() {
        let a = prp_mod(b"seed", 42, 13);
        let b = prp_mod(b"seed", 42, 13);
        assert_eq!(a, b);
        assert!(a < 13);
        assert_ne!(prp_mod(b"seed", 42, 1 << 32), prp_mod(b"seed", 43, 1 << 32));
    }

    #[test]
    fn test_fc_eval_truncates() {
        let out = fc_eval(b"key", b"1", 16);
        assert_eq!(out.len(), 16);
        assert_eq!(out, hmac_sha256(b"key", b"1")[..16].to_vec());
    }
}
