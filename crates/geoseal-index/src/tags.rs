//! At-rest integrity tags for the encrypted matrices.
//!
//! One full-width HMAC per column over the row-major concatenation of the
//! column's encrypted cells. These tags are advisory: they detect AUI
//! tampering at rest and are reported alongside query results, but the
//! FX+HMAC proof is what actually gates answers.

use geoseal_crypto::prf::hmac_sha256;
use geoseal_types::{Aui, KeyTuple};
use subtle::ConstantTimeEq;

/// Per-column HMAC tags for both matrices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityTags {
    pub tau_spa: Vec<[u8; 32]>,
    pub tau_tex: Vec<[u8; 32]>,
}

fn column_tags(rows: &[Vec<Vec<u8>>], cols: usize, prefix: &[u8], kh: &[u8]) -> Vec<[u8; 32]> {
    (0..cols)
        .map(|j| {
            let mut data = Vec::new();
            data.extend_from_slice(prefix);
            data.extend_from_slice((j + 1).to_string().as_bytes());
            data.push(b'|');
            for row in rows {
                data.extend_from_slice(&row[j]);
            }
            hmac_sha256(kh, &data)
        })
        .collect()
}

/// Compute tags for every column of both encrypted matrices.
pub fn build_integrity_tags(aui: &Aui, keys: &KeyTuple) -> IntegrityTags {
    IntegrityTags {
        tau_spa: column_tags(&aui.i_spa.rows, aui.m1 as usize, b"spa|", &keys.kh),
        tau_tex: column_tags(&aui.i_tex.rows, aui.m2 as usize, b"tex|", &keys.kh),
    }
}

/// Recompute and compare all tags in constant time per tag.
pub fn verify_integrity(aui: &Aui, keys: &KeyTuple, tags: &IntegrityTags) -> bool {
    let expected = build_integrity_tags(aui, keys);
    if expected.tau_spa.len() != tags.tau_spa.len()
        || expected.tau_tex.len() != tags.tau_tex.len()
    {
        return false;
    }
    let mut ok = subtle::Choice::from(1u8);
    for (a, b) in expected.tau_spa.iter().zip(&tags.tau_spa) {
        ok &= a.ct_eq(b);
    }
    for (a, b) in expected.tau_tex.iter().zip(&tags.tau_tex) {
        ok &= a.ct_eq(b);
    }
    ok.into()
}
