//! FX+HMAC proof verification.
//!
//! The combined proof for a token is the XOR of the σ tags over the
//! token's selected columns. Each σ folds the per-record FX of the raw
//! cell with a keyed HMAC of the global column index, so the expected
//! proof can be recomputed from the combined share vectors alone:
//!
//! `FX(Kᵢ, enc ⊕ pad) = FX(Kᵢ, enc) ⊕ FX(Kᵢ, pad)`
//!
//! lets the verifier evaluate FX over the still-encrypted combined vector
//! and cancel the pad term separately, recovering the FX of the raw-cell
//! XOR without ever materializing it.

use crate::plan::QueryPlan;
use geoseal_crypto::gbf::hash_positions;
use geoseal_crypto::prf::{f_expand, fc_eval, fx, hmac_sha256, xor_in_place};
use geoseal_types::text::pad_query_blocks;
use geoseal_types::wire::TokenKind;
use geoseal_types::{Aui, KeyTuple, SuppressionParams};

/// Verify the combined proofs against the combined share vectors.
///
/// `combined_vecs` are the raw party-XOR vectors *before* pad removal.
/// Covers the full planner token list: keyword tokens authenticate against
/// the m₁-shifted column indices and pad slots, spatial tokens against the
/// zero-offset ones. Returns false on any shape or proof mismatch.
pub fn verify_fx_hmac(
    plan: &QueryPlan,
    aui: &Aui,
    keys: &KeyTuple,
    combined_vecs: &[Vec<Vec<u8>>],
    combined_proofs: &[Vec<u8>],
) -> bool {
    let n = aui.record_count();
    let m1 = aui.m1 as usize;
    let m2 = aui.m2 as usize;
    let lam = aui.lambda as usize;
    let chunk = aui.segment_length as usize;

    if plan.tokens.len() != combined_vecs.len() || plan.tokens.len() != combined_proofs.len() {
        return false;
    }

    let cat_ids = aui.cat_ids();
    let total_pad = (m1 + m2) * chunk;

    // Per-record derived keys and pads, shared across tokens.
    let record_keys: Vec<Vec<u8>> = (1..=n)
        .map(|i| fc_eval(&keys.kv, i.to_string().as_bytes(), lam))
        .collect();
    let pads: Vec<Vec<u8>> = aui
        .ids
        .iter()
        .enumerate()
        .map(|(i, id)| f_expand(&keys.ke, format!("{}{}", i + 1, id).as_bytes(), total_pad))
        .collect();

    for (t, (kind, token)) in plan.tokens.iter().enumerate() {
        let (m, k) = match kind {
            TokenKind::Kw => (m2, aui.k_tex as usize),
            TokenKind::Spa => (m1, aui.k_spa as usize),
        };
        let selection = hash_positions(token, m, k);

        let mut fx_sum = vec![0u8; lam];
        let mut fx_pad_sum = vec![0u8; lam];
        for i in 0..n {
            if combined_vecs[t][i].len() != chunk {
                return false;
            }
            xor_in_place(&mut fx_sum, &fx(&record_keys[i], &combined_vecs[t][i], lam));

            let mut pad_acc = vec![0u8; chunk];
            for &j in &selection {
                let slot = match kind {
                    TokenKind::Kw => m1 + j,
                    TokenKind::Spa => j,
                };
                xor_in_place(&mut pad_acc, &pads[i][slot * chunk..(slot + 1) * chunk]);
            }
            xor_in_place(&mut fx_pad_sum, &fx(&record_keys[i], &pad_acc, lam));
        }

        // N_{S,ID}: keyed HMAC of every selected global column index.
        let mut nsid = vec![0u8; lam];
        for &j in &selection {
            let j_global = match kind {
                TokenKind::Kw => j + 1 + m1,
                TokenKind::Spa => j + 1,
            };
            let mut mac_input = j_global.to_string().into_bytes();
            mac_input.extend_from_slice(&cat_ids);
            xor_in_place(&mut nsid, &hmac_sha256(&keys.kh, &mac_input)[..lam]);
        }

        let mut expected = fx_sum;
        xor_in_place(&mut expected, &fx_pad_sum);
        xor_in_place(&mut expected, &nsid);
        if expected != combined_proofs[t] {
            log::warn!("proof mismatch for token {} ({:?})", t, kind);
            return false;
        }
    }
    true
}

/// Owner-side smoke check: recompute the expected keyword proofs directly
/// from the σ columns, without any shares or decryption.
///
/// Tokenization mirrors the planner's keyword path: whitespace split with
/// the raw query as fallback, truncated and dummy-padded to the fixed
/// block count under suppression padding.
pub fn recompute_expected_proofs(
    query: &str,
    aui: &Aui,
    suppression: &SuppressionParams,
) -> Vec<Vec<u8>> {
    let lam = aui.lambda as usize;
    let m2 = aui.m2 as usize;
    let k_tex = aui.k_tex as usize;

    let mut tokens: Vec<String> = query
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        tokens.push(query.to_string());
    }
    if suppression.enable_padding {
        let max_r = suppression.max_r_blocks as usize;
        tokens.truncate(max_r);
        tokens = pad_query_blocks(&tokens, max_r);
    }

    tokens
        .iter()
        .map(|tok| {
            let mut proof = vec![0u8; lam];
            for &j in &hash_positions(tok, m2, k_tex) {
                xor_in_place(&mut proof, &aui.i_tex.sigma[j]);
            }
            proof
        })
        .collect()
}
