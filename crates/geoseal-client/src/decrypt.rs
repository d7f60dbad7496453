//! Pad removal and conjunctive matching.

use crate::plan::QueryPlan;
use geoseal_crypto::gbf::{fingerprint, hash_positions};
use geoseal_crypto::prf::{f_expand, xor_in_place};
use geoseal_types::wire::TokenKind;
use geoseal_types::{Aui, KeyTuple};

/// Match result: the per-record flags and the surviving record ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub flags: Vec<bool>,
    pub hits: Vec<String>,
}

/// Derive every record's full one-time pad.
fn record_pads(aui: &Aui, keys: &KeyTuple) -> Vec<Vec<u8>> {
    let total = (aui.m1 as usize + aui.m2 as usize) * aui.segment_length as usize;
    aui.ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let input = format!("{}{}", i + 1, id);
            f_expand(&keys.ke, input.as_bytes(), total)
        })
        .collect()
}

/// Accumulated pad slice for one record over a token's selection set.
///
/// Keyword tokens live in the pad's upper slots (offset m₁·chunk);
/// spatial tokens in the lower slots (offset 0).
fn pad_accumulator(
    pad: &[u8],
    selection: &[usize],
    kind: TokenKind,
    m1: usize,
    chunk: usize,
) -> Vec<u8> {
    let mut acc = vec![0u8; chunk];
    for &j in selection {
        let slot = match kind {
            TokenKind::Kw => m1 + j,
            TokenKind::Spa => j,
        };
        xor_in_place(&mut acc, &pad[slot * chunk..(slot + 1) * chunk]);
    }
    acc
}

/// Decrypt the combined vectors and apply the match semantics:
/// every keyword token must reconstruct its fingerprint (AND), at least
/// one spatial cell must reconstruct its fingerprint (OR), and the final
/// hit set is the conjunction of both gates. Arity-padding dummy blocks
/// are skipped; they exist only to fix the dispatched block count.
pub fn decrypt_matches(
    plan: &QueryPlan,
    combined_vecs: &[Vec<Vec<u8>>],
    aui: &Aui,
    keys: &KeyTuple,
) -> MatchOutcome {
    let n = aui.record_count();
    let m1 = aui.m1 as usize;
    let m2 = aui.m2 as usize;
    let chunk = aui.segment_length as usize;
    let k_tex = aui.k_tex as usize;
    let k_spa = aui.k_spa as usize;

    let pads = record_pads(aui, keys);

    let mut keyword_ok = vec![true; n];
    let mut spatial_ok = vec![plan.spatial_tokens.is_empty(); n];

    for (t, (kind, token)) in plan.tokens.iter().enumerate() {
        // Keyword tokens past the real list are suppression dummies.
        if *kind == TokenKind::Kw && t >= plan.keyword_tokens.len() {
            continue;
        }
        let (m, k) = match kind {
            TokenKind::Kw => (m2, k_tex),
            TokenKind::Spa => (m1, k_spa),
        };
        let selection = hash_positions(token, m, k);
        let fp = fingerprint(token, chunk * 8);

        for i in 0..n {
            let pad_acc = pad_accumulator(&pads[i], &selection, *kind, m1, chunk);
            let mut plain = combined_vecs[t][i].clone();
            xor_in_place(&mut plain, &pad_acc);
            match kind {
                TokenKind::Kw => keyword_ok[i] &= plain == fp,
                TokenKind::Spa => spatial_ok[i] |= plain == fp,
            }
        }
    }

    let flags: Vec<bool> = keyword_ok
        .iter()
        .zip(&spatial_ok)
        .map(|(&kw, &spa)| kw && spa)
        .collect();
    let hits = aui
        .ids
        .iter()
        .zip(&flags)
        .filter(|(_, &hit)| hit)
        .map(|(id, _)| id.clone())
        .collect();

    MatchOutcome { flags, hits }
}
