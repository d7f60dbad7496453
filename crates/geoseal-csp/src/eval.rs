//! Column-share evaluation.

use crate::error::CspError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geoseal_types::wire::{EvalResponse, TokenKind, TokenPayload};
use geoseal_types::Aui;

/// One party's aggregate for one token: a chunk share per record plus a
/// λ-byte proof share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenShare {
    pub vec: Vec<Vec<u8>>,
    pub proof: Vec<u8>,
}

fn xor_in_place(acc: &mut [u8], other: &[u8]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a ^= b;
    }
}

/// Evaluate every token payload against the index.
///
/// For each bucket, each locally-selected column is XOR-folded into the
/// per-record vector and its σ tag into the proof. Columns whose selection
/// bit is 0 are skipped; across all parties the bits XOR to all-ones per
/// bucket, so the combined result covers the full selection set.
pub fn evaluate(aui: &Aui, tokens: &[TokenPayload]) -> Result<Vec<TokenShare>, CspError> {
    let n = aui.record_count();
    let chunk = aui.segment_length as usize;
    let lam = aui.lambda as usize;

    let mut out = Vec::with_capacity(tokens.len());
    for (t, token) in tokens.iter().enumerate() {
        let (matrix, cols) = match token.kind {
            TokenKind::Kw => (&aui.i_tex, aui.m2),
            TokenKind::Spa => (&aui.i_spa, aui.m1),
        };

        let mut vec_total = vec![vec![0u8; chunk]; n];
        let mut proof_total = vec![0u8; lam];

        for (b, bucket) in token.buckets.iter().enumerate() {
            if bucket.bits.len() != bucket.columns.len() {
                return Err(CspError::BitsMismatch {
                    token: t,
                    bucket: b,
                    columns: bucket.columns.len(),
                    bits: bucket.bits.len(),
                });
            }
            for (&col, &bit) in bucket.columns.iter().zip(&bucket.bits) {
                if bit & 1 == 0 {
                    continue;
                }
                if col >= cols {
                    return Err(CspError::ColumnOutOfRange {
                        token: t,
                        col,
                        max: cols,
                    });
                }
                let col = col as usize;
                for (acc, row) in vec_total.iter_mut().zip(&matrix.rows) {
                    xor_in_place(acc, &row[col]);
                }
                xor_in_place(&mut proof_total, &matrix.sigma[col]);
            }
        }

        out.push(TokenShare {
            vec: vec_total,
            proof: proof_total,
        });
    }
    Ok(out)
}

/// Base64-encode token shares into the wire response.
pub fn encode_response(shares: &[TokenShare]) -> EvalResponse {
    EvalResponse {
        result_shares: shares
            .iter()
            .map(|s| s.vec.iter().map(|v| BASE64.encode(v)).collect())
            .collect(),
        proof_shares: shares.iter().map(|s| BASE64.encode(&s.proof)).collect(),
    }
}
