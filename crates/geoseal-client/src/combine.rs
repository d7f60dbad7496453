//! XOR-combination of per-party CSP responses.

use crate::error::ClientError;
use crate::plan::QueryPlan;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geoseal_types::wire::EvalResponse;
use geoseal_types::Aui;

/// Combined vectors (`[token][record]` chunk bytes) and proofs
/// (`[token]` λ bytes).
pub type Combined = (Vec<Vec<Vec<u8>>>, Vec<Vec<u8>>);

fn xor_in_place(acc: &mut [u8], other: &[u8]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a ^= b;
    }
}

/// XOR all parties' shares together.
///
/// Every party must answer with exactly the planned token count and the
/// AUI's record count. A missing share makes the XOR reconstruction
/// meaningless, so any mismatch fails the whole query.
pub fn combine_responses(
    plan: &QueryPlan,
    responses: &[EvalResponse],
    aui: &Aui,
) -> Result<Combined, ClientError> {
    if responses.len() != plan.num_parties as usize {
        return Err(ClientError::PartyCount {
            expected: plan.num_parties as usize,
            got: responses.len(),
        });
    }

    let n = aui.record_count();
    let chunk = aui.segment_length as usize;
    let lam = aui.lambda as usize;
    let token_count = plan.token_count();

    let mut vecs = vec![vec![vec![0u8; chunk]; n]; token_count];
    let mut proofs = vec![vec![0u8; lam]; token_count];

    for (party, resp) in responses.iter().enumerate() {
        if resp.result_shares.len() != token_count || resp.proof_shares.len() != token_count {
            return Err(ClientError::TokenCount {
                party,
                got: resp.result_shares.len().min(resp.proof_shares.len()),
                expected: token_count,
            });
        }
        for (t, token_shares) in resp.result_shares.iter().enumerate() {
            if token_shares.len() != n {
                return Err(ClientError::ShareLength {
                    token: t,
                    record: token_shares.len(),
                    got: token_shares.len(),
                    expected: n,
                });
            }
            for (i, share_b64) in token_shares.iter().enumerate() {
                let share = BASE64.decode(share_b64)?;
                if share.len() != chunk {
                    return Err(ClientError::ShareLength {
                        token: t,
                        record: i,
                        got: share.len(),
                        expected: chunk,
                    });
                }
                xor_in_place(&mut vecs[t][i], &share);
            }
            let proof = BASE64.decode(&resp.proof_shares[t])?;
            if proof.len() != lam {
                return Err(ClientError::ProofLength {
                    token: t,
                    got: proof.len(),
                    expected: lam,
                });
            }
            xor_in_place(&mut proofs[t], &proof);
        }
    }

    Ok((vecs, proofs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_query;
    use geoseal_csp::{encode_response, evaluate};
    use geoseal_index::setup_with_rng;
    use geoseal_types::wire::EvalRequest;
    use geoseal_types::{RawRecord, SearchConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn built() -> (Aui, SearchConfig) {
        let mut cfg = SearchConfig::default();
        cfg.spatial_bloom_filter.size = 64;
        cfg.keyword_bloom_filter.size = 64;
        let records = vec![
            RawRecord::new("A", 0.1, 0.1, "PARK CAFE"),
            RawRecord::new("B", 0.3, 0.1, "HOSPITAL"),
        ];
        let (aui, _) = setup_with_rng(&records, &cfg, &mut StdRng::seed_from_u64(0)).unwrap();
        (aui, cfg)
    }

    fn eval_all(plan: &QueryPlan, aui: &Aui) -> Vec<EvalResponse> {
        (0..plan.num_parties as usize)
            .map(|party| {
                let req = EvalRequest {
                    party_id: party as u32,
                    tokens: plan.payloads[party].clone(),
                    security_param: plan.security_param,
                };
                encode_response(&evaluate(aui, &req.tokens).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_combined_equals_full_column_xor() {
        let (aui, cfg) = built();
        let plan = plan_query("PARK", &aui, &cfg).unwrap();
        let responses = eval_all(&plan, &aui);
        let (vecs, proofs) = combine_responses(&plan, &responses, &aui).unwrap();

        // The combined vector must be the XOR of the encrypted cells at
        // the token's selection positions (all bucket columns).
        let positions = geoseal_crypto::gbf::hash_positions("PARK", 64, 4);
        for i in 0..2 {
            let mut expected = vec![0u8; 4];
            for &p in &positions {
                xor_in_place(&mut expected, &aui.i_tex.rows[i][p]);
            }
            assert_eq!(vecs[0][i], expected);
        }
        let mut expected_proof = vec![0u8; 16];
        for &p in &positions {
            xor_in_place(&mut expected_proof, &aui.i_tex.sigma[p]);
        }
        assert_eq!(proofs[0], expected_proof);
    }

    #[test]
    fn test_missing_party_rejected() {
        let (aui, cfg) = built();
        let plan = plan_query("PARK", &aui, &cfg).unwrap();
        let mut responses = eval_all(&plan, &aui);
        responses.pop();
        assert!(matches!(
            combine_responses(&plan, &responses, &aui),
            Err(ClientError::PartyCount { .. })
        ));
    }

    #[test]
    fn test_short_share_rejected() {
        let (aui, cfg) = built();
        let plan = plan_query("PARK", &aui, &cfg).unwrap();
        let mut responses = eval_all(&plan, &aui);
        responses[1].result_shares[0][0] = BASE64.encode([0u8; 3]);
        assert!(matches!(
            combine_responses(&plan, &responses, &aui),
            Err(ClientError::ShareLength { .. })
        ));
    }

    #[test]
    fn test_wrong_token_count_rejected() {
        let (aui, cfg) = built();
        let plan = plan_query("PARK", &aui, &cfg).unwrap();
        let mut responses = eval_all(&plan, &aui);
        responses[0].result_shares.clear();
        assert!(matches!(
            combine_responses(&plan, &responses, &aui),
            Err(ClientError::TokenCount { party: 0, .. })
        ));
    }
}
