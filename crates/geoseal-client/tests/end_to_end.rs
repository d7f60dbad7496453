//! End-to-end scenarios over the full offline pipeline:
//! setup → plan → per-party evaluation → combine → decrypt → verify.

use geoseal_client::{
    combine_responses, decrypt_matches, plan_query, verify_fx_hmac, QueryPlan,
};
use geoseal_csp::{encode_response, evaluate};
use geoseal_index::blob;
use geoseal_index::setup_with_rng;
use geoseal_types::wire::EvalResponse;
use geoseal_types::{Aui, KeyTuple, RawRecord, SearchConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn demo_records() -> Vec<RawRecord> {
    vec![
        RawRecord::new("A", 0.1, 0.1, "PARK CAFE"),
        RawRecord::new("B", 0.3, 0.1, "HOSPITAL"),
        RawRecord::new("C", 0.6, 0.6, "PARK SCHOOL"),
    ]
}

fn demo_config(parties: u32) -> SearchConfig {
    let mut cfg = SearchConfig::default();
    cfg.parties = parties;
    cfg.spatial_bloom_filter.size = 64;
    cfg.keyword_bloom_filter.size = 64;
    cfg
}

fn demo_setup(parties: u32) -> (Aui, KeyTuple, SearchConfig) {
    let cfg = demo_config(parties);
    let mut rng = StdRng::seed_from_u64(0);
    let (aui, keys) = setup_with_rng(&demo_records(), &cfg, &mut rng).unwrap();
    (aui, keys, cfg)
}

fn eval_parties(plan: &QueryPlan, aui: &Aui) -> Vec<EvalResponse> {
    (0..plan.num_parties as usize)
        .map(|party| encode_response(&evaluate(aui, &plan.payloads[party]).unwrap()))
        .collect()
}

struct RunResult {
    hits: Vec<String>,
    verified: bool,
    proofs: Vec<Vec<u8>>,
}

fn run_query(query: &str, aui: &Aui, keys: &KeyTuple, cfg: &SearchConfig) -> RunResult {
    let plan = plan_query(query, aui, cfg).unwrap();
    let responses = eval_parties(&plan, aui);
    let (vecs, proofs) = combine_responses(&plan, &responses, aui).unwrap();
    let matches = decrypt_matches(&plan, &vecs, aui, keys);
    let verified = verify_fx_hmac(&plan, aui, keys, &vecs, &proofs);
    RunResult {
        hits: matches.hits,
        verified,
        proofs,
    }
}

#[test]
fn single_keyword_hits_both_parks() {
    let (aui, keys, cfg) = demo_setup(3);
    let out = run_query("PARK", &aui, &keys, &cfg);
    assert_eq!(out.hits, vec!["A", "C"]);
    assert!(out.verified);
}

#[test]
fn keyword_conjunction_narrows_to_one() {
    let (aui, keys, cfg) = demo_setup(3);
    let out = run_query("PARK CAFE", &aui, &keys, &cfg);
    assert_eq!(out.hits, vec!["A"]);
    assert!(out.verified);
}

#[test]
fn keyword_with_range_gates_spatially() {
    let (aui, keys, cfg) = demo_setup(3);
    let out = run_query("PARK; R: 0.0,0.0,0.5,0.5", &aui, &keys, &cfg);
    assert_eq!(out.hits, vec!["A"]);
    assert!(out.verified);
}

#[test]
fn range_only_query_returns_everything_inside() {
    let (aui, keys, cfg) = demo_setup(3);
    let out = run_query("; R: 0.0,0.0,0.9,0.9", &aui, &keys, &cfg);
    assert_eq!(out.hits, vec!["A", "B", "C"]);
    assert!(out.verified);
}

#[test]
fn reversed_range_is_equivalent() {
    let (aui, keys, cfg) = demo_setup(3);
    let fwd = run_query("; R: 0.0,0.0,0.9,0.9", &aui, &keys, &cfg);
    let rev = run_query("; R: 0.9,0.9,0.0,0.0", &aui, &keys, &cfg);
    assert_eq!(fwd.hits, rev.hits);
    assert_eq!(fwd.proofs, rev.proofs);
}

#[test]
fn tampered_matrix_cell_is_rejected() {
    let (mut aui, keys, cfg) = demo_setup(3);
    // Tamper a keyword cell the query selects with odd multiplicity.
    let positions = geoseal_crypto::gbf::hash_positions("PARK", 64, 4);
    let col = *positions
        .iter()
        .find(|&&p| positions.iter().filter(|&&q| q == p).count() % 2 == 1)
        .unwrap();
    aui.i_tex.rows[0][col][0] ^= 0x01;

    let out = run_query("PARK", &aui, &keys, &cfg);
    assert!(!out.verified, "tampering must be caught by FX+HMAC");
}

#[test]
fn tampered_sigma_is_rejected() {
    let (mut aui, keys, cfg) = demo_setup(3);
    // One selected tag only: flipping an even number of selected tags
    // identically would cancel in the XOR aggregate.
    let positions = geoseal_crypto::gbf::hash_positions("PARK", 64, 4);
    let col = *positions
        .iter()
        .find(|&&p| positions.iter().filter(|&&q| q == p).count() % 2 == 1)
        .unwrap();
    aui.i_tex.sigma[col][3] ^= 0xff;
    let out = run_query("PARK", &aui, &keys, &cfg);
    assert!(!out.verified);
}

#[test]
fn hits_are_independent_of_party_count() {
    let mut all_hits = Vec::new();
    for parties in [2u32, 3, 4] {
        let (aui, keys, cfg) = demo_setup(parties);
        assert_eq!(aui.parties, parties);
        let out = run_query("PARK; R: 0.0,0.0,0.9,0.9", &aui, &keys, &cfg);
        assert!(out.verified);
        all_hits.push(out.hits);
    }
    assert_eq!(all_hits[0], all_hits[1]);
    assert_eq!(all_hits[1], all_hits[2]);
}

#[test]
fn blob_round_trip_preserves_hits_and_proofs() {
    let (aui, keys, cfg) = demo_setup(3);
    let restored_aui = blob::decode_aui(&blob::encode_aui(&aui)).unwrap();
    let restored_keys = blob::decode_keys(&blob::encode_keys(&keys)).unwrap();

    let direct = run_query("PARK CAFE", &aui, &keys, &cfg);
    let restored = run_query("PARK CAFE", &restored_aui, &restored_keys, &cfg);
    assert_eq!(direct.hits, restored.hits);
    assert_eq!(direct.proofs, restored.proofs);
    assert!(restored.verified);
}

#[test]
fn single_record_corpus_still_works() {
    // Degenerate corpus: one record, one keyword.
    let cfg = demo_config(3);
    let records = vec![RawRecord::new("X", 0.1, 0.1, "SOLO")];
    let mut rng = StdRng::seed_from_u64(0);
    let (aui, keys) = setup_with_rng(&records, &cfg, &mut rng).unwrap();
    let out = run_query("SOLO", &aui, &keys, &cfg);
    assert_eq!(out.hits, vec!["X"]);
    assert!(out.verified);
}

#[test]
fn colluding_share_bits_stay_balanced() {
    // Two of three parties pooling their DMPF bits see the XOR of two
    // hash-derived bit streams; over many buckets it must stay close to
    // uniform. Fully deterministic.
    let (aui, _, cfg) = demo_setup(3);
    let mut ones = 0usize;
    let mut total = 0usize;
    for word in 0..500 {
        let token = format!("T{}", word);
        let plan = plan_query(&token, &aui, &cfg).unwrap();
        for (b0, b1) in plan.payloads[0][0]
            .buckets
            .iter()
            .zip(&plan.payloads[1][0].buckets)
        {
            for (x, y) in b0.bits.iter().zip(&b1.bits) {
                ones += usize::from((x ^ y) & 1 == 1);
                total += 1;
            }
        }
    }
    let ratio = ones as f64 / total as f64;
    assert!(
        (0.44..=0.56).contains(&ratio),
        "colluded bit ratio {ratio} (n={total})"
    );
}
