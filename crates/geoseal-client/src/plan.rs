//! Query parsing and per-party payload planning.

use crate::error::ClientError;
use geoseal_crypto::cuckoo::{bucket_count, bucketize};
use geoseal_crypto::dmpf;
use geoseal_crypto::gbf::hash_positions;
use geoseal_types::config::CuckooParams;
use geoseal_types::text::{pad_query_blocks, tokenize_normalized};
use geoseal_types::wire::{BucketPayload, TokenKind, TokenPayload};
use geoseal_types::{Aui, GridParams, SearchConfig};

/// A fully planned query: the ordered token list and one payload vector
/// per party. All parties share the same bucket columns; only the
/// selection bits differ.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub query: String,
    /// Keyword tokens first (real, then arity-padding dummies), then
    /// spatial cells, planner emission order.
    pub tokens: Vec<(TokenKind, String)>,
    /// `payloads[party][token]`.
    pub payloads: Vec<Vec<TokenPayload>>,
    /// The keyword tokens that participate in matching. Dummy padding
    /// blocks sit in `tokens` after these and are skipped by the gate.
    pub keyword_tokens: Vec<String>,
    pub spatial_tokens: Vec<String>,
    pub security_param: u32,
    pub num_parties: u32,
}

impl QueryPlan {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Expand the `R:` range segment of a query into grid cell tokens.
///
/// Reversed bounds are normalized, so `R: 0.9,0.9,0.0,0.0` covers the
/// same cells as the ascending form. A malformed range yields no cells.
pub fn extract_spatial_cells(query: &str, grid: &GridParams) -> Vec<String> {
    let Some((_, range)) = query.split_once("R:") else {
        return Vec::new();
    };
    let parts: Vec<f64> = range
        .replace(';', " ")
        .replace(',', " ")
        .split_whitespace()
        .take(4)
        .filter_map(|p| p.parse().ok())
        .collect();
    if parts.len() < 4 {
        log::warn!("ignoring malformed spatial range: {:?}", range);
        return Vec::new();
    }
    let (lat_min, lon_min, lat_max, lon_max) = (parts[0], parts[1], parts[2], parts[3]);

    let (r0, r1) = cell_span(lat_min, lat_max, grid.cell_size_lat);
    let (c0, c1) = cell_span(lon_min, lon_max, grid.cell_size_lon);

    let mut cells = Vec::new();
    for r in r0..=r1 {
        for c in c0..=c1 {
            cells.push(format!("CELL:R{}_C{}", r, c));
        }
    }
    cells
}

/// Inclusive cell index span covered by `[a, b]` (bounds in either order).
///
/// Cells are half-open `[c·step, (c+1)·step)`: when the upper bound sits
/// exactly on a cell boundary it only touches the next cell's edge, so
/// that cell is excluded.
fn cell_span(a: f64, b: f64, step: f64) -> (i64, i64) {
    let lo = a.min(b);
    let hi = a.max(b);
    let first = (lo / step).floor() as i64;
    let mut last = (hi / step).floor() as i64;
    if hi % step == 0.0 && last > first {
        last -= 1;
    }
    (first, last)
}

/// Bucketize one token's selection set and generate all parties' DMPF
/// selection bits per bucket.
fn token_payloads(
    token: &str,
    kind: TokenKind,
    aui: &Aui,
    ck: &CuckooParams,
    num_parties: usize,
) -> Vec<TokenPayload> {
    let (m, k) = match kind {
        TokenKind::Kw => (aui.m2 as usize, aui.k_tex as usize),
        TokenKind::Spa => (aui.m1 as usize, aui.k_spa as usize),
    };
    let selection = hash_positions(token, m, k);
    let kappa = (ck.kappa as usize).min(k);
    let buckets = bucketize(
        &selection,
        m,
        kappa,
        bucket_count(ck.load, selection.len()),
        ck.seed.as_bytes(),
    );

    let mut payloads = vec![
        TokenPayload {
            kind,
            buckets: Vec::with_capacity(buckets.len()),
        };
        num_parties
    ];
    for cols in buckets.values() {
        // Every local position is selected; the DMPF splits the all-ones
        // vector into per-party pseudorandom bit shares.
        let domain: Vec<usize> = (0..cols.len()).collect();
        let keys = dmpf::gen(aui.lambda as usize, &domain, cols.len(), num_parties);
        for (party, payload) in payloads.iter_mut().enumerate() {
            payload.buckets.push(BucketPayload {
                columns: cols.iter().map(|&c| c as u32).collect(),
                bits: (0..cols.len()).map(|j| keys[party].eval(j)).collect(),
            });
        }
    }
    payloads
}

/// Plan a query against the AUI parameters.
///
/// The keyword segment (everything before an optional `R:`) is normalized
/// and tokenized; the range segment expands into grid cells. An empty
/// keyword segment gates on cells alone when a range is present, and
/// falls back to the raw query string as a single token otherwise.
///
/// Under suppression padding the keyword block list is truncated to
/// `max_r_blocks` and filled with `DUMMY:{i}` tokens, so every keyword
/// query dispatches the same block count. Dummies are evaluated and
/// verified like any other token; only the match gate skips them.
pub fn plan_query(
    query: &str,
    aui: &Aui,
    config: &SearchConfig,
) -> Result<QueryPlan, ClientError> {
    config.validate()?;
    aui.check_shape()?;

    let kw_text = query.split_once("R:").map_or(query, |(head, _)| head);
    let mut keyword_tokens = tokenize_normalized(kw_text);
    let spatial_tokens = extract_spatial_cells(query, &config.spatial_grid);
    if keyword_tokens.is_empty() && spatial_tokens.is_empty() {
        keyword_tokens.push(query.to_string());
    }

    let dispatched_kw = if config.suppression.enable_padding && !keyword_tokens.is_empty() {
        let max_r = config.suppression.max_r_blocks as usize;
        keyword_tokens.truncate(max_r);
        pad_query_blocks(&keyword_tokens, max_r)
    } else {
        keyword_tokens.clone()
    };

    let mut tokens: Vec<(TokenKind, String)> = dispatched_kw
        .into_iter()
        .map(|t| (TokenKind::Kw, t))
        .collect();
    tokens.extend(spatial_tokens.iter().map(|c| (TokenKind::Spa, c.clone())));

    let num_parties = aui.parties as usize;
    let mut payloads: Vec<Vec<TokenPayload>> = vec![Vec::with_capacity(tokens.len()); num_parties];
    for (kind, token) in &tokens {
        let ck = match kind {
            TokenKind::Kw => &aui.cuckoo_kw,
            TokenKind::Spa => &aui.cuckoo_spa,
        };
        let per_party = token_payloads(token, *kind, aui, ck, num_parties);
        for (party, payload) in per_party.into_iter().enumerate() {
            payloads[party].push(payload);
        }
    }

    log::debug!(
        "planned query: {} keyword tokens, {} cells, {} parties",
        keyword_tokens.len(),
        spatial_tokens.len(),
        num_parties
    );

    Ok(QueryPlan {
        query: query.to_string(),
        tokens,
        payloads,
        keyword_tokens,
        spatial_tokens,
        security_param: aui.lambda,
        num_parties: aui.parties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoseal_index::setup_with_rng;
    use geoseal_types::RawRecord;
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

    #[test]
    fn test_cells_cover_range() {
        let grid = GridParams::default();
        let cells = extract_spatial_cells("PARK; R: 0.0,0.0,0.9,0.9", &grid);
        assert_eq!(
            cells,
            vec!["CELL:R0_C0", "CELL:R0_C1", "CELL:R1_C0", "CELL:R1_C1"]
        );
    }

    #[test]
    fn test_boundary_max_excludes_upper_cell() {
        // A range ending exactly on a cell boundary only touches the next
        // cell's edge and must not include it.
        let grid = GridParams::default();
        let cells = extract_spatial_cells("R: 0.0,0.0,0.5,0.5", &grid);
        assert_eq!(cells, vec!["CELL:R0_C0"]);

        // Degenerate boundary point still maps to one cell.
        let point = extract_spatial_cells("R: 0.5,0.5,0.5,0.5", &grid);
        assert_eq!(point, vec!["CELL:R1_C1"]);
    }

    #[test]
    fn test_reversed_range_normalized() {
        let grid = GridParams::default();
        let fwd = extract_spatial_cells("R: 0.0,0.0,0.9,0.9", &grid);
        let rev = extract_spatial_cells("R: 0.9,0.9,0.0,0.0", &grid);
        assert_eq!(fwd, rev);
    }

    #[test]
    fn test_malformed_range_yields_no_cells() {
        let grid = GridParams::default();
        assert!(extract_spatial_cells("PARK R: 1.0,2.0", &grid).is_empty());
        assert!(extract_spatial_cells("PARK R: a,b,c,d", &grid).is_empty());
        assert!(extract_spatial_cells("PARK", &grid).is_empty());
    }

    #[test]
    fn test_plan_orders_kw_before_spa() {
        let (aui, cfg) = built();
        let plan = plan_query("PARK CAFE; R: 0.0,0.0,0.4,0.4", &aui, &cfg).unwrap();
        assert_eq!(
            plan.tokens,
            vec![
                (TokenKind::Kw, "PARK".to_string()),
                (TokenKind::Kw, "CAFE".to_string()),
                (TokenKind::Kw, "DUMMY:0".to_string()),
                (TokenKind::Kw, "DUMMY:1".to_string()),
                (TokenKind::Spa, "CELL:R0_C0".to_string()),
            ]
        );
        assert_eq!(plan.keyword_tokens, vec!["PARK", "CAFE"]);
        assert_eq!(plan.payloads.len(), 3);
        for payload in &plan.payloads {
            assert_eq!(payload.len(), 5);
        }
    }

    #[test]
    fn test_padding_fixes_keyword_arity() {
        let (aui, cfg) = built();
        // One real token and six real tokens dispatch the same block count.
        let short = plan_query("PARK", &aui, &cfg).unwrap();
        let long = plan_query("A B C D E F", &aui, &cfg).unwrap();
        assert_eq!(short.tokens.len(), 4);
        assert_eq!(long.tokens.len(), 4);
        assert_eq!(short.keyword_tokens, vec!["PARK"]);
        assert_eq!(long.keyword_tokens.len(), 4);
    }

    #[test]
    fn test_padding_disabled_leaves_tokens_alone() {
        let (aui, mut cfg) = built();
        cfg.suppression.enable_padding = false;
        let plan = plan_query("PARK CAFE", &aui, &cfg).unwrap();
        assert_eq!(
            plan.tokens,
            vec![
                (TokenKind::Kw, "PARK".to_string()),
                (TokenKind::Kw, "CAFE".to_string()),
            ]
        );
    }

    #[test]
    fn test_spatial_only_query_has_no_kw_tokens() {
        let (aui, cfg) = built();
        let plan = plan_query("; R: 0.0,0.0,0.4,0.4", &aui, &cfg).unwrap();
        assert!(plan.keyword_tokens.is_empty());
        assert_eq!(plan.tokens.len(), 1);
        assert_eq!(plan.tokens[0].0, TokenKind::Spa);
    }

    #[test]
    fn test_unparseable_keyword_falls_back_to_raw_query() {
        let (aui, cfg) = built();
        let plan = plan_query("###", &aui, &cfg).unwrap();
        assert_eq!(plan.keyword_tokens, vec!["###"]);
        assert_eq!(plan.tokens[0], (TokenKind::Kw, "###".to_string()));
        // Padded to the fixed block count like any keyword query.
        assert_eq!(plan.tokens.len(), 4);
        assert_eq!(plan.tokens[1], (TokenKind::Kw, "DUMMY:0".to_string()));
    }

    #[test]
    fn test_suppression_truncates_tokens() {
        let (aui, cfg) = built();
        let plan = plan_query("A B C D E F", &aui, &cfg).unwrap();
        assert_eq!(plan.keyword_tokens.len(), 4);
    }

    #[test]
    fn test_parties_share_columns_and_split_bits() {
        let (aui, cfg) = built();
        let plan = plan_query("PARK", &aui, &cfg).unwrap();
        let toks: Vec<&TokenPayload> = plan.payloads.iter().map(|p| &p[0]).collect();

        for bucket_idx in 0..toks[0].buckets.len() {
            let columns = &toks[0].buckets[bucket_idx].columns;
            let mut combined = vec![0u8; columns.len()];
            for tok in &toks {
                assert_eq!(&tok.buckets[bucket_idx].columns, columns);
                for (acc, &bit) in combined.iter_mut().zip(&tok.buckets[bucket_idx].bits) {
                    *acc ^= bit;
                }
            }
            // All local positions selected once the parties combine.
            assert!(combined.iter().all(|&b| b == 1));
        }

        // Union of bucket columns is the token's selection set.
        let mut all_cols: Vec<u32> = toks[0]
            .buckets
            .iter()
            .flat_map(|b| b.columns.iter().copied())
            .collect();
        all_cols.sort_unstable();
        let mut expected: Vec<u32> = hash_positions("PARK", 64, 4)
            .into_iter()
            .map(|p| p as u32)
            .collect();
        expected.sort_unstable();
        assert_eq!(all_cols, expected);
    }
}
