//! Offline setup: GBF encoding, pad encryption, key schedule, column tags.

use crate::error::IndexError;
use geoseal_crypto::gbf::GarbledBloomFilter;
use geoseal_crypto::prf::{f_expand, fc_cons, fc_eval, fx, hmac_sha256, xor_bytes, xor_in_place};
use geoseal_types::text::tokenize_normalized;
use geoseal_types::{Aui, EncryptedMatrix, KeyTuple, RawRecord, SearchConfig};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// A record with its two garbled Bloom filters built.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    pub id: String,
    pub spatial_gbf: GarbledBloomFilter,
    pub keyword_gbf: GarbledBloomFilter,
}

/// Build both filters for one record.
///
/// The spatial filter holds the exact-coordinate token and the grid cell
/// token; the keyword filter holds every normalized keyword token.
pub fn encode_record<R: RngCore + CryptoRng>(
    record: &RawRecord,
    config: &SearchConfig,
    rng: &mut R,
) -> EncodedRecord {
    let sp = &config.spatial_bloom_filter;
    let kp = &config.keyword_bloom_filter;

    let mut spatial_gbf = GarbledBloomFilter::new(
        sp.size as usize,
        sp.hash_count as usize,
        sp.psi as usize,
    );
    spatial_gbf.add(&record.coord_token(), rng);
    spatial_gbf.add(&record.cell_token(&config.spatial_grid), rng);

    let mut keyword_gbf = GarbledBloomFilter::new(
        kp.size as usize,
        kp.hash_count as usize,
        kp.psi as usize,
    );
    for token in tokenize_normalized(&record.keywords) {
        keyword_gbf.add(&token, rng);
    }

    EncodedRecord {
        id: record.id.clone(),
        spatial_gbf,
        keyword_gbf,
    }
}

/// σ for one column: XOR of per-record FX over the raw cells, masked by
/// the keyed HMAC of the 1-based global column index and the id string.
fn column_tag(
    record_keys: &[Vec<u8>],
    column: &[&[u8]],
    j_global: usize,
    kh: &[u8],
    cat_ids: &[u8],
    lam: usize,
) -> Vec<u8> {
    let mut acc = vec![0u8; lam];
    for (key, cell) in record_keys.iter().zip(column) {
        xor_in_place(&mut acc, &fx(key, cell, lam));
    }
    let mut mac_input = j_global.to_string().into_bytes();
    mac_input.extend_from_slice(cat_ids);
    let mac = hmac_sha256(kh, &mac_input);
    xor_in_place(&mut acc, &mac[..lam]);
    acc
}

/// ⌈log₂ n⌉ for n ≥ 1.
fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Run setup with the OS random source.
pub fn setup(records: &[RawRecord], config: &SearchConfig) -> Result<(Aui, KeyTuple), IndexError> {
    setup_with_rng(records, config, &mut OsRng)
}

/// Run setup with a caller-supplied cryptographic RNG.
///
/// Builds the authenticated outsourced index and the owner key tuple:
///
/// 1. encode every record into its two GBFs;
/// 2. sample master keys Kₑ, K_h, K_main;
/// 3. one-time-pad encrypt each record's cells, spatial cells in pad slots
///    `[0, m₁)` and keyword cells in `[m₁, m₁+m₂)`;
/// 4. constrain K_main by a random prefix into Kᵥ and derive per-record
///    keys Kᵢ = FC_eval(Kᵥ, i);
/// 5. tag every column with `(⊕ᵢ FX(Kᵢ, cellᵢⱼ)) ⊕ HMAC(K_h, j_global ‖ ids)`.
pub fn setup_with_rng<R: RngCore + CryptoRng>(
    records: &[RawRecord],
    config: &SearchConfig,
    rng: &mut R,
) -> Result<(Aui, KeyTuple), IndexError> {
    config.validate()?;
    if config.spatial_bloom_filter.psi != config.keyword_bloom_filter.psi {
        return Err(IndexError::PsiMismatch {
            spatial: config.spatial_bloom_filter.psi,
            keyword: config.keyword_bloom_filter.psi,
        });
    }

    let n = records.len();
    let lam = config.lambda as usize;
    let m1 = config.spatial_bloom_filter.size as usize;
    let m2 = config.keyword_bloom_filter.size as usize;
    let chunk_len = config.keyword_bloom_filter.chunk_len();

    log::info!("setup: {} records, m1={}, m2={}, U={}", n, m1, m2, config.parties);

    let encoded: Vec<EncodedRecord> = records
        .iter()
        .map(|r| encode_record(r, config, rng))
        .collect();

    // Master keys.
    let mut ke = vec![0u8; lam];
    let mut kh = vec![0u8; lam];
    let mut k_main = vec![0u8; lam];
    rng.fill_bytes(&mut ke);
    rng.fill_bytes(&mut kh);
    rng.fill_bytes(&mut k_main);

    // One-time-pad encryption of both matrices. Row i's pad covers the
    // spatial cells first, then the keyword cells.
    let total_pad_len = (m1 + m2) * chunk_len;
    let mut enc_spa = Vec::with_capacity(n);
    let mut enc_tex = Vec::with_capacity(n);
    for (idx, rec) in encoded.iter().enumerate() {
        let row_index = idx + 1;
        let pad_input = format!("{}{}", row_index, rec.id);
        let pad = f_expand(&ke, pad_input.as_bytes(), total_pad_len);

        let mut row_spa = Vec::with_capacity(m1);
        for (j, cell) in rec.spatial_gbf.array.iter().enumerate() {
            row_spa.push(xor_bytes(cell, &pad[j * chunk_len..(j + 1) * chunk_len]));
        }
        let mut row_tex = Vec::with_capacity(m2);
        for (j, cell) in rec.keyword_gbf.array.iter().enumerate() {
            let start = (m1 + j) * chunk_len;
            row_tex.push(xor_bytes(cell, &pad[start..start + chunk_len]));
        }
        enc_spa.push(row_spa);
        enc_tex.push(row_tex);
    }

    // Constrained per-record key root: Kᵥ = FC_cons(K_main, v) with a
    // random prefix v of s − ⌈log₂ n⌉ bits, rounded up to bytes.
    let prefix_bits = (config.s as usize).saturating_sub(ceil_log2(n.max(1)) as usize);
    let prefix_bytes = prefix_bits.div_ceil(8);
    let mut v = vec![0u8; prefix_bytes];
    rng.fill_bytes(&mut v);
    let kv = fc_cons(&k_main, &v, lam);

    let record_keys: Vec<Vec<u8>> = (1..=n)
        .map(|i| fc_eval(&kv, i.to_string().as_bytes(), lam))
        .collect();

    // Column tags over the *raw* (pre-encryption) cells.
    let cat_ids: Vec<u8> = encoded.iter().flat_map(|r| r.id.bytes()).collect();

    let mut sigma_spa = Vec::with_capacity(m1);
    for j in 0..m1 {
        let column: Vec<&[u8]> = encoded
            .iter()
            .map(|r| r.spatial_gbf.array[j].as_slice())
            .collect();
        sigma_spa.push(column_tag(&record_keys, &column, j + 1, &kh, &cat_ids, lam));
    }
    let mut sigma_tex = Vec::with_capacity(m2);
    for j in 0..m2 {
        let column: Vec<&[u8]> = encoded
            .iter()
            .map(|r| r.keyword_gbf.array[j].as_slice())
            .collect();
        sigma_tex.push(column_tag(&record_keys, &column, j + 1 + m1, &kh, &cat_ids, lam));
    }

    let aui = Aui {
        i_tex: EncryptedMatrix {
            rows: enc_tex,
            sigma: sigma_tex,
        },
        i_spa: EncryptedMatrix {
            rows: enc_spa,
            sigma: sigma_spa,
        },
        m1: m1 as u32,
        m2: m2 as u32,
        lambda: config.lambda,
        segment_length: chunk_len as u32,
        parties: config.parties,
        ids: records.iter().map(|r| r.id.clone()).collect(),
        k_spa: config.spatial_bloom_filter.hash_count,
        k_tex: config.keyword_bloom_filter.hash_count,
        cuckoo_kw: config.cuckoo.keyword(),
        cuckoo_spa: config.cuckoo.spatial(),
    };
    aui.check_shape()?;

    let keys = KeyTuple { ke, kv, kh };
    Ok((aui, keys))
}
