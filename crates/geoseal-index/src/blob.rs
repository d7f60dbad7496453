//! Binary blob framing for the AUI and the owner key tuple.
//!
//! Length-prefixed big-endian framing with magic and version bytes.
//! Matrix bytes are stored raw because every dimension is known from the
//! header; only variable-length fields (seeds, ids, keys) carry a length.
//! Round-trip equality is guaranteed and covered by tests.

use crate::error::IndexError;
use geoseal_types::config::CuckooParams;
use geoseal_types::{Aui, EncryptedMatrix, KeyTuple};
use std::path::Path;

const AUI_MAGIC: &[u8; 4] = b"GSAI";
const KEY_MAGIC: &[u8; 4] = b"GSKY";
const VERSION: u8 = 1;

/// Upper bound on any single length-prefixed field.
const MAX_FIELD: u64 = 1 << 26;

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_bytes(out: &mut Vec<u8>, v: &[u8]) {
    put_u32(out, v.len() as u32);
    out.extend_from_slice(v);
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], IndexError> {
        let have = self.data.len() - self.pos;
        if have < n {
            return Err(IndexError::Truncated { need: n, have });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, IndexError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> Result<f64, IndexError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(f64::from_be_bytes(arr))
    }

    fn bytes(&mut self) -> Result<&'a [u8], IndexError> {
        let len = self.u32()? as u64;
        if len > MAX_FIELD {
            return Err(IndexError::FieldTooLarge(len));
        }
        self.take(len as usize)
    }

    fn string(&mut self, what: &'static str) -> Result<String, IndexError> {
        let raw = self.bytes()?;
        String::from_utf8(raw.to_vec()).map_err(|_| IndexError::InvalidUtf8(what))
    }

    fn finish(&self) -> Result<(), IndexError> {
        let rest = self.data.len() - self.pos;
        if rest != 0 {
            return Err(IndexError::TrailingBytes(rest));
        }
        Ok(())
    }
}

fn put_cuckoo(out: &mut Vec<u8>, ck: &CuckooParams) {
    put_u32(out, ck.kappa);
    out.extend_from_slice(&ck.load.to_be_bytes());
    put_bytes(out, ck.seed.as_bytes());
}

fn read_cuckoo(cur: &mut Cursor<'_>) -> Result<CuckooParams, IndexError> {
    Ok(CuckooParams {
        kappa: cur.u32()?,
        load: cur.f64()?,
        seed: cur.string("cuckoo seed")?,
    })
}

fn put_matrix(out: &mut Vec<u8>, m: &EncryptedMatrix) {
    for row in &m.rows {
        for cell in row {
            out.extend_from_slice(cell);
        }
    }
    for tag in &m.sigma {
        out.extend_from_slice(tag);
    }
}

fn read_matrix(
    cur: &mut Cursor<'_>,
    n: usize,
    cols: usize,
    chunk: usize,
    lambda: usize,
) -> Result<EncryptedMatrix, IndexError> {
    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
        let mut row = Vec::with_capacity(cols);
        for _ in 0..cols {
            row.push(cur.take(chunk)?.to_vec());
        }
        rows.push(row);
    }
    let mut sigma = Vec::with_capacity(cols);
    for _ in 0..cols {
        sigma.push(cur.take(lambda)?.to_vec());
    }
    Ok(EncryptedMatrix { rows, sigma })
}

/// Serialize an AUI into the `GSAI` blob format.
pub fn encode_aui(aui: &Aui) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(AUI_MAGIC);
    out.push(VERSION);
    put_u32(&mut out, aui.m1);
    put_u32(&mut out, aui.m2);
    put_u32(&mut out, aui.lambda);
    put_u32(&mut out, aui.segment_length);
    put_u32(&mut out, aui.parties);
    put_u32(&mut out, aui.k_spa);
    put_u32(&mut out, aui.k_tex);
    put_cuckoo(&mut out, &aui.cuckoo_kw);
    put_cuckoo(&mut out, &aui.cuckoo_spa);
    put_u32(&mut out, aui.ids.len() as u32);
    for id in &aui.ids {
        put_bytes(&mut out, id.as_bytes());
    }
    put_matrix(&mut out, &aui.i_spa);
    put_matrix(&mut out, &aui.i_tex);
    out
}

/// Parse a `GSAI` blob back into an AUI.
pub fn decode_aui(data: &[u8]) -> Result<Aui, IndexError> {
    let mut cur = Cursor::new(data);
    if cur.take(4)? != AUI_MAGIC {
        return Err(IndexError::BadMagic);
    }
    let version = cur.take(1)?[0];
    if version != VERSION {
        return Err(IndexError::UnsupportedVersion(version));
    }
    let m1 = cur.u32()?;
    let m2 = cur.u32()?;
    if m1 as u64 > MAX_FIELD || m2 as u64 > MAX_FIELD {
        return Err(IndexError::FieldTooLarge(m1.max(m2) as u64));
    }
    let lambda = cur.u32()?;
    let segment_length = cur.u32()?;
    let parties = cur.u32()?;
    let k_spa = cur.u32()?;
    let k_tex = cur.u32()?;
    let cuckoo_kw = read_cuckoo(&mut cur)?;
    let cuckoo_spa = read_cuckoo(&mut cur)?;

    let id_count = cur.u32()? as u64;
    if id_count > MAX_FIELD {
        return Err(IndexError::FieldTooLarge(id_count));
    }
    let mut ids = Vec::with_capacity(id_count as usize);
    for _ in 0..id_count {
        ids.push(cur.string("record id")?);
    }

    let n = ids.len();
    let chunk = segment_length as usize;
    let lam = lambda as usize;
    let i_spa = read_matrix(&mut cur, n, m1 as usize, chunk, lam)?;
    let i_tex = read_matrix(&mut cur, n, m2 as usize, chunk, lam)?;
    cur.finish()?;

    let aui = Aui {
        i_tex,
        i_spa,
        m1,
        m2,
        lambda,
        segment_length,
        parties,
        ids,
        k_spa,
        k_tex,
        cuckoo_kw,
        cuckoo_spa,
    };
    aui.check_shape()?;
    Ok(aui)
}

/// Serialize the owner key tuple into the `GSKY` blob format.
pub fn encode_keys(keys: &KeyTuple) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(KEY_MAGIC);
    out.push(VERSION);
    put_bytes(&mut out, &keys.ke);
    put_bytes(&mut out, &keys.kv);
    put_bytes(&mut out, &keys.kh);
    out
}

/// Parse a `GSKY` blob back into the key tuple.
pub fn decode_keys(data: &[u8]) -> Result<KeyTuple, IndexError> {
    let mut cur = Cursor::new(data);
    if cur.take(4)? != KEY_MAGIC {
        return Err(IndexError::BadMagic);
    }
    let version = cur.take(1)?[0];
    if version != VERSION {
        return Err(IndexError::UnsupportedVersion(version));
    }
    let ke = cur.bytes()?.to_vec();
    let kv = cur.bytes()?.to_vec();
    let kh = cur.bytes()?.to_vec();
    cur.finish()?;
    Ok(KeyTuple { ke, kv, kh })
}

/// Write an AUI blob to disk.
pub fn save_aui(path: impl AsRef<Path>, aui: &Aui) -> Result<(), IndexError> {
    std::fs::write(path, encode_aui(aui))?;
    Ok(())
}

/// Read an AUI blob from disk.
pub fn load_aui(path: impl AsRef<Path>) -> Result<Aui, IndexError> {
    decode_aui(&std::fs::read(path)?)
}

/// Write a key blob to disk.
pub fn save_keys(path: impl AsRef<Path>, keys: &KeyTuple) -> Result<(), IndexError> {
    std::fs::write(path, encode_keys(keys))?;
    Ok(())
}

/// Read a key blob from disk.
pub fn load_keys(path: impl AsRef<Path>) -> Result<KeyTuple, IndexError> {
    decode_keys(&std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_with_rng;
    use geoseal_types::{RawRecord, SearchConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn built() -> (Aui, KeyTuple) {
        let mut cfg = SearchConfig::default();
        cfg.spatial_bloom_filter.size = 32;
        cfg.keyword_bloom_filter.size = 48;
        let records = vec![
            RawRecord::new("A", 0.1, 0.1, "PARK CAFE"),
            RawRecord::new("B", 0.3, 0.1, "HOSPITAL"),
            RawRecord::new("C", 0.6, 0.6, "PARK SCHOOL"),
        ];
        setup_with_rng(&records, &cfg, &mut StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn test_aui_round_trip() {
        let (aui, _) = built();
        let blob = encode_aui(&aui);
        let back = decode_aui(&blob).unwrap();
        assert_eq!(back, aui);
    }

    #[test]
    fn test_keys_round_trip() {
        let (_, keys) = built();
        let back = decode_keys(&encode_keys(&keys)).unwrap();
        assert_eq!(back, keys);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let (aui, _) = built();
        let mut blob = encode_aui(&aui);
        blob[0] = b'X';
        assert!(matches!(decode_aui(&blob), Err(IndexError::BadMagic)));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let (aui, _) = built();
        let mut blob = encode_aui(&aui);
        blob[4] = 9;
        assert!(matches!(
            decode_aui(&blob),
            Err(IndexError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let (aui, _) = built();
        let blob = encode_aui(&aui);
        let cut = &blob[..blob.len() - 7];
        assert!(matches!(decode_aui(cut), Err(IndexError::Truncated { .. })));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let (aui, _) = built();
        let mut blob = encode_aui(&aui);
        blob.push(0);
        assert!(matches!(
            decode_aui(&blob),
            Err(IndexError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let (aui, keys) = built();
        let dir = tempfile::tempdir().unwrap();
        let aui_path = dir.path().join("aui.bin");
        let key_path = dir.path().join("keys.bin");
        save_aui(&aui_path, &aui).unwrap();
        save_keys(&key_path, &keys).unwrap();
        assert_eq!(load_aui(&aui_path).unwrap(), aui);
        assert_eq!(load_keys(&key_path).unwrap(), keys);
    }
}
