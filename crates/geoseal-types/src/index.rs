//! The authenticated outsourced index (AUI) and the owner key tuple.
//!
//! The AUI is built once at setup, replicated verbatim to every CSP, and
//! never mutated afterwards. It carries everything a CSP needs to answer
//! bucketized column queries: both encrypted matrices with their σ tag
//! columns, the filter dimensions, the record id order, and the cuckoo
//! parameters the planner used. Keys never leave the owner/client.

use crate::config::CuckooParams;
use thiserror::Error;

/// Dimensional inconsistency inside an AUI. Always a bug, never user input.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("matrix {matrix} has {rows} rows, expected {expected}")]
    RowCount {
        matrix: &'static str,
        rows: usize,
        expected: usize,
    },

    #[error("matrix {matrix} row {row} has {cols} columns, expected {expected}")]
    ColCount {
        matrix: &'static str,
        row: usize,
        cols: usize,
        expected: usize,
    },

    #[error("matrix {matrix} cell ({row},{col}) is {len} bytes, expected {expected}")]
    CellLen {
        matrix: &'static str,
        row: usize,
        col: usize,
        len: usize,
        expected: usize,
    },

    #[error("matrix {matrix} has {tags} sigma tags, expected {expected}")]
    SigmaCount {
        matrix: &'static str,
        tags: usize,
        expected: usize,
    },

    #[error("matrix {matrix} sigma {col} is {len} bytes, expected {expected}")]
    SigmaLen {
        matrix: &'static str,
        col: usize,
        len: usize,
        expected: usize,
    },
}

/// One encrypted GBF matrix plus its per-column authentication tags.
///
/// `rows[i][j]` is record i's encrypted cell for column j (`chunk_len`
/// bytes); `sigma[j]` is the λ-byte aggregate tag for column j.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedMatrix {
    pub rows: Vec<Vec<Vec<u8>>>,
    pub sigma: Vec<Vec<u8>>,
}

impl EncryptedMatrix {
    fn check_shape(
        &self,
        name: &'static str,
        n: usize,
        m: usize,
        chunk_len: usize,
        lambda: usize,
    ) -> Result<(), ShapeError> {
        if self.rows.len() != n {
            return Err(ShapeError::RowCount {
                matrix: name,
                rows: self.rows.len(),
                expected: n,
            });
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != m {
                return Err(ShapeError::ColCount {
                    matrix: name,
                    row: i,
                    cols: row.len(),
                    expected: m,
                });
            }
            for (j, cell) in row.iter().enumerate() {
                if cell.len() != chunk_len {
                    return Err(ShapeError::CellLen {
                        matrix: name,
                        row: i,
                        col: j,
                        len: cell.len(),
                        expected: chunk_len,
                    });
                }
            }
        }
        if self.sigma.len() != m {
            return Err(ShapeError::SigmaCount {
                matrix: name,
                tags: self.sigma.len(),
                expected: m,
            });
        }
        for (j, tag) in self.sigma.iter().enumerate() {
            if tag.len() != lambda {
                return Err(ShapeError::SigmaLen {
                    matrix: name,
                    col: j,
                    len: tag.len(),
                    expected: lambda,
                });
            }
        }
        Ok(())
    }
}

/// The full authenticated outsourced index.
#[derive(Debug, Clone, PartialEq)]
pub struct Aui {
    /// Keyword matrix (EbW) and its tags.
    pub i_tex: EncryptedMatrix,
    /// Spatial matrix (Ebp) and its tags.
    pub i_spa: EncryptedMatrix,
    /// Spatial filter size m₁.
    pub m1: u32,
    /// Keyword filter size m₂.
    pub m2: u32,
    /// Security parameter λ in bytes.
    pub lambda: u32,
    /// GBF cell width in bytes (ψ / 8).
    pub segment_length: u32,
    /// Party count U.
    pub parties: u32,
    /// Record ids in row order. Row order is load-bearing everywhere.
    pub ids: Vec<String>,
    pub k_spa: u32,
    pub k_tex: u32,
    pub cuckoo_kw: CuckooParams,
    pub cuckoo_spa: CuckooParams,
}

impl Aui {
    /// Number of records (matrix rows).
    pub fn record_count(&self) -> usize {
        self.ids.len()
    }

    /// Concatenated record ids, the `cat_ids` input of every σ tag.
    pub fn cat_ids(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for id in &self.ids {
            out.extend_from_slice(id.as_bytes());
        }
        out
    }

    /// Check every dimensional invariant of the index.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let n = self.ids.len();
        let chunk = self.segment_length as usize;
        let lam = self.lambda as usize;
        self.i_spa
            .check_shape("I_spa", n, self.m1 as usize, chunk, lam)?;
        self.i_tex
            .check_shape("I_tex", n, self.m2 as usize, chunk, lam)?;
        Ok(())
    }
}

/// Owner key tuple (Kₑ, Kᵥ, K_h). Retained only by the client/owner.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyTuple {
    /// Pad-derivation key Kₑ.
    pub ke: Vec<u8>,
    /// Per-record key root Kᵥ.
    pub kv: Vec<u8>,
    /// Tag HMAC key K_h.
    pub kh: Vec<u8>,
}

impl std::fmt::Debug for KeyTuple {
    // Never print key material.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTuple")
            .field("ke", &format!("[{} bytes]", self.ke.len()))
            .field("kv", &format!("[{} bytes]", self.kv.len()))
            .field("kh", &format!("[{} bytes]", self.kh.len()))
            .finish()
    }
}
