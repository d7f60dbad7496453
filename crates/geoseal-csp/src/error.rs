//! CSP error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CspError {
    #[error("no index loaded")]
    NoIndex,

    #[error("token {token} bucket {bucket}: {columns} columns but {bits} bits")]
    BitsMismatch {
        token: usize,
        bucket: usize,
        columns: usize,
        bits: usize,
    },

    #[error("token {token}: column {col} out of range (matrix has {max})")]
    ColumnOutOfRange { token: usize, col: u32, max: u32 },

    #[error("index blob error: {0}")]
    Blob(#[from] geoseal_index::IndexError),

    #[error("load_index requires aui_b64 or aui_path")]
    MissingIndexSource,

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
