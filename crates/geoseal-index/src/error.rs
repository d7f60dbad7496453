//! Index construction and persistence errors.

use geoseal_types::{ConfigError, ShapeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("spatial filter psi {spatial} differs from keyword filter psi {keyword}")]
    PsiMismatch { spatial: u32, keyword: u32 },

    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("blob has wrong magic bytes")]
    BadMagic,

    #[error("unsupported blob version: {0}")]
    UnsupportedVersion(u8),

    #[error("blob truncated: need {need} more bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("blob has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("blob field too large: {0}")]
    FieldTooLarge(u64),

    #[error("blob contains invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
