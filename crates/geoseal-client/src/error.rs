//! Client error types.

use geoseal_types::{ConfigError, ShapeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Rpc(#[from] geoseal_rpc::RpcError),

    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("have {got} CSP endpoints, index expects {expected} parties")]
    PartyCount { expected: usize, got: usize },

    #[error("party {party} returned {got} token entries, expected {expected}")]
    TokenCount {
        party: usize,
        got: usize,
        expected: usize,
    },

    #[error("token {token} record {record}: share is {got} bytes, expected {expected}")]
    ShareLength {
        token: usize,
        record: usize,
        got: usize,
        expected: usize,
    },

    #[error("token {token}: proof share is {got} bytes, expected {expected}")]
    ProofLength {
        token: usize,
        got: usize,
        expected: usize,
    },

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("a CSP task failed: {0}")]
    Dispatch(String),

    #[error("proof verification failed; query rejected")]
    VerificationFailed,
}
