//! RPC error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSP {url} returned status {status}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("CSP error: {0}")]
    Csp(String),

    #[error("response for token {token} carries {got} record shares, expected {expected}")]
    ShareCount {
        token: usize,
        got: usize,
        expected: usize,
    },

    #[error("response carries {got} token entries, expected {expected}")]
    TokenCount { got: usize, expected: usize },

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("{0}")]
    Other(String),
}

impl RpcError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Http(e) => e.is_timeout() || e.is_connect(),
            RpcError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
