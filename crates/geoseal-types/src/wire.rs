//! JSON wire protocol between the client and a CSP.
//!
//! One evaluation endpoint (`POST /eval`) and one index-loading endpoint
//! (`POST /load_index`). Binary payloads travel base64-encoded.

use serde::{Deserialize, Serialize};

/// Which matrix a token selects columns from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Keyword token → I_tex.
    Kw,
    /// Spatial cell token → I_spa.
    Spa,
}

/// One cuckoo bucket of a token's selection set, with this party's
/// DMPF selection bits over the bucket's local domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPayload {
    /// Global column indices in this bucket.
    pub columns: Vec<u32>,
    /// Selection bit per local index; same length as `columns`.
    pub bits: Vec<u8>,
}

/// Per-token payload for one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub buckets: Vec<BucketPayload>,
}

/// `POST /eval` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRequest {
    pub party_id: u32,
    pub tokens: Vec<TokenPayload>,
    pub security_param: u32,
}

/// `POST /eval` response body.
///
/// `result_shares[t][i]` is the base64 chunk share for token t, record i;
/// `proof_shares[t]` is the base64 λ-byte σ aggregate share for token t.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResponse {
    pub result_shares: Vec<Vec<String>>,
    pub proof_shares: Vec<String>,
}

/// `POST /load_index` request body: a base64 AUI blob or a server-local path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadIndexRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aui_b64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aui_path: Option<String>,
}

/// `POST /load_index` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadIndexResponse {
    pub status: String,
}

/// JSON error envelope returned by a CSP on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
