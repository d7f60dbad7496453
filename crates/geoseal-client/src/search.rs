//! Query orchestration across all parties.

use crate::combine::combine_responses;
use crate::decrypt::decrypt_matches;
use crate::error::ClientError;
use crate::plan::plan_query;
use crate::verify::verify_fx_hmac;
use geoseal_rpc::CspClient;
use geoseal_types::wire::EvalRequest;
use geoseal_types::{Aui, KeyTuple, SearchConfig};
use std::sync::Arc;

/// Lifecycle of one query. `Rejected` is terminal: the caller gets an
/// error and no per-record information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Planned,
    Dispatched,
    Combined,
    Decrypted,
    Verified,
    Rejected,
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Planned => "PLANNED",
            Self::Dispatched => "DISPATCHED",
            Self::Combined => "COMBINED",
            Self::Decrypted => "DECRYPTED",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// A verified query result.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub hits: Vec<String>,
    pub state: QueryState,
}

/// End-to-end search client: plans, fans out, combines, decrypts, verifies.
pub struct SearchClient {
    csps: Vec<Arc<CspClient>>,
    aui: Arc<Aui>,
    keys: KeyTuple,
    config: SearchConfig,
}

impl SearchClient {
    /// Create a client. The endpoint count must match the index's party
    /// count; every share is required for XOR reconstruction.
    pub fn new(
        csps: Vec<CspClient>,
        aui: Aui,
        keys: KeyTuple,
        config: SearchConfig,
    ) -> Result<Self, ClientError> {
        if csps.len() != aui.parties as usize {
            return Err(ClientError::PartyCount {
                expected: aui.parties as usize,
                got: csps.len(),
            });
        }
        Ok(Self {
            csps: csps.into_iter().map(Arc::new).collect(),
            aui: Arc::new(aui),
            keys,
            config,
        })
    }

    pub fn aui(&self) -> &Aui {
        &self.aui
    }

    /// Ship an AUI blob to every CSP.
    pub async fn provision(&self, blob: Vec<u8>) -> Result<(), ClientError> {
        let blob = Arc::new(blob);
        let mut handles = Vec::with_capacity(self.csps.len());
        for client in &self.csps {
            let client = Arc::clone(client);
            let blob = Arc::clone(&blob);
            handles.push(tokio::spawn(
                async move { client.load_index_blob(&blob).await },
            ));
        }
        for handle in handles {
            handle
                .await
                .map_err(|e| ClientError::Dispatch(e.to_string()))??;
        }
        Ok(())
    }

    /// Run one query through the full state machine.
    ///
    /// All parties are queried concurrently and every response is
    /// required; a missing or malformed share fails the query. A proof
    /// mismatch rejects the query without returning hits.
    pub async fn run(&self, query: &str) -> Result<QueryOutcome, ClientError> {
        let plan = plan_query(query, &self.aui, &self.config)?;
        log::debug!("query state: {}", QueryState::Planned);

        let n = self.aui.record_count();
        let mut handles = Vec::with_capacity(self.csps.len());
        for (party, client) in self.csps.iter().enumerate() {
            let client = Arc::clone(client);
            let request = EvalRequest {
                party_id: party as u32,
                tokens: plan.payloads[party].clone(),
                security_param: plan.security_param,
            };
            handles.push(tokio::spawn(async move { client.eval(&request, n).await }));
        }
        let mut responses = Vec::with_capacity(handles.len());
        for handle in handles {
            responses.push(
                handle
                    .await
                    .map_err(|e| ClientError::Dispatch(e.to_string()))??,
            );
        }
        log::debug!("query state: {}", QueryState::Dispatched);

        let (vecs, proofs) = combine_responses(&plan, &responses, &self.aui)?;
        log::debug!("query state: {}", QueryState::Combined);

        let matches = decrypt_matches(&plan, &vecs, &self.aui, &self.keys);
        log::debug!("query state: {}", QueryState::Decrypted);

        if !verify_fx_hmac(&plan, &self.aui, &self.keys, &vecs, &proofs) {
            log::warn!("query state: {}", QueryState::Rejected);
            return Err(ClientError::VerificationFailed);
        }
        log::debug!("query state: {}", QueryState::Verified);

        Ok(QueryOutcome {
            hits: matches.hits,
            state: QueryState::Verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(QueryState::Planned.to_string(), "PLANNED");
        assert_eq!(QueryState::Rejected.to_string(), "REJECTED");
    }
}
