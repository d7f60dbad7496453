//! Client core for geoseal.
//!
//! The online query path: parse and plan a query against the AUI
//! parameters, fan the per-party payloads out to the CSPs, XOR-combine the
//! returned shares, strip the one-time pad, apply the conjunctive match
//! semantics, and verify the FX+HMAC proof before releasing any hits.
//!
//! A query moves through `PLANNED → DISPATCHED → COMBINED → DECRYPTED →
//! VERIFIED`; a proof mismatch lands in the terminal `REJECTED` state and
//! surfaces as an error carrying no per-record information.

pub mod combine;
pub mod decrypt;
pub mod error;
pub mod plan;
pub mod search;
pub mod verify;

pub use combine::combine_responses;
pub use decrypt::{decrypt_matches, MatchOutcome};
pub use error::ClientError;
pub use plan::{plan_query, QueryPlan};
pub use search::{QueryOutcome, QueryState, SearchClient};
pub use verify::{recompute_expected_proofs, verify_fx_hmac};
