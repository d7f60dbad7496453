//! Async HTTP client for geoseal compute service providers.
//!
//! Speaks the JSON wire protocol from `geoseal-types::wire`: one
//! `/eval` call per party per query, plus `/load_index` for provisioning.
//! Transport policy (timeout, bounded retries with exponential backoff)
//! lives here; the caller supplies ready-made payloads and combines the
//! returned shares.

pub mod client;
pub mod error;

pub use client::{CspClient, CspClientConfig};
pub use error::RpcError;
