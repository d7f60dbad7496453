//! Compute service provider for geoseal.
//!
//! A CSP holds one replica of the AUI and answers bucketized column
//! queries: for each token it XOR-aggregates the encrypted matrix columns
//! and σ tags its local selection bits pick out. It is stateless across
//! requests, never sees keys, and never learns which columns inside a
//! bucket are semantically selected.

pub mod error;
pub mod eval;
pub mod server;

pub use error::CspError;
pub use eval::{encode_response, evaluate, TokenShare};
pub use server::{router, serve, CspState};
