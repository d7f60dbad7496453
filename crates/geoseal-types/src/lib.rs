//! Core types and parameters for the geoseal search service.
//!
//! This crate provides the foundational types used across all geoseal crates:
//! search parameters and configuration, raw input records, the authenticated
//! outsourced index (AUI) held by compute service providers, the owner key
//! tuple, and the JSON wire protocol spoken between client and CSPs.

pub mod config;
pub mod index;
pub mod record;
pub mod text;
pub mod wire;

pub use config::{BloomParams, ConfigError, CuckooParams, GridParams, SearchConfig, SuppressionParams};
pub use index::{Aui, EncryptedMatrix, KeyTuple, ShapeError};
pub use record::RawRecord;
pub use wire::{BucketPayload, EvalRequest, EvalResponse, TokenKind, TokenPayload};
