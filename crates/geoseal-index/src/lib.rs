//! Authenticated index construction for geoseal.
//!
//! The owner-side offline phase: encode each record's token sets into
//! garbled Bloom filters, one-time-pad encrypt them into the columnar
//! matrices, derive the per-record key schedule, and tag every column with
//! an FX+HMAC aggregate. Also provides at-rest integrity tags and the
//! binary blob framing used to ship the AUI to CSPs and keys to disk.

pub mod blob;
pub mod error;
pub mod setup;
pub mod tags;

pub use error::IndexError;
pub use setup::{encode_record, setup, setup_with_rng, EncodedRecord};
pub use tags::{build_integrity_tags, verify_integrity, IntegrityTags};
