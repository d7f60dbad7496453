//! Crypto primitives for the geoseal search service.
//!
//! Four building blocks, all deterministic byte-level constructions:
//!
//! - [`prf`]: keyed byte-stream derivation (`F`), truncated HMAC key
//!   derivation (`fc_eval`/`fc_cons`), the bit-homomorphic PRF [`prf::fx`],
//!   and the seeded permutation used for bucket placement.
//! - [`gbf`]: garbled Bloom filters: XOR-reconstructible secret-shared
//!   Bloom encodings of token sets.
//! - [`dmpf`]: U-party bit-selection shares over a column domain.
//! - [`cuckoo`]: PRP-driven load-balanced partition of selection indices.

pub mod cuckoo;
pub mod dmpf;
pub mod gbf;
pub mod prf;

pub use cuckoo::bucketize;
pub use dmpf::DmpfKey;
pub use gbf::{fingerprint, hash_positions, GarbledBloomFilter};
pub use prf::{fc_cons, fc_eval, fx, f_expand, xor_in_place};
