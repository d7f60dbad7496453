//! Search parameters and configuration.
//!
//! All parameters are chosen once at setup time and frozen into the AUI.
//! Defaults follow the reference deployment: λ = 16 bytes, 3 parties,
//! 200-cell filters with 32-bit fingerprints, 0.5° grid cells.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("security parameter must be non-zero")]
    ZeroLambda,

    #[error("security parameter {0} exceeds the 32-byte HMAC output")]
    LambdaTooLarge(u32),

    #[error("party count must be at least 2, got {0}")]
    TooFewParties(u32),

    #[error("{filter} fingerprint width {psi} is not a multiple of 8")]
    BadPsi { filter: &'static str, psi: u32 },

    #[error("{filter} filter has zero {field}")]
    ZeroFilterParam {
        filter: &'static str,
        field: &'static str,
    },

    #[error("spatial grid cell size must be positive, got {0}")]
    BadCellSize(f64),

    #[error("cuckoo load factor must be positive, got {0}")]
    BadLoad(f64),

    #[error("config file error: {0}")]
    File(String),
}

/// Garbled Bloom filter shape: array size, hash count, fingerprint bits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomParams {
    pub size: u32,
    pub hash_count: u32,
    /// Fingerprint width in bits; must be a multiple of 8.
    pub psi: u32,
}

impl BloomParams {
    /// Fingerprint width in bytes.
    pub fn chunk_len(&self) -> usize {
        (self.psi / 8) as usize
    }
}

/// Spatial grid step used to derive cell tokens from coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub cell_size_lat: f64,
    pub cell_size_lon: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cell_size_lat: 0.5,
            cell_size_lon: 0.5,
        }
    }
}

/// Query-shape suppression: caps the number of keyword blocks per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionParams {
    pub enable_padding: bool,
    pub max_r_blocks: u32,
}

impl Default for SuppressionParams {
    fn default() -> Self {
        Self {
            enable_padding: true,
            max_r_blocks: 4,
        }
    }
}

/// Cuckoo bucketizer parameters for one token kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuckooParams {
    /// Candidate buckets per index.
    pub kappa: u32,
    /// Bucket count multiplier over the selection-set size.
    pub load: f64,
    /// PRP seed; all parties must share it.
    pub seed: String,
}

/// Cuckoo parameters for both token kinds, as they appear in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuckooSection {
    pub kappa_kw: u32,
    pub load_kw: f64,
    pub seed_kw: String,
    pub kappa_spa: u32,
    pub load_spa: f64,
    pub seed_spa: String,
}

impl Default for CuckooSection {
    fn default() -> Self {
        Self {
            kappa_kw: 3,
            load_kw: 1.27,
            seed_kw: "cuckoo-seed".to_string(),
            kappa_spa: 3,
            load_spa: 1.27,
            seed_spa: "cuckoo-seed-spa".to_string(),
        }
    }
}

impl CuckooSection {
    pub fn keyword(&self) -> CuckooParams {
        CuckooParams {
            kappa: self.kappa_kw,
            load: self.load_kw,
            seed: self.seed_kw.clone(),
        }
    }

    pub fn spatial(&self) -> CuckooParams {
        CuckooParams {
            kappa: self.kappa_spa,
            load: self.load_spa,
            seed: self.seed_spa.clone(),
        }
    }
}

/// Full setup/query configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Security parameter λ in bytes.
    pub lambda: u32,
    /// Constrained-PRF prefix length bound in bits.
    pub s: u32,
    /// Number of compute service providers.
    #[serde(rename = "U")]
    pub parties: u32,
    pub spatial_bloom_filter: BloomParams,
    pub keyword_bloom_filter: BloomParams,
    pub spatial_grid: GridParams,
    pub suppression: SuppressionParams,
    pub cuckoo: CuckooSection,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lambda: 16,
            s: 64,
            parties: 3,
            spatial_bloom_filter: BloomParams {
                size: 200,
                hash_count: 3,
                psi: 32,
            },
            keyword_bloom_filter: BloomParams {
                size: 200,
                hash_count: 4,
                psi: 32,
            },
            spatial_grid: GridParams::default(),
            suppression: SuppressionParams::default(),
            cuckoo: CuckooSection::default(),
        }
    }
}

impl SearchConfig {
    /// Validate parameter ranges before setup or planning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lambda == 0 {
            return Err(ConfigError::ZeroLambda);
        }
        if self.lambda > 32 {
            return Err(ConfigError::LambdaTooLarge(self.lambda));
        }
        if self.parties < 2 {
            return Err(ConfigError::TooFewParties(self.parties));
        }
        for (name, bf) in [
            ("spatial", &self.spatial_bloom_filter),
            ("keyword", &self.keyword_bloom_filter),
        ] {
            // Fingerprints are SHA-256 prefixes, so ψ caps at 256 bits.
            if bf.psi == 0 || bf.psi % 8 != 0 || bf.psi > 256 {
                return Err(ConfigError::BadPsi {
                    filter: name,
                    psi: bf.psi,
                });
            }
            if bf.size == 0 {
                return Err(ConfigError::ZeroFilterParam {
                    filter: name,
                    field: "size",
                });
            }
            if bf.hash_count == 0 {
                return Err(ConfigError::ZeroFilterParam {
                    filter: name,
                    field: "hash_count",
                });
            }
        }
        if self.spatial_grid.cell_size_lat <= 0.0 {
            return Err(ConfigError::BadCellSize(self.spatial_grid.cell_size_lat));
        }
        if self.spatial_grid.cell_size_lon <= 0.0 {
            return Err(ConfigError::BadCellSize(self.spatial_grid.cell_size_lon));
        }
        if self.cuckoo.load_kw <= 0.0 {
            return Err(ConfigError::BadLoad(self.cuckoo.load_kw));
        }
        if self.cuckoo.load_spa <= 0.0 {
            return Err(ConfigError::BadLoad(self.cuckoo.load_spa));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = SearchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.lambda, 16);
        assert_eq!(cfg.parties, 3);
        assert_eq!(cfg.keyword_bloom_filter.hash_count, 4);
        assert_eq!(cfg.spatial_bloom_filter.hash_count, 3);
        assert_eq!(cfg.keyword_bloom_filter.chunk_len(), 4);
    }

    #[test]
    fn test_rejects_single_party() {
        let cfg = SearchConfig {
            parties: 1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::TooFewParties(1))));
    }

    #[test]
    fn test_rejects_unaligned_psi() {
        let mut cfg = SearchConfig::default();
        cfg.keyword_bloom_filter.psi = 12;
        assert!(matches!(cfg.validate(), Err(ConfigError::BadPsi { .. })));
    }

    #[test]
    fn test_rejects_oversized_lambda() {
        let cfg = SearchConfig {
            lambda: 48,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::LambdaTooLarge(48))
        ));
    }

    #[test]
    fn test_cuckoo_split() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.cuckoo.keyword().seed, "cuckoo-seed");
        assert_eq!(cfg.cuckoo.spatial().seed, "cuckoo-seed-spa");
    }
}
