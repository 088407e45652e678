use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const BOLETIN_VERSION: &str = "0.1.0";
    /// Bump whenever a cleaner or the classifier changes its output
    pub const ENGINE_VERSION: &str = "1.0.0";
}

/// Cache key (raw tables + config → output)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OutputCacheKey {
    pub tables_hash: String,
    pub config_hash: String,
    pub boletin_version: String,
    pub engine_version: String,
}

impl OutputCacheKey {
    pub fn new(tables_hash: String, config_hash: String) -> Self {
        Self {
            tables_hash,
            config_hash,
            boletin_version: versions::BOLETIN_VERSION.to_string(),
            engine_version: versions::ENGINE_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.tables_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.boletin_version);
        hasher.update(&self.engine_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached output with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputCacheValue {
    pub output: OutputData,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl OutputCacheValue {
    pub fn new(output: OutputData, processing_time_ms: u64) -> Self {
        Self {
            output,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::BOLETIN_VERSION.to_string(),
        }
    }
}
