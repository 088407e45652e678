use crate::cache::{OutputCacheKey, OutputCacheValue};
use crate::types::RawTable;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Storage abstraction for caching reconstructed newsletter output
pub trait OutputStorage {
    fn get_output(&self, cache_key: &OutputCacheKey) -> Result<Option<OutputCacheValue>>;
    fn store_output(&self, cache_key: &OutputCacheKey, cache_value: &OutputCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        fs::create_dir_all(format!("{cache_dir}/output"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn output_path(&self, cache_key: &OutputCacheKey) -> String {
        format!("{}/output/{}.json", self.cache_dir, cache_key.to_cache_hash())
    }
}

impl OutputStorage for FileStorage {
    fn get_output(&self, cache_key: &OutputCacheKey) -> Result<Option<OutputCacheValue>> {
        let path = self.output_path(cache_key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: OutputCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached OutputCacheValue: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_output(&self, cache_key: &OutputCacheKey, cache_value: &OutputCacheValue) -> Result<()> {
        let path = self.output_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize OutputCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// Hash the extracted tables as they will be fed to the engine
pub fn calculate_tables_hash(tables: &[RawTable]) -> Result<String> {
    let tables_json = serde_json::to_string(tables)
        .map_err(|e| anyhow!("Failed to serialize raw tables for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(tables_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Calculate hash for configuration data (for the cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash downloaded newsletter bytes, used to name saved PDFs
pub fn calculate_pdf_hash(pdf_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pdf_bytes);
    format!("{:x}", hasher.finalize())
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl OutputStorage for NoOpStorage {
    fn get_output(&self, _cache_key: &OutputCacheKey) -> Result<Option<OutputCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_output(&self, _cache_key: &OutputCacheKey, _cache_value: &OutputCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::OutputData;

    #[test]
    fn test_tables_hash_consistency() {
        let tables = vec![RawTable::new(vec![vec![Some("Emisor".into()), None]])];
        let hash1 = calculate_tables_hash(&tables).unwrap();
        let hash2 = calculate_tables_hash(&tables.clone()).unwrap();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_tables_hash_uniqueness() {
        let a = vec![RawTable::new(vec![vec![Some("Emisor".into())]])];
        let b = vec![RawTable::new(vec![vec![None]])];
        assert_ne!(calculate_tables_hash(&a).unwrap(), calculate_tables_hash(&b).unwrap());
    }

    #[test]
    fn test_config_hash_tracks_changes() {
        let config = EngineConfig::default();
        let mut changed = config.clone();
        changed.classifier.dollar_token = "US$".to_string();
        assert_ne!(
            calculate_config_hash(&config).unwrap(),
            calculate_config_hash(&changed).unwrap()
        );
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = std::env::temp_dir().join("boletin_test_cache");
        std::fs::remove_dir_all(&temp_dir).ok();
        let storage = FileStorage::new(temp_dir.to_str().unwrap()).unwrap();

        let key = OutputCacheKey::new("tables".to_string(), "config".to_string());
        assert!(storage.get_output(&key).unwrap().is_none());

        let mut output = OutputData::default();
        output.stocks.title = "Acciones".to_string();
        storage.store_output(&key, &OutputCacheValue::new(output.clone(), 12)).unwrap();

        let cached = storage.get_output(&key).unwrap().unwrap();
        assert_eq!(cached.output, output);
        assert_eq!(cached.processing_time_ms, 12);

        // Clean up
        std::fs::remove_dir_all(temp_dir).ok();
    }

    #[test]
    fn test_noop_storage_always_misses() {
        let storage = NoOpStorage::new();
        let key = OutputCacheKey::new("t".to_string(), "c".to_string());
        storage.store_output(&key, &OutputCacheValue::new(OutputData::default(), 0)).unwrap();
        assert!(storage.get_output(&key).unwrap().is_none());
    }
}
