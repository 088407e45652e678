use crate::cache::{OutputCacheKey, OutputCacheValue};
use crate::classifier::Buckets;
use crate::config::EngineConfig;
use crate::pipeline::DocumentPipeline;
use crate::storage::{calculate_config_hash, calculate_tables_hash, FileStorage, NoOpStorage, OutputStorage};
use crate::types::*;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::info;

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics: lets you inspect each boundary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub buckets: Buckets,
    pub output: OutputData,
}

/// Where the time of one edition went: classification, then cleaning broken
/// down per category, since a single misbehaving category dominates a slow run.
/// Nothing is recorded unless profiling was requested.
#[derive(Debug, Default)]
pub struct EditionProfile {
    enabled: bool,
    classification: Option<(usize, Duration)>,
    categories: Vec<(Category, usize, Duration)>,
}

impl EditionProfile {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn classify(&mut self, pipeline: &DocumentPipeline, tables: &[RawTable]) -> Buckets {
        let start = Instant::now();
        let buckets = pipeline.classify(tables);
        if self.enabled {
            self.classification = Some((tables.len(), start.elapsed()));
        }
        buckets
    }

    /// Build every category table, timing each one.
    pub fn build(&mut self, pipeline: &DocumentPipeline, buckets: &Buckets) -> OutputData {
        let mut output = OutputData::default();
        for category in Category::ALL {
            let start = Instant::now();
            let table = pipeline.build_table(category, buckets.get(category));
            if self.enabled {
                self.categories.push((category, table.data.len(), start.elapsed()));
            }
            *output.get_mut(category) = table;
        }
        output
    }

    pub fn cleaning_time(&self) -> Duration {
        self.categories.iter().map(|(_, _, d)| *d).sum()
    }

    pub fn slowest_category(&self) -> Option<Category> {
        self.categories
            .iter()
            .max_by_key(|(_, _, d)| *d)
            .map(|(c, _, _)| *c)
    }

    pub fn print_summary(&self) {
        if !self.enabled {
            return;
        }
        println!("\n📊 Edition profile:");
        if let Some((tables, elapsed)) = self.classification {
            println!("   {:.<28} {:>4} tables {:>6}ms", "classification", tables, elapsed.as_millis());
        }
        let slowest = self.slowest_category();
        for (category, rows, elapsed) in &self.categories {
            let flag = if Some(*category) == slowest { " 🐢" } else { "" };
            println!(
                "   {:.<28} {:>4} rows   {:>6}ms{}",
                category.key(),
                rows,
                elapsed.as_millis(),
                flag
            );
        }
        println!("   {:.<28} {:>18}ms", "cleaning", self.cleaning_time().as_millis());
    }
}

/// Read the extractor's output: a JSON array of tables, pages flattened in order
pub fn load_tables_from_file(path: &str) -> Result<Vec<RawTable>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read raw tables: {path}"))?;
    let tables: Vec<RawTable> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse raw tables: {path}"))?;
    Ok(tables)
}

pub struct DocumentProcessor {
    storage: Box<dyn OutputStorage + Send + Sync>,
}

impl DocumentProcessor {
    /// Create DocumentProcessor with full dependency injection
    pub fn new_with_dependencies(storage: Box<dyn OutputStorage + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Convenience constructor for CLI usage with a file cache
    pub fn new_cli_with_cache(cache_dir: &str) -> Result<Self> {
        let storage = Box::new(FileStorage::new(cache_dir)?);
        Ok(Self::new_with_dependencies(storage))
    }

    /// Processor that never caches
    pub fn new_uncached() -> Self {
        Self::new_with_dependencies(Box::new(NoOpStorage::new()))
    }

    /// Raw tables + config → output, with caching and optional profiling
    pub fn process_tables_with_config_and_profiling(
        &self,
        tables: &[RawTable],
        config: &EngineConfig,
        enable_profiling: bool,
        skip_cache: bool,
    ) -> Result<OutputData> {
        let start_time = Instant::now();
        let tables_hash = calculate_tables_hash(tables)?;
        let config_hash = calculate_config_hash(config)?;
        let cache_key = OutputCacheKey::new(tables_hash, config_hash);

        if skip_cache {
            info!("🚫 Skipping cache lookup (--skip-cache enabled)");
        } else if let Some(cached) = self.storage.get_output(&cache_key)? {
            info!(
                "🎯 Cache hit: edition built {} in {}ms",
                cached.created_at.format("%Y-%m-%d %H:%M"),
                cached.processing_time_ms
            );
            return Ok(cached.output);
        }

        info!("📄 Processing {} raw tables", tables.len());

        let pipeline = DocumentPipeline::new(config)?;
        let mut profile = EditionProfile::new(enable_profiling);
        let buckets = profile.classify(&pipeline, tables);
        let output = profile.build(&pipeline, &buckets);
        info!("✅ Built 9 tables with {} rows in total", output.total_rows());

        if skip_cache {
            info!("🚫 Skipping cache storage (--skip-cache enabled)");
        } else {
            let processing_time = start_time.elapsed().as_millis() as u64;
            let cache_value = OutputCacheValue::new(output.clone(), processing_time);
            self.storage.store_output(&cache_key, &cache_value)?;
        }

        profile.print_summary();
        info!(
            "⏱️  Total processing time: {:.0}ms",
            start_time.elapsed().as_millis()
        );
        Ok(output)
    }

    /// Raw tables + config → output with caching
    pub fn process_tables_with_config(
        &self,
        tables: &[RawTable],
        config: &EngineConfig,
    ) -> Result<OutputData> {
        self.process_tables_with_config_and_profiling(tables, config, false, false)
    }

    /// Simple processing function using default config
    pub fn process_tables(&self, tables: &[RawTable]) -> Result<OutputData> {
        self.process_tables_with_config(tables, &EngineConfig::default())
    }

    /// Process and capture the intermediate stage outputs, bypassing the cache
    pub fn process_tables_capture_stages(
        &self,
        tables: &[RawTable],
        config: &EngineConfig,
    ) -> Result<PipelineStages> {
        let pipeline = DocumentPipeline::new(config)?;

        let buckets = pipeline.classify(tables);
        info!("📋 Stage 1: {} of 9 buckets filled", buckets.filled());

        let output = pipeline.build(&buckets);
        info!("📋 Stage 2: {} output rows", output.total_rows());

        Ok(PipelineStages { buckets, output })
    }
}
