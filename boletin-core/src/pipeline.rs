use crate::classifier::{Bucket, Buckets, TableClassifier};
use crate::cleaners::CleanerEngine;
use crate::config::EngineConfig;
use crate::types::*;
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Classification and cleaning for one newsletter edition. Pure: no I/O, and
/// the same raw tables always produce the same output.
pub struct DocumentPipeline {
    classifier: TableClassifier,
    cleaners: CleanerEngine,
    titles: BTreeMap<Category, String>,
}

impl DocumentPipeline {
    /// Compile every pattern in `config`. Fails on the first invalid one.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            classifier: TableClassifier::new(config)?,
            cleaners: CleanerEngine::new(config)?,
            titles: config.titles.clone(),
        })
    }

    pub fn process(&self, tables: &[RawTable]) -> OutputData {
        let buckets = self.classify(tables);
        self.build(&buckets)
    }

    pub fn classify(&self, tables: &[RawTable]) -> Buckets {
        self.classifier.classify(tables)
    }

    pub fn build(&self, buckets: &Buckets) -> OutputData {
        let mut output = OutputData::default();
        for category in Category::ALL {
            *output.get_mut(category) = self.build_table(category, buckets.get(category));
        }
        info!("✅ Built 9 tables with {} rows in total", output.total_rows());
        output
    }

    pub fn title(&self, category: Category) -> &str {
        self.titles
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_title())
    }

    /// Clean one bucket. A cleaner failure only costs this category: it is
    /// reported and replaced by an empty table with the best known columns.
    pub fn build_table(&self, category: Category, bucket: &Bucket) -> TableData {
        let title = self.title(category);
        if bucket.is_empty() {
            info!("📭 {}: no rows in this edition", category);
            return TableData::empty(title, self.cleaners.rules(category).default_columns.clone());
        }
        match self
            .cleaners
            .clean(category, bucket)
            .and_then(|table| table.into_table_data(title))
        {
            Ok(table) => {
                info!("📊 {}: {} rows x {} columns", category, table.data.len(), table.columns.len());
                table
            }
            Err(e) => {
                warn!("⚠️  {} degraded to an empty table: {}", category, e);
                TableData::empty(title, self.cleaners.fallback_columns(category, bucket))
            }
        }
    }
}
