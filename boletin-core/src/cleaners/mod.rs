// Category cleaners
//
// Each category has a fixed repair pipeline built from the primitives in
// `repair`. The keyword sets and patterns the pipelines use come from
// `CleanerConfig` and are compiled once in `CompiledRules`.

pub mod bonds;
pub mod funds;
pub mod sections;

use crate::classifier::Bucket;
use crate::config::{CleanerConfig, ColumnNames, EngineConfig, RotationConfig, SplitRule};
use crate::error::CleanResult;
use crate::repair::{FieldSplitter, RotationRule};
use crate::table::WorkTable;
use crate::text::strip_whitespace;
use crate::types::Category;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid cleaner pattern: {pattern}"))
}

/// A category's cleaner settings with every pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub header_marker: Option<Regex>,
    pub noise: Vec<(String, Regex)>,
    pub rotations: Vec<(RotationConfig, Regex)>,
    pub splits: Vec<(SplitRule, Regex)>,
    pub yield_tokens: Option<Regex>,
    pub compact_columns: Vec<String>,
    pub default_columns: Vec<String>,
}

impl CompiledRules {
    pub fn compile(config: &CleanerConfig) -> Result<Self> {
        Ok(Self {
            header_marker: config.header_marker.as_deref().map(compile).transpose()?,
            noise: config
                .noise
                .iter()
                .map(|f| compile(&f.pattern).map(|re| (f.column.clone(), re)))
                .collect::<Result<_>>()?,
            rotations: config
                .rotations
                .iter()
                .map(|r| compile(&r.pattern).map(|re| (r.clone(), re)))
                .collect::<Result<_>>()?,
            splits: config
                .splits
                .iter()
                .map(|s| compile(&s.pattern).map(|re| (s.clone(), re)))
                .collect::<Result<_>>()?,
            yield_tokens: config.yield_tokens.as_deref().map(compile).transpose()?,
            compact_columns: config.compact_columns.clone(),
            default_columns: config.default_columns.clone(),
        })
    }

    /// Promote the first row whose `issuer` cell matches the header marker.
    pub fn promote_header(&self, table: &mut WorkTable, issuer: usize) -> bool {
        let Some(marker) = &self.header_marker else {
            return false;
        };
        match table.find_row(issuer, marker) {
            Some(pos) => {
                table.promote_header(pos);
                debug!("🏷️  promoted row {} to header: {:?}", pos, table.columns());
                true
            }
            None => false,
        }
    }

    /// Drop header repeats, disclaimers and section labels. Filters on
    /// columns this edition does not have are skipped.
    pub fn drop_noise(&self, table: &mut WorkTable) -> usize {
        let mut dropped = 0;
        for (column, pattern) in &self.noise {
            if let Some(col) = table.column_index(column) {
                dropped += table.drop_rows_matching(col, pattern);
            }
        }
        if dropped > 0 {
            debug!("🧹 dropped {} noise rows", dropped);
        }
        dropped
    }

    pub fn rotate(&self, table: &mut WorkTable) -> CleanResult<usize> {
        let mut rotated = 0;
        for (rule, pattern) in &self.rotations {
            let Some(rule) =
                RotationRule::resolve(table, &rule.trigger, pattern, &rule.from, rule.to.as_deref())
            else {
                continue;
            };
            rotated += rule.apply(table)?;
        }
        if rotated > 0 {
            debug!("🔄 rotated {} shifted rows", rotated);
        }
        Ok(rotated)
    }

    pub fn split_fields(&self, table: &mut WorkTable) -> CleanResult<usize> {
        let mut split = 0;
        for (rule, pattern) in &self.splits {
            match FieldSplitter::resolve(table, &rule.source, pattern, &rule.destinations) {
                Some(splitter) => split += splitter.apply(table)?,
                None => debug!("split rule on '{}' does not apply to this layout", rule.source),
            }
        }
        Ok(split)
    }

    /// Remove whitespace inside amount-like columns.
    pub fn compact(&self, table: &mut WorkTable) {
        for column in &self.compact_columns {
            if let Some(col) = table.column_index(column) {
                table.map_column(col, strip_whitespace);
            }
        }
    }
}

/// Dispatches each category's bucket to its repair pipeline.
pub struct CleanerEngine {
    names: ColumnNames,
    rules: BTreeMap<Category, CompiledRules>,
}

impl CleanerEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let rules = Category::ALL
            .into_iter()
            .map(|c| {
                CompiledRules::compile(config.cleaners.get(c))
                    .with_context(|| format!("Failed to compile cleaner rules for {c}"))
                    .map(|compiled| (c, compiled))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            names: config.columns.clone(),
            rules,
        })
    }

    pub fn rules(&self, category: Category) -> &CompiledRules {
        &self.rules[&category]
    }

    /// Run the category pipeline over a working copy of the bucket.
    pub fn clean(&self, category: Category, bucket: &Bucket) -> CleanResult<WorkTable> {
        let rules = self.rules(category);
        let mut table = bucket.to_work_table();
        table.drop_blank_rows();
        table.drop_blank_columns();

        match category {
            Category::MutualFundsGs
            | Category::MutualFundsUsd
            | Category::InvestmentFundsGs
            | Category::InvestmentFundsUsd => funds::clean(&mut table, rules)?,
            Category::BondsGs => bonds::clean_gs(&mut table, rules, &self.names)?,
            Category::BondsUsd => bonds::clean_usd(&mut table, rules, &self.names)?,
            Category::CdaGs | Category::CdaUsd | Category::Stocks => {
                sections::clean(&mut table, rules, &self.names)?
            }
        }

        table.validate()?;
        Ok(table)
    }

    /// Columns to report when a category cannot be cleaned: the bucket's own
    /// header if it has one, the configured defaults otherwise.
    pub fn fallback_columns(&self, category: Category, bucket: &Bucket) -> Vec<String> {
        let table = bucket.to_work_table();
        if table.columns().iter().any(|c| !c.is_empty()) {
            table.output_columns()
        } else {
            self.rules(category).default_columns.clone()
        }
    }
}
