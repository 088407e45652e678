use crate::config::{ClassifierConfig, ColumnNames, EngineConfig};
use crate::table::WorkTable;
use crate::text::{header_text, normalize};
use crate::types::{Category, Cell, RawTable};
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Provisional table assigned to a category: the recovered header plus the
/// data rows of one or more fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

impl Bucket {
    pub fn new(header: &[Cell], rows: &[Vec<Cell>]) -> Self {
        Self {
            header: header.to_vec(),
            rows: rows.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Normalized header text, used to recognise continuation fragments.
    pub fn header_key(&self) -> Vec<String> {
        self.header
            .iter()
            .map(|c| c.as_deref().map(header_text).unwrap_or_default())
            .collect()
    }

    pub fn to_work_table(&self) -> WorkTable {
        WorkTable::new(&self.header, &self.rows)
    }
}

/// Classifier output: exactly one bucket per category, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buckets {
    buckets: BTreeMap<Category, Bucket>,
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            buckets: Category::ALL
                .into_iter()
                .map(|c| (c, Bucket::default()))
                .collect(),
        }
    }
}

impl Buckets {
    pub fn get(&self, category: Category) -> &Bucket {
        &self.buckets[&category]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &Bucket)> {
        self.buckets.iter().map(|(c, b)| (*c, b))
    }

    pub fn filled(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }

    /// Place a fragment. A fragment sharing the occupant's header continues
    /// it (tables broken across pages); anything else replaces it.
    pub fn assign(&mut self, category: Category, fragment: Bucket) {
        if fragment.is_empty() {
            debug!("skipping empty {} fragment", category);
            return;
        }
        let slot = self.buckets.entry(category).or_default();
        if slot.is_empty() {
            *slot = fragment;
        } else if slot.header_key() == fragment.header_key() {
            debug!("➕ appending {} rows to {}", fragment.rows.len(), category);
            slot.rows.extend(fragment.rows);
        } else {
            warn!(
                "⚠️  {} already holds {} rows with a different header, replacing",
                category,
                slot.rows.len()
            );
            *slot = fragment;
        }
    }
}

/// Structural family of a raw table, decided from its shape and header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    MutualFunds,
    InvestmentFunds,
    CdaGs,
    Combined,
    Unrecognized(String),
}

// ===== PREDICATES =====

fn cell_text(cell: &Cell) -> Option<String> {
    cell.as_deref().map(|v| normalize(v).trim().to_string())
}

/// Whether a header row carries a cell named `name` (case-insensitive).
pub fn has_header(header: &[Cell], name: &str) -> bool {
    let wanted = header_text(name).to_lowercase();
    header
        .iter()
        .filter_map(cell_text)
        .any(|c| c.to_lowercase() == wanted)
}

pub fn header_position(header: &[Cell], name: &str) -> Option<usize> {
    let wanted = header_text(name).to_lowercase();
    header
        .iter()
        .position(|c| cell_text(c).is_some_and(|t| t.to_lowercase() == wanted))
}

/// Whether any cell of the row contains `token`.
pub fn row_contains(row: &[Cell], token: &str) -> bool {
    row.iter().filter_map(cell_text).any(|c| c.contains(token))
}

/// First row whose cell at `col` matches `marker`.
pub fn find_marker(rows: &[Vec<Cell>], col: usize, marker: &Regex) -> Option<usize> {
    rows.iter().position(|row| {
        row.get(col)
            .and_then(cell_text)
            .is_some_and(|v| marker.is_match(&v))
    })
}

/// Guarani amounts print as three numeric groups ("1.000.000"); dollar amounts don't.
pub fn is_guarani_block(rows: &[Vec<Cell>], availability: usize, amount: &Regex) -> bool {
    rows.iter().any(|row| {
        row.get(availability)
            .and_then(cell_text)
            .is_some_and(|v| amount.is_match(&v))
    })
}

/// Assigns raw extracted tables to the nine categories.
pub struct TableClassifier {
    names: ColumnNames,
    guarani_token: String,
    dollar_token: String,
    stocks_marker: Regex,
    bonds_marker: Regex,
    cda_marker: Regex,
    guarani_amount: Regex,
}

fn compile(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid {what} pattern: {pattern}"))
}

impl TableClassifier {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let ClassifierConfig {
            guarani_token,
            dollar_token,
            stocks_marker,
            bonds_marker,
            cda_marker,
            guarani_amount,
        } = &config.classifier;
        Ok(Self {
            names: config.columns.clone(),
            guarani_token: guarani_token.clone(),
            dollar_token: dollar_token.clone(),
            stocks_marker: compile(stocks_marker, "stocks marker")?,
            bonds_marker: compile(bonds_marker, "bonds marker")?,
            cda_marker: compile(cda_marker, "CDA marker")?,
            guarani_amount: compile(guarani_amount, "guarani amount")?,
        })
    }

    pub fn classify(&self, tables: &[RawTable]) -> Buckets {
        info!("🔍 Classifying {} raw tables...", tables.len());
        let mut buckets = Buckets::default();
        for (i, table) in tables.iter().enumerate() {
            let fragments = self.classify_table(table);
            if fragments.is_empty() {
                continue;
            }
            debug!(
                "table {} -> {:?}",
                i,
                fragments.iter().map(|(c, _)| c.key()).collect::<Vec<_>>()
            );
            for (category, fragment) in fragments {
                buckets.assign(category, fragment);
            }
        }
        info!("📋 Filled {} of 9 buckets", buckets.filled());
        buckets
    }

    pub fn layout(&self, table: &RawTable) -> Layout {
        if table.is_empty() {
            return Layout::Unrecognized("empty table".to_string());
        }
        if !table.is_rectangular() {
            return Layout::Unrecognized("rows of unequal width".to_string());
        }
        if table.rows.len() < 2 {
            return Layout::Unrecognized("header without data rows".to_string());
        }
        let header = &table.rows[0];
        match table.width() {
            7 if has_header(header, &self.names.yield_) => Layout::MutualFunds,
            7 => Layout::InvestmentFunds,
            8 if has_header(header, &self.names.rate) && !self.has_section_markers(table) => {
                Layout::CdaGs
            }
            8 => Layout::Combined,
            w => Layout::Unrecognized(format!("unexpected width {w}")),
        }
    }

    /// Fragments of one raw table. Empty when the table is not recognised.
    pub fn classify_table(&self, table: &RawTable) -> Vec<(Category, Bucket)> {
        let rows = &table.rows;
        match self.layout(table) {
            Layout::MutualFunds => {
                let category = if row_contains(&rows[1], &self.guarani_token) {
                    Category::MutualFundsGs
                } else {
                    Category::MutualFundsUsd
                };
                vec![(category, Bucket::new(&rows[0], &rows[1..]))]
            }
            Layout::InvestmentFunds => {
                let category = if row_contains(&rows[1], &self.dollar_token) {
                    Category::InvestmentFundsUsd
                } else {
                    Category::InvestmentFundsGs
                };
                vec![(category, Bucket::new(&rows[0], &rows[1..]))]
            }
            Layout::CdaGs => vec![(Category::CdaGs, Bucket::new(&rows[0], &rows[1..]))],
            Layout::Combined => self.split_combined(rows),
            Layout::Unrecognized(reason) => {
                warn!("⚠️  Dropping unrecognised table ({}): {:?}", reason, preview(table));
                Vec::new()
            }
        }
    }

    fn has_section_markers(&self, table: &RawTable) -> bool {
        let Some(issuer) = header_position(&table.rows[0], &self.names.issuer) else {
            return false;
        };
        let body = &table.rows[1..];
        find_marker(body, issuer, &self.bonds_marker).is_some()
            || find_marker(body, issuer, &self.stocks_marker).is_some()
    }

    /// Split the bonds/CDA/stocks block at its marker rows. Marker rows belong
    /// to neither side.
    fn split_combined(&self, rows: &[Vec<Cell>]) -> Vec<(Category, Bucket)> {
        let Some(header_row) = rows
            .iter()
            .position(|r| header_position(r, &self.names.issuer).is_some())
        else {
            warn!("⚠️  Dropping 8-column table without an '{}' header row", self.names.issuer);
            return Vec::new();
        };
        let header = &rows[header_row];
        let issuer = header_position(header, &self.names.issuer).unwrap_or_default();
        let body = &rows[header_row + 1..];
        let mut fragments = Vec::new();

        let main = match find_marker(body, issuer, &self.stocks_marker) {
            Some(i) => {
                fragments.push((Category::Stocks, Bucket::new(header, &body[i + 1..])));
                &body[..i]
            }
            None => body,
        };

        match find_marker(main, issuer, &self.bonds_marker) {
            Some(i) => {
                self.split_cda(header, issuer, &main[..i], Category::BondsGs, Category::CdaGs, &mut fragments);
                self.split_cda(header, issuer, &main[i + 1..], Category::BondsUsd, Category::CdaUsd, &mut fragments);
            }
            None => {
                let Some(availability) = header_position(header, &self.names.availability) else {
                    warn!(
                        "⚠️  Cannot tell the currency of a bonds block without '{}', dropping {} rows",
                        self.names.availability,
                        main.len()
                    );
                    return fragments;
                };
                if is_guarani_block(main, availability, &self.guarani_amount) {
                    self.split_cda(header, issuer, main, Category::BondsGs, Category::CdaGs, &mut fragments);
                } else {
                    self.split_cda(header, issuer, main, Category::BondsUsd, Category::CdaUsd, &mut fragments);
                }
            }
        }
        fragments
    }

    fn split_cda(
        &self,
        header: &[Cell],
        issuer: usize,
        rows: &[Vec<Cell>],
        bonds: Category,
        cda: Category,
        out: &mut Vec<(Category, Bucket)>,
    ) {
        match find_marker(rows, issuer, &self.cda_marker) {
            Some(i) => {
                out.push((bonds, Bucket::new(header, &rows[..i])));
                out.push((cda, Bucket::new(header, &rows[i + 1..])));
            }
            None => out.push((bonds, Bucket::new(header, rows))),
        }
    }
}

fn preview(table: &RawTable) -> Vec<String> {
    table
        .rows
        .first()
        .map(|r| r.iter().filter_map(cell_text).take(4).collect())
        .unwrap_or_default()
}
