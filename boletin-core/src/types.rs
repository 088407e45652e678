use serde::{Deserialize, Serialize};
use std::fmt;

// ===== RAW EXTRACTOR BOUNDARY =====
// These types mirror what the PDF table extractor hands us: per page, an ordered
// list of tables, each an ordered list of rows of nullable text cells.

/// A single extracted cell. `None` is a blank/missing extraction artifact.
pub type Cell = Option<String>;

/// Grid of nullable cells as produced by the PDF table extractor, before repair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Width of the first row, which the extractor guarantees for every row.
    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|r| r.len() == width)
    }
}

/// Build a cell from text, treating blanks and the stringified null as missing.
pub fn cell_from(text: Option<&str>) -> Cell {
    match text {
        Some(t) if !t.trim().is_empty() && t != "None" => Some(t.to_string()),
        _ => None,
    }
}

// ===== CATEGORIES =====

/// The nine output tables of a newsletter edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    MutualFundsGs,
    MutualFundsUsd,
    InvestmentFundsGs,
    InvestmentFundsUsd,
    BondsGs,
    CdaGs,
    BondsUsd,
    CdaUsd,
    Stocks,
}

impl Category {
    /// All categories in output order.
    pub const ALL: [Category; 9] = [
        Category::MutualFundsGs,
        Category::MutualFundsUsd,
        Category::InvestmentFundsGs,
        Category::InvestmentFundsUsd,
        Category::BondsGs,
        Category::CdaGs,
        Category::BondsUsd,
        Category::CdaUsd,
        Category::Stocks,
    ];

    /// Field name of this category in the serialized output record.
    pub fn key(&self) -> &'static str {
        match self {
            Category::MutualFundsGs => "mutualFundsGs",
            Category::MutualFundsUsd => "mutualFundsUsd",
            Category::InvestmentFundsGs => "investmentFundsGs",
            Category::InvestmentFundsUsd => "investmentFundsUsd",
            Category::BondsGs => "bondsGs",
            Category::CdaGs => "cdaGs",
            Category::BondsUsd => "bondsUsd",
            Category::CdaUsd => "cdaUsd",
            Category::Stocks => "stocks",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            Category::MutualFundsGs => "Fondos Mutuos en Guaraníes",
            Category::MutualFundsUsd => "Fondos Mutuos en Dólares",
            Category::InvestmentFundsGs => "Fondos de Inversión en Guaraníes",
            Category::InvestmentFundsUsd => "Fondos de Inversión en Dólares",
            Category::BondsGs => "Bonos (Guaraníes)",
            Category::CdaGs => "CDA (Guaraníes)",
            Category::BondsUsd => "Bonos (Dólares)",
            Category::CdaUsd => "CDA (Dólares)",
            Category::Stocks => "Acciones",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ===== OUTPUT BOUNDARY =====

/// A titled, fully normalized output table.
///
/// Every row in `data` has exactly `columns.len()` values and no row is entirely blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub title: String,
    pub columns: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl TableData {
    pub fn empty(title: &str, columns: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            columns,
            data: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The serialization-ready record for one newsletter edition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputData {
    pub mutual_funds_gs: TableData,
    pub mutual_funds_usd: TableData,
    pub investment_funds_gs: TableData,
    pub investment_funds_usd: TableData,
    pub bonds_gs: TableData,
    pub cda_gs: TableData,
    pub bonds_usd: TableData,
    pub cda_usd: TableData,
    pub stocks: TableData,
}

impl OutputData {
    pub fn get(&self, category: Category) -> &TableData {
        match category {
            Category::MutualFundsGs => &self.mutual_funds_gs,
            Category::MutualFundsUsd => &self.mutual_funds_usd,
            Category::InvestmentFundsGs => &self.investment_funds_gs,
            Category::InvestmentFundsUsd => &self.investment_funds_usd,
            Category::BondsGs => &self.bonds_gs,
            Category::CdaGs => &self.cda_gs,
            Category::BondsUsd => &self.bonds_usd,
            Category::CdaUsd => &self.cda_usd,
            Category::Stocks => &self.stocks,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut TableData {
        match category {
            Category::MutualFundsGs => &mut self.mutual_funds_gs,
            Category::MutualFundsUsd => &mut self.mutual_funds_usd,
            Category::InvestmentFundsGs => &mut self.investment_funds_gs,
            Category::InvestmentFundsUsd => &mut self.investment_funds_usd,
            Category::BondsGs => &mut self.bonds_gs,
            Category::CdaGs => &mut self.cda_gs,
            Category::BondsUsd => &mut self.bonds_usd,
            Category::CdaUsd => &mut self.cda_usd,
            Category::Stocks => &mut self.stocks,
        }
    }

    /// Iterate tables in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &TableData)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn total_rows(&self) -> usize {
        self.iter().map(|(_, t)| t.data.len()).sum()
    }

    pub fn save_to_json(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
