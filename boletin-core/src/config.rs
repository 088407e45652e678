use crate::types::Category;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine configuration. Everything that encodes knowledge of the newsletter
/// layout (header names, marker words, noise keywords, split patterns) lives
/// here as data so that layout drift between editions is a config change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub columns: ColumnNames,
    pub cleaners: CleanerTable,
    /// Human-readable title per output table
    pub titles: BTreeMap<Category, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Substring marking a guarani-denominated fund row
    pub guarani_token: String,
    /// Substring marking a dollar-denominated fund row
    pub dollar_token: String,
    /// Issuer-cell marker (regex) that opens the stocks tail of the combined block
    pub stocks_marker: String,
    /// Issuer-cell marker (regex) that separates guarani from dollar bonds
    pub bonds_marker: String,
    /// Issuer-cell marker (regex) that separates bonds from CDA
    pub cda_marker: String,
    /// Guarani amounts carry three numeric groups ("1.000.000"), dollar amounts don't
    pub guarani_amount: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            guarani_token: "G".to_string(),
            dollar_token: "USD".to_string(),
            stocks_marker: r"(?i)acciones".to_string(),
            bonds_marker: r"(?i)bonos".to_string(),
            cda_marker: r"^CDA$".to_string(),
            guarani_amount: r"\d+[.,]\d+[.]\d+".to_string(),
        }
    }
}

/// Header names the engine looks for, as printed in the newsletter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub issuer: String,
    pub rating: String,
    #[serde(rename = "yield")]
    pub yield_: String,
    pub rate: String,
    pub maturity: String,
    pub availability: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            issuer: "Emisor".to_string(),
            rating: "Calificación".to_string(),
            yield_: "Rendimiento".to_string(),
            rate: "Tasa".to_string(),
            maturity: "Vencimiento".to_string(),
            availability: "Disponibilidad".to_string(),
        }
    }
}

/// Drop rows whose `column` matches `pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseFilter {
    pub column: String,
    pub pattern: String,
}

/// Decompose `source` into `destinations` with the capture groups of `pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRule {
    pub source: String,
    pub pattern: String,
    pub destinations: Vec<String>,
}

/// Rotate `from..=to` one position right on rows whose `trigger` matches `pattern`.
/// `to` defaults to the last column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    pub trigger: String,
    pub pattern: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Issuer-cell pattern of a row to promote to header
    #[serde(default)]
    pub header_marker: Option<String>,
    #[serde(default)]
    pub noise: Vec<NoiseFilter>,
    #[serde(default)]
    pub rotations: Vec<RotationConfig>,
    #[serde(default)]
    pub splits: Vec<SplitRule>,
    /// Tokens of a packed "rating yield yield..." cell (dollar bonds)
    #[serde(default)]
    pub yield_tokens: Option<String>,
    /// Amount-like columns whose whitespace is removed
    #[serde(default)]
    pub compact_columns: Vec<String>,
    /// Columns reported when the bucket is empty or unusable
    #[serde(default)]
    pub default_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerTable {
    pub mutual_funds_gs: CleanerConfig,
    pub mutual_funds_usd: CleanerConfig,
    pub investment_funds_gs: CleanerConfig,
    pub investment_funds_usd: CleanerConfig,
    pub bonds_gs: CleanerConfig,
    pub cda_gs: CleanerConfig,
    pub bonds_usd: CleanerConfig,
    pub cda_usd: CleanerConfig,
    pub stocks: CleanerConfig,
}

impl CleanerTable {
    pub fn get(&self, category: Category) -> &CleanerConfig {
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
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn noise(column: &str, pattern: &str) -> NoiseFilter {
    NoiseFilter {
        column: column.to_string(),
        pattern: pattern.to_string(),
    }
}

// Issuer cell that holds only digits/amounts: the row lost its leading value
const NUMERIC_ISSUER: &str = r"^[\d\s.,%]+$";

fn shifted_issuer_rotation() -> RotationConfig {
    RotationConfig {
        trigger: "Emisor".to_string(),
        pattern: NUMERIC_ISSUER.to_string(),
        from: "Emisor".to_string(),
        to: None,
    }
}

fn mutual_funds_config() -> CleanerConfig {
    CleanerConfig {
        default_columns: names(&[
            "Fondo",
            "Administradora",
            "Moneda",
            "Valor cuota",
            "Rendimiento",
            "Monto mínimo",
            "Pago de rescates",
        ]),
        ..Default::default()
    }
}

fn investment_funds_config() -> CleanerConfig {
    CleanerConfig {
        default_columns: names(&[
            "Fondo",
            "Administradora",
            "Moneda",
            "Calificación",
            "Plazo",
            "Tasa",
            "Monto mínimo",
        ]),
        ..Default::default()
    }
}

fn bond_columns() -> Vec<String> {
    names(&[
        "Emisor",
        "Calificación",
        "Rendimiento",
        "Vencimiento",
        "Plazo Residual en años",
        "Pago de intereses",
        "Disponibilidad",
        "Valor Nominal",
    ])
}

fn cda_columns() -> Vec<String> {
    names(&[
        "Emisor",
        "Calificación",
        "Tasa",
        "Vencimiento",
        "Plazo Residual en años",
        "Pago de intereses",
        "Disponibilidad",
        "Valor Nominal",
    ])
}

impl Default for CleanerTable {
    fn default() -> Self {
        let bonds_gs = CleanerConfig {
            noise: vec![noise("Emisor", r"(?i)tasas|d[oó]lares|^\s*emisor\s*$")],
            rotations: vec![shifted_issuer_rotation()],
            splits: vec![SplitRule {
                source: "Calificación".to_string(),
                pattern: r"^(.+?)\s+(\d+(?:[.,]\d+)?\s?%)$".to_string(),
                destinations: names(&["Calificación", "Rendimiento"]),
            }],
            compact_columns: names(&["Disponibilidad"]),
            default_columns: bond_columns(),
            ..Default::default()
        };

        let cda_gs = CleanerConfig {
            header_marker: Some(r"(?i)emisor".to_string()),
            noise: vec![noise("Emisor", r"(?i)tasas|renta|bonos|cda|emisor")],
            compact_columns: names(&["Valor Nominal", "Valor por cada corte"]),
            default_columns: cda_columns(),
            ..Default::default()
        };

        let bonds_usd = CleanerConfig {
            noise: vec![
                noise("Emisor", r"(?i)tasas|bonos|cda|emisor|renta"),
                noise("Calificación", r"(?i)entidad|vencimiento"),
            ],
            rotations: vec![shifted_issuer_rotation()],
            yield_tokens: Some(r"\d,\d\d%|\w+[+-]?\s?[PpYy]{2}".to_string()),
            compact_columns: names(&["Disponibilidad", "Plazo Residual en años"]),
            default_columns: bond_columns(),
            ..Default::default()
        };

        let cda_usd = CleanerConfig {
            header_marker: Some(r"(?i)emisor".to_string()),
            noise: vec![
                noise("Emisor", r"(?i)tasas|emisor|cda|renta"),
                noise("Calificación", r"(?i)entidad|vencimiento"),
            ],
            splits: vec![SplitRule {
                source: "Emisor".to_string(),
                pattern: r"(\w+\s\w+)\s([A-Z]+[\s|\-+]?py)\s([0-9]+,[0-9]{2}%)".to_string(),
                destinations: names(&["Emisor", "Calificación", "Tasa"]),
            }],
            default_columns: cda_columns(),
            ..Default::default()
        };

        let stocks = CleanerConfig {
            header_marker: Some(r"(?i)emisor".to_string()),
            noise: vec![noise("Emisor", r"(?i)^\s*emisor\s*$")],
            compact_columns: names(&["Disponibilidad", "Precio", "Valor de venta"]),
            default_columns: names(&[
                "Emisor",
                "Tipo",
                "Calificación",
                "Disponibilidad",
                "Precio",
                "Valor de venta",
                "Dividendos",
                "Observaciones",
            ]),
            ..Default::default()
        };

        Self {
            mutual_funds_gs: mutual_funds_config(),
            mutual_funds_usd: mutual_funds_config(),
            investment_funds_gs: investment_funds_config(),
            investment_funds_usd: investment_funds_config(),
            bonds_gs,
            cda_gs,
            bonds_usd,
            cda_usd,
            stocks,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            columns: ColumnNames::default(),
            cleaners: CleanerTable::default(),
            titles: Category::ALL
                .into_iter()
                .map(|c| (c, c.default_title().to_string()))
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Load config from a YAML file; omitted sections keep their defaults
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: EngineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn title(&self, category: Category) -> &str {
        self.titles
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.default_title())
    }
}
