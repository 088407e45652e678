//! Pipeline boundary tests over a realistic edition.
//!
//! `test_fixtures/sample_edition.json` holds the raw tables the PDF table
//! extractor produced for one newsletter edition: funds split across pages,
//! a page-number fragment, and the combined bonds/CDA/stocks block with its
//! section markers and glyph artifacts.
//!
//! Boundary 1 (classifier): which rows land in which of the nine buckets.
//! Boundary 2 (output): structural guarantees of the final record, plus a few
//! spot values per category.

use boletin_core::{
    load_tables_from_file, Category, DocumentPipeline, DocumentProcessor, EngineConfig, OutputData,
    RawTable, TableData,
};
use std::path::PathBuf;

// ============================================================================
// Fixture helpers
// ============================================================================

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures").join(name)
}

fn load_edition() -> Vec<RawTable> {
    let path = fixture_path("sample_edition.json");
    load_tables_from_file(path.to_str().expect("fixture path is UTF-8"))
        .unwrap_or_else(|e| panic!("Missing fixture {}: {e:#}", path.display()))
}

fn process_edition() -> OutputData {
    let pipeline = DocumentPipeline::new(&EngineConfig::default()).expect("default config compiles");
    pipeline.process(&load_edition())
}

fn column(table: &TableData, name: &str) -> usize {
    table
        .columns
        .iter()
        .position(|c| c == name)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", name, table.columns))
}

fn cell<'a>(table: &'a TableData, row: usize, name: &str) -> &'a str {
    &table.data[row][column(table, name)]
}

// ============================================================================
// Boundary 1: classification
// ============================================================================

mod classification {
    use super::*;

    #[test]
    fn fixture_loads_all_raw_tables() {
        assert_eq!(load_edition().len(), 7);
    }

    #[test]
    fn every_category_receives_rows() {
        let pipeline = DocumentPipeline::new(&EngineConfig::default()).unwrap();
        let buckets = pipeline.classify(&load_edition());
        for category in Category::ALL {
            assert!(!buckets.get(category).is_empty(), "{category} bucket is empty");
        }
        assert_eq!(buckets.filled(), 9);
    }

    #[test]
    fn continuation_fragment_is_appended() {
        let pipeline = DocumentPipeline::new(&EngineConfig::default()).unwrap();
        let buckets = pipeline.classify(&load_edition());
        assert_eq!(buckets.get(Category::MutualFundsGs).rows.len(), 4);
        assert_eq!(buckets.get(Category::MutualFundsUsd).rows.len(), 1);
    }

    #[test]
    fn marker_rows_belong_to_no_bucket() {
        let pipeline = DocumentPipeline::new(&EngineConfig::default()).unwrap();
        let buckets = pipeline.classify(&load_edition());
        for (category, bucket) in buckets.iter() {
            for row in &bucket.rows {
                let first = row.first().cloned().flatten().unwrap_or_default();
                assert_ne!(first, "CDA", "{category} kept a CDA marker row");
                assert_ne!(first, "Acciones", "{category} kept the stocks marker row");
                assert!(!first.starts_with("Bonos en"), "{category} kept the bonds marker row");
            }
        }
    }

    #[test]
    fn unrecognised_table_is_dropped() {
        let pipeline = DocumentPipeline::new(&EngineConfig::default()).unwrap();
        let tables = load_edition();
        let page_number = &tables[5];
        assert_eq!(page_number.width(), 5);

        let alone = pipeline.classify(std::slice::from_ref(page_number));
        assert_eq!(alone.filled(), 0);
    }
}

// ============================================================================
// Boundary 2: output record
// ============================================================================

mod output_structure {
    use super::*;

    #[test]
    fn record_has_nine_titled_tables() {
        let output = process_edition();
        let value = serde_json::to_value(&output).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 9);
        for category in Category::ALL {
            assert_eq!(obj[category.key()]["title"], category.default_title());
        }
    }

    #[test]
    fn rows_match_column_count() {
        let output = process_edition();
        for (category, table) in output.iter() {
            assert!(!table.columns.is_empty(), "{category} has no columns");
            for (i, row) in table.data.iter().enumerate() {
                assert_eq!(
                    row.len(),
                    table.columns.len(),
                    "{category} row {i} width differs from its columns"
                );
            }
        }
    }

    #[test]
    fn no_blank_rows_survive() {
        let output = process_edition();
        for (category, table) in output.iter() {
            for row in &table.data {
                assert!(row.iter().any(|v| !v.trim().is_empty()), "{category} has a blank row");
            }
        }
    }

    #[test]
    fn glyph_artifacts_are_decoded() {
        let json = serde_json::to_string(&process_edition()).unwrap();
        assert!(!json.contains("(cid:"), "undecoded glyph left in output");
        assert!(json.contains("Calificación"));
        assert!(json.contains("Plazo Residual en años"));
    }

    #[test]
    fn processing_is_deterministic() {
        assert_eq!(process_edition(), process_edition());
    }
}

// ============================================================================
// Boundary 2: spot values per category
// ============================================================================

mod category_values {
    use super::*;

    #[test]
    fn funds_drop_incomplete_rows() {
        let output = process_edition();
        let gs = output.get(Category::MutualFundsGs);
        assert_eq!(gs.data.len(), 3);
        assert!(gs.data.iter().all(|r| r[0] != "Cadiem Ahorro"));
        assert_eq!(cell(gs, 0, "Monto mínimo"), "100.000");

        assert_eq!(output.get(Category::MutualFundsUsd).data.len(), 1);
        assert_eq!(output.get(Category::InvestmentFundsGs).data.len(), 1);
        let usd = output.get(Category::InvestmentFundsUsd);
        assert_eq!(cell(usd, 0, "Fondo"), "FI Dólares I");
    }

    #[test]
    fn guarani_bonds_split_rating_and_yield() {
        let output = process_edition();
        let bonds = output.get(Category::BondsGs);
        assert_eq!(bonds.data.len(), 3, "noise row should be gone: {:?}", bonds.data);
        assert_eq!(cell(bonds, 0, "Emisor"), "Banco Continental");
        assert_eq!(cell(bonds, 0, "Calificación"), "AAA py");
        assert_eq!(cell(bonds, 0, "Rendimiento"), "8,75%");
        assert_eq!(cell(bonds, 1, "Calificación"), "AA- py");
    }

    #[test]
    fn guarani_cda_uses_its_own_header() {
        let output = process_edition();
        let cda = output.get(Category::CdaGs);
        assert_eq!(cda.data.len(), 2);
        assert_eq!(cell(cda, 0, "Tasa"), "8,25%");
        assert_eq!(cell(cda, 0, "Valor Nominal"), "10000000");
    }

    #[test]
    fn dollar_sections_are_separated() {
        let output = process_edition();
        let bonds = output.get(Category::BondsUsd);
        assert_eq!(bonds.data.len(), 2);
        assert_eq!(cell(bonds, 1, "Emisor"), "Telecel");

        let cda = output.get(Category::CdaUsd);
        assert_eq!(cda.data.len(), 1);
        assert_eq!(cell(cda, 0, "Emisor"), "Banco Basa");
        assert_eq!(cell(cda, 0, "Calificación"), "AA+py");
        assert_eq!(cell(cda, 0, "Tasa"), "5,25%");
    }

    #[test]
    fn stocks_amounts_are_compacted() {
        let output = process_edition();
        let stocks = output.get(Category::Stocks);
        assert_eq!(stocks.data.len(), 2);
        assert_eq!(cell(stocks, 0, "Tipo"), "Preferida");
        assert_eq!(cell(stocks, 0, "Disponibilidad"), "1200");
        assert_eq!(cell(stocks, 0, "Valor de venta"), "1150000");
        // missing cells inherit the value above
        assert_eq!(cell(stocks, 1, "Observaciones"), "Anual");
    }
}

// ============================================================================
// Processor boundary
// ============================================================================

mod processor {
    use super::*;

    #[test]
    fn uncached_processor_matches_pipeline() {
        let processor = DocumentProcessor::new_uncached();
        let output = processor.process_tables(&load_edition()).unwrap();
        assert_eq!(output, process_edition());
    }

    #[test]
    fn captured_stages_agree_with_output() {
        let processor = DocumentProcessor::new_uncached();
        let stages = processor
            .process_tables_capture_stages(&load_edition(), &EngineConfig::default())
            .unwrap();
        assert_eq!(stages.buckets.filled(), 9);
        assert_eq!(stages.output, process_edition());
    }

    #[test]
    fn cached_run_returns_the_same_record() {
        let cache_dir = std::env::temp_dir().join("boletin_pipeline_tests_cache");
        std::fs::remove_dir_all(&cache_dir).ok();
        let processor = DocumentProcessor::new_cli_with_cache(cache_dir.to_str().unwrap()).unwrap();
        let tables = load_edition();
        let config = EngineConfig::default();

        let first = processor
            .process_tables_with_config_and_profiling(&tables, &config, false, false)
            .unwrap();
        let second = processor
            .process_tables_with_config_and_profiling(&tables, &config, false, false)
            .unwrap();
        assert_eq!(first, second);
        assert!(cache_dir.join("output").read_dir().unwrap().next().is_some());
        std::fs::remove_dir_all(&cache_dir).ok();
    }

    #[test]
    fn custom_titles_flow_into_the_record() {
        let mut config = EngineConfig::default();
        config.titles.insert(Category::Stocks, "Acciones disponibles".to_string());
        let output = DocumentProcessor::new_uncached()
            .process_tables_with_config(&load_edition(), &config)
            .unwrap();
        assert_eq!(output.get(Category::Stocks).title, "Acciones disponibles");
        assert_eq!(output.get(Category::BondsGs).title, Category::BondsGs.default_title());
    }
}
