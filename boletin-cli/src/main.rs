use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Import from boletin-core
use boletin_core::track::select_newsletter;
use boletin_core::{load_tables_from_file, DocumentProcessor, EngineConfig, OutputData, PipelineStages, TrackState};

// Import CLI utilities
use boletin_cli::NewsletterFetcher;

#[derive(Parser)]
#[command(name = "boletin")]
#[command(about = "Rebuild the tables of an investment newsletter into structured JSON")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the publisher for a new edition and download its PDF
    Check {
        /// Base URL of the publisher site
        #[arg(long)]
        base_url: Option<String>,

        /// Tracking marker file (default: ~/.local/share/boletin/track.json)
        #[arg(long)]
        track: Option<String>,

        /// Directory for downloaded PDFs
        #[arg(long, default_value = "newsletters")]
        output_dir: String,
    },

    /// Rebuild the nine output tables from extracted raw tables
    Process {
        /// JSON array of raw tables produced by the PDF table extractor
        #[arg(short, long)]
        tables: String,

        /// Output file path (if not specified, auto-generated based on input)
        #[arg(short, long)]
        output: Option<String>,

        /// Path to custom config file (YAML format)
        #[arg(short, long)]
        config: Option<String>,

        /// Enable detailed profiling of all pipeline steps
        #[arg(long)]
        profile: bool,

        /// Skip cache and force fresh processing (useful for development/testing)
        #[arg(long)]
        skip_cache: bool,

        /// Cache directory for processed outputs
        #[arg(long, default_value = "cache")]
        cache_dir: String,

        /// Dump the classifier buckets and final output to a directory
        #[arg(long)]
        dump_stages: bool,

        /// Directory for stage dump output (default: test_outputs/stages)
        #[arg(long, default_value = "test_outputs/stages")]
        stages_dir: String,
    },

    /// Print the default configuration as YAML
    ShowConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Check {
            base_url,
            track,
            output_dir,
        } => check(base_url.as_deref(), track.as_deref(), &output_dir),
        Command::Process {
            tables,
            output,
            config,
            profile,
            skip_cache,
            cache_dir,
            dump_stages,
            stages_dir,
        } => {
            println!("🦀 Boletin Table Rebuilder");

            // Check if input file exists
            if !Path::new(&tables).exists() {
                println!("⚠️  Raw tables not found at: {}", tables);
                println!("   Please check the file path.");
                return Ok(());
            }

            // An explicit config that cannot be loaded is an error, not a silent default
            let engine_config = match config.as_deref() {
                Some(config_path) => {
                    let loaded = EngineConfig::load_from_file(config_path)?;
                    println!("📋 Loaded config from: {}", config_path);
                    loaded
                }
                None => {
                    println!("📋 Using default config");
                    EngineConfig::default()
                }
            };

            let raw_tables = load_tables_from_file(&tables)?;
            println!("📄 Processing: {} ({} raw tables)", tables, raw_tables.len());

            let processor = if skip_cache {
                DocumentProcessor::new_uncached()
            } else {
                DocumentProcessor::new_cli_with_cache(&cache_dir)?
            };

            // Stage dump mode: capture and save all intermediates
            if dump_stages {
                println!("\n🔬 Pipeline stage dump mode");
                match processor.process_tables_capture_stages(&raw_tables, &engine_config) {
                    Ok(stages) => {
                        save_stages(&stages, &tables, &stages_dir)?;
                        println!("\n✅ All stages dumped to: {}", stages_dir);
                    }
                    Err(e) => {
                        eprintln!("❌ Stage dump failed: {e:#}");
                        std::process::exit(1);
                    }
                }
                return Ok(());
            }

            match processor.process_tables_with_config_and_profiling(
                &raw_tables,
                &engine_config,
                profile,
                skip_cache,
            ) {
                Ok(output_data) => {
                    println!("✅ Successfully rebuilt newsletter tables");
                    print_metrics(&output_data);

                    let output_path = output.unwrap_or_else(|| default_output_path(&tables));
                    output_data.save_to_json(&output_path)?;
                    println!("💾 Results saved to: {}", output_path);
                }
                Err(e) => {
                    eprintln!("❌ Processing failed: {e:#}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Command::ShowConfig => {
            print!("{}", EngineConfig::default().to_yaml()?);
            Ok(())
        }
    }
}

fn check(base_url: Option<&str>, track: Option<&str>, output_dir: &str) -> Result<()> {
    let fetcher = NewsletterFetcher::new(base_url)?;
    let track_path = track
        .map(PathBuf::from)
        .unwrap_or_else(|| fetcher.track_path());

    println!("🔍 Checking {}", fetcher.media_url());
    let entries = fetcher.list_media()?;
    let Some(entry) = select_newsletter(&entries) else {
        println!("📭 No newsletter found among {} media entries", entries.len());
        return Ok(());
    };
    println!("📰 Latest newsletter: {} ({})", entry.slug, entry.date);

    let state = TrackState::load(&track_path)?;
    if !state.needs_processing(entry)? {
        println!("✅ Up to date (last processed {})", state.newsletter_date.as_deref().unwrap_or("-"));
        return Ok(());
    }

    let pdf_path = fetcher.download_pdf(entry, Path::new(output_dir))?;
    println!("💾 Saved PDF to: {}", pdf_path.display());

    if let Some(parent) = track_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let advanced = TrackState::advanced_to(entry);
    advanced.save(&track_path)?;
    println!(
        "📌 Tracking edition {} in {}",
        advanced.newsletter_date.as_deref().unwrap_or("-"),
        track_path.display()
    );
    println!("   Extract its tables to JSON and run: boletin process --tables <raw.json>");

    Ok(())
}

fn print_metrics(output: &OutputData) {
    println!("📊 Table metrics:");
    for (category, table) in output.iter() {
        println!(
            "   - {:<20} {:>4} rows  {}",
            category.key(),
            table.data.len(),
            table.title
        );
    }
}

fn default_output_path(tables_path: &str) -> String {
    let input_name = Path::new(tables_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{input_name}_boletin.json")
}

fn save_stages(stages: &PipelineStages, tables_path: &str, output_dir: &str) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    // Stage 1: Classifier buckets
    let buckets_path = format!("{}/stage1_buckets.json", output_dir);
    fs::write(&buckets_path, serde_json::to_string_pretty(&stages.buckets)?)?;
    println!("  💾 {} ({} filled)", buckets_path, stages.buckets.filled());

    // Stage 2: Final output
    let output_path = format!("{}/stage2_output.json", output_dir);
    stages.output.save_to_json(&output_path)?;
    println!("  💾 {} ({} rows)", output_path, stages.output.total_rows());

    // Summary file: quick reference for validation scripts
    let rows: serde_json::Map<String, serde_json::Value> = stages
        .output
        .iter()
        .map(|(category, table)| (category.key().to_string(), table.data.len().into()))
        .collect();
    let summary = serde_json::json!({
        "input_tables": tables_path,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "stage_counts": {
            "filled_buckets": stages.buckets.filled(),
            "output_rows": rows,
        }
    });
    let summary_path = format!("{}/summary.json", output_dir);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path);

    Ok(())
}
