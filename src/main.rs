//! QuarterChart - quarterly totals by category
//!
//! A CLI tool that loads dated, categorized records, sums them per
//! calendar quarter and category (zero-filling every quarter in range),
//! and renders the result as a stacked bar chart, JSON, or Markdown.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, unreadable data, invalid dates, write failure)

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::Report;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("QuarterChart v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .quarterchart.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the output directory, format, and chart style.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, aggregate, render, and write. Nothing is written unless every
/// earlier step succeeded.
fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config
        .chart
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid chart configuration")?;

    let source = args
        .data_source()
        .context("No data source given (use --input or --sample)")?;

    // Step 1: Load records
    if !args.quiet {
        println!("📥 Loading records from: {}", source);
    }
    let rows = source
        .load()
        .with_context(|| format!("Failed to load records from {}", source))?;
    info!("Loaded {} records", rows.len());

    if args.preview > 0 && !args.quiet {
        println!("\n{}\n", dataset::preview(&rows, args.preview));
    }

    // Step 2: Aggregate
    let grid = analysis::aggregate(&rows).context("Aggregation failed")?;
    info!(
        "Aggregated into {} periods x {} categories ({} cells)",
        grid.periods().len(),
        grid.categories().len(),
        grid.cell_count()
    );

    if !args.quiet {
        println!("📊 Quarterly Summary:");
        for line in analysis::generate_summary_text(&grid).lines() {
            println!("   {}", line);
        }
    }

    // Handle --dry-run: stop before rendering
    if args.dry_run {
        println!("\n✅ Dry run complete. No output was written.");
        return Ok(());
    }

    // Step 3: Render
    let report = Report::new(source.to_string(), rows.len(), &grid);
    let output = match config.general.format {
        OutputFormat::Svg => report::generate_svg_chart(&report, &config.chart)?,
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.chart.title),
    };

    // Step 4: Write
    let output_path = config.output_path(args.output.as_deref());
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating output directory: {}", parent.display());
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory {}", parent.display())
            })?;
        }
    }

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write output to {}", output_path.display()))?;

    let duration = start_time.elapsed().as_secs_f64();
    info!("Finished in {:.3}s", duration);

    if !args.quiet {
        println!(
            "\n✅ Done! {:?} output saved to: {}",
            config.general.format,
            output_path.display()
        );
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
