//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::dataset::DataSource;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest chart dimension accepted, in pixels.
pub const MIN_CHART_DIMENSION: u32 = 200;

/// QuarterChart - quarterly totals by category as a stacked bar chart
///
/// Sums two numeric columns per record, groups them by calendar quarter and
/// category, zero-fills every quarter in range, and renders the result.
///
/// Examples:
///   quarterchart --sample
///   quarterchart --input projects.csv --output chart.svg
///   quarterchart --input projects.json --format markdown
///   quarterchart --input projects.csv --dry-run
///   quarterchart --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset file to aggregate (.csv or .json)
    ///
    /// Columns: date, category, value_a, value_b
    /// (Date, Project, Number1, Number2 are also accepted).
    #[arg(
        short,
        long,
        value_name = "FILE",
        conflicts_with = "sample",
        required_unless_present_any = ["sample", "init_config"]
    )]
    pub input: Option<PathBuf>,

    /// Use the built-in sample dataset instead of a file
    #[arg(long)]
    pub sample: bool,

    /// Output file path
    ///
    /// Defaults to <output-dir>/total_by_year_quarter.<ext>
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for the default output file
    #[arg(long, value_name = "DIR", env = "QUARTERCHART_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format (svg, json, markdown)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Chart title
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Chart width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Chart height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Number of input rows to preview before aggregating (0 disables)
    #[arg(long, default_value = "5", value_name = "ROWS")]
    pub preview: usize,

    /// Path to configuration file
    ///
    /// If not specified, looks for .quarterchart.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load and aggregate, print the summary, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .quarterchart.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the rendered grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Stacked bar chart (default)
    #[default]
    Svg,
    /// Grid as JSON
    Json,
    /// Grid as a Markdown table
    Markdown,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The selected data source, if any.
    pub fn data_source(&self) -> Option<DataSource> {
        if self.sample {
            Some(DataSource::Sample)
        } else {
            self.input.clone().map(DataSource::File)
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.sample && self.input.is_some() {
            return Err("Cannot use both --input and --sample".to_string());
        }

        match self.input {
            Some(ref path) => {
                if !path.exists() {
                    return Err(format!("Input file does not exist: {}", path.display()));
                }
                if !path.is_file() {
                    return Err(format!("Input path is not a file: {}", path.display()));
                }
            }
            None if !self.sample => {
                return Err("Either --input or --sample is required".to_string());
            }
            None => {}
        }

        for (name, value) in [("Width", self.width), ("Height", self.height)] {
            if let Some(px) = value {
                if px < MIN_CHART_DIMENSION {
                    return Err(format!(
                        "{} must be at least {} pixels",
                        name, MIN_CHART_DIMENSION
                    ));
                }
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
