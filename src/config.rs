//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.quarterchart.toml` files.

use crate::cli::{OutputFormat, MIN_CHART_DIMENSION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".quarterchart.toml";

/// File stem of the default output artifact.
pub const DEFAULT_OUTPUT_STEM: &str = "total_by_year_quarter";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Chart settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the default output file is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

/// Chart appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_x_label")]
    pub x_label: String,

    #[serde(default = "default_y_label")]
    pub y_label: String,

    /// Heading shown above the category legend.
    #[serde(default = "default_legend_title")]
    pub legend_title: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Category colors as hex strings, assigned in category order and cycled.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            x_label: default_x_label(),
            y_label: default_y_label(),
            legend_title: default_legend_title(),
            width: default_width(),
            height: default_height(),
            palette: default_palette(),
        }
    }
}

impl ChartConfig {
    /// Check the settings a chart can actually be drawn with.
    ///
    /// Runs on the merged configuration, so sizes from the config file are
    /// held to the same minimum as `--width`/`--height`.
    pub fn validate(&self) -> Result<(), String> {
        for (name, px) in [("chart.width", self.width), ("chart.height", self.height)] {
            if px < MIN_CHART_DIMENSION {
                return Err(format!(
                    "{} is {} but must be at least {} pixels",
                    name, px, MIN_CHART_DIMENSION
                ));
            }
        }

        if let Some(bad) = self.palette.iter().find(|c| parse_hex_color(c).is_none()) {
            return Err(format!("chart.palette entry '{}' is not a #rrggbb color", bad));
        }

        Ok(())
    }
}

/// Parse a `#rrggbb` color into its channels.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn default_title() -> String {
    "Project Totals by Quarter".to_string()
}

fn default_x_label() -> String {
    "Quarters".to_string()
}

fn default_y_label() -> String {
    "Total".to_string()
}

fn default_legend_title() -> String {
    "Project".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

// ColorBrewer "Paired"
fn default_palette() -> Vec<String> {
    vec![
        "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
        "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only explicitly provided CLI values override config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref title) = args.title {
            self.chart.title = title.clone();
        }
        if let Some(width) = args.width {
            self.chart.width = width;
        }
        if let Some(height) = args.height {
            self.chart.height = height;
        }

        // An empty palette would leave segments uncolored
        if self.chart.palette.is_empty() {
            self.chart.palette = default_palette();
        }
    }

    /// Resolve where the rendered output goes.
    ///
    /// An explicit `--output` wins; otherwise the default file name is
    /// placed in the configured output directory.
    pub fn output_path(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => self.general.output_dir.join(format!(
                "{}.{}",
                DEFAULT_OUTPUT_STEM,
                self.general.format.extension()
            )),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
