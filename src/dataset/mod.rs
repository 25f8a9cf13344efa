//! Dataset loading.
//!
//! Records come from a CSV or JSON file, or from the built-in sample
//! dataset. Files are read whole; datasets are expected to fit in memory.

use crate::models::RecordRow;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported dataset format: {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),
}

/// File formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(DatasetFormat::Csv),
            "json" => Some(DatasetFormat::Json),
            _ => None,
        }
    }
}

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// The six-row dataset shipped with the tool.
    Sample,
    /// A CSV or JSON file.
    File(PathBuf),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Sample => write!(f, "built-in sample"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DataSource {
    /// Load every row from this source.
    pub fn load(&self) -> Result<Vec<RecordRow>, DatasetError> {
        match self {
            DataSource::Sample => Ok(sample_rows()),
            DataSource::File(path) => load_records(path),
        }
    }
}

/// Load rows from a dataset file, choosing the parser by extension.
pub fn load_records(path: &Path) -> Result<Vec<RecordRow>, DatasetError> {
    let format = DatasetFormat::from_path(path)
        .ok_or_else(|| DatasetError::UnsupportedFormat(path.to_path_buf()))?;

    info!("Loading {:?} dataset from: {}", format, path.display());

    let content = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = match format {
        DatasetFormat::Csv => parse_csv(content.as_bytes()).map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?,
        DatasetFormat::Json => parse_json(&content).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })?,
    };

    debug!("Loaded {} rows", rows.len());
    Ok(rows)
}

/// Parse CSV with a header row.
///
/// Only headers are trimmed. Category cells are kept exactly as written;
/// padding around numbers and dates is tolerated when those are parsed.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RecordRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    reader.deserialize().collect()
}

/// Parse a JSON array of row objects.
pub fn parse_json(content: &str) -> Result<Vec<RecordRow>, serde_json::Error> {
    serde_json::from_str(content)
}

/// The sample project dataset.
pub fn sample_rows() -> Vec<RecordRow> {
    vec![
        RecordRow::new("2022-12-01", "Project Name", 22.0, 44.0),
        RecordRow::new("2024-03-03", "Project Name2", 22.0, 1.0),
        RecordRow::new("2024-04-02", "Project Name4", 23.0, 22.0),
        RecordRow::new("2024-06-02", "Project Name", 14.0, 44.0),
        RecordRow::new("2024-09-02", "Project Name2", 13.0, 13.0),
        RecordRow::new("2025-10-03", "Project Name3", 15.0, 16.0),
    ]
}

/// Render the first `n` rows as an aligned text table.
pub fn preview(rows: &[RecordRow], n: usize) -> String {
    let shown = &rows[..rows.len().min(n)];
    let headers = ["date", "category", "value_a", "value_b"];

    let cells: Vec<[String; 4]> = shown
        .iter()
        .map(|r| {
            [
                r.date.clone(),
                r.category.clone(),
                r.value_a.to_string(),
                r.value_b.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(
        headers
            .iter()
            .zip(widths)
            .map(|(h, w)| format!("{:<w$}", h, w = w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(
            row.iter()
                .zip(widths)
                .map(|(c, w)| format!("{:<w$}", c, w = w))
                .collect::<Vec<_>>()
                .join("  "),
        );
    }
    if rows.len() > shown.len() {
        lines.push(format!("... {} more rows", rows.len() - shown.len()));
    }

    lines.join("\n")
}
