//! Data models for the quarterly aggregator.
//!
//! This module contains the core data structures used throughout the
//! application: input rows, parsed records, quarter periods, the
//! aggregation grid, and the report wrapper handed to the renderers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date format accepted for record dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while aggregating records into a grid.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A record's date could not be interpreted as a calendar date.
    #[error("invalid date '{value}' for category '{category}': {source}")]
    InvalidDate {
        value: String,
        category: String,
        #[source]
        source: chrono::ParseError,
    },

    /// No records were supplied.
    #[error("no records to aggregate")]
    EmptyInput,
}

/// Error returned when a period label is not of the form `YYYY-Qn`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period label '{0}' (expected YYYY-Qn)")]
pub struct ParsePeriodError(pub String);

/// A calendar quarter.
///
/// Ordering is chronological: by year, then by quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    quarter: u8,
}

impl Period {
    /// Creates a period, returning `None` if `quarter` is not in `1..=4`.
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4)
            .contains(&quarter)
            .then_some(Self { year, quarter })
    }

    /// The quarter containing `date`. Quarter boundaries are inclusive.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: ((date.month() + 2) / 3) as u8,
        }
    }

    #[allow(dead_code)] // Accessor for callers building periods by hand
    pub fn year(&self) -> i32 {
        self.year
    }

    #[allow(dead_code)] // Accessor for callers building periods by hand
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// The following quarter; Q4 rolls over into Q1 of the next year.
    pub fn next(self) -> Self {
        if self.quarter == 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePeriodError(s.to_string());
        let (year, quarter) = s.split_once("-Q").ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let quarter: u8 = quarter.parse().map_err(|_| err())?;
        Period::new(year, quarter).ok_or_else(err)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// A raw input row, as read from a dataset file or literal data.
///
/// Column names from the original project spreadsheet (`Date`, `Project`,
/// `Number1`, `Number2`) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    /// Calendar date in `YYYY-MM-DD` form.
    #[serde(alias = "Date")]
    pub date: String,
    /// Grouping label.
    #[serde(alias = "Project")]
    pub category: String,
    /// First measure.
    #[serde(alias = "Number1", deserialize_with = "deserialize_measure")]
    pub value_a: f64,
    /// Second measure.
    #[serde(alias = "Number2", deserialize_with = "deserialize_measure")]
    pub value_b: f64,
}

/// Accepts a number, or a string holding a number with surrounding padding.
///
/// CSV cells arrive as strings, so `" 22 "` must parse; the category column
/// is never trimmed.
fn deserialize_measure<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    struct MeasureVisitor;

    impl<'de> Visitor<'de> for MeasureVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(MeasureVisitor)
}

impl RecordRow {
    pub fn new(date: &str, category: &str, value_a: f64, value_b: f64) -> Self {
        Self {
            date: date.to_string(),
            category: category.to_string(),
            value_a,
            value_b,
        }
    }

    /// Parse the row into a typed record.
    pub fn parse(&self) -> Result<Record, AggregateError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|source| {
            AggregateError::InvalidDate {
                value: self.date.clone(),
                category: self.category.clone(),
                source,
            }
        })?;

        Ok(Record {
            date,
            category: self.category.clone(),
            value_a: self.value_a,
            value_b: self.value_b,
        })
    }
}

/// A dated, categorized pair of measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub category: String,
    pub value_a: f64,
    pub value_b: f64,
}

impl Record {
    /// Sum of both measures.
    pub fn total(&self) -> f64 {
        self.value_a + self.value_b
    }

    /// The quarter this record falls in.
    pub fn period(&self) -> Period {
        Period::from_date(self.date)
    }
}

/// Total for one category within a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// One period of the grid, with a total for every category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    pub period: Period,
    pub totals: Vec<CategoryTotal>,
    /// Sum across all categories (the stacked bar height).
    pub sum: f64,
}

/// Complete period × category matrix of summed totals.
///
/// Every period between the first and last record's quarter is present,
/// and every period carries a total for every category, zero-filled when
/// no record matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    periods: Vec<Period>,
    categories: Vec<String>,
    category_index: HashMap<String, usize>,
    cells: BTreeMap<Period, Vec<f64>>,
}

impl Grid {
    /// Build a grid covering `periods × categories` with every cell at zero.
    pub(crate) fn zeroed(periods: Vec<Period>, categories: Vec<String>) -> Self {
        let category_index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let cells = periods
            .iter()
            .map(|p| (*p, vec![0.0; categories.len()]))
            .collect();

        Self {
            periods,
            categories,
            category_index,
            cells,
        }
    }

    /// Add `amount` to a cell. Keys outside the grid are ignored.
    pub(crate) fn accumulate(&mut self, period: Period, category: &str, amount: f64) -> bool {
        let Some(&idx) = self.category_index.get(category) else {
            return false;
        };
        match self.cells.get_mut(&period) {
            Some(row) => {
                row[idx] += amount;
                true
            }
            None => false,
        }
    }

    /// Periods in chronological order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Categories in first-seen order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of cells (`periods × categories`).
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Total for a single cell, or `None` if the key is outside the grid.
    #[allow(dead_code)] // Point lookup; renderers walk rows() instead
    pub fn get(&self, period: Period, category: &str) -> Option<f64> {
        let idx = *self.category_index.get(category)?;
        self.cells.get(&period).map(|row| row[idx])
    }

    /// Sum of all categories for a period.
    pub fn period_total(&self, period: Period) -> f64 {
        self.cells
            .get(&period)
            .map(|row| row.iter().sum())
            .unwrap_or(0.0)
    }

    /// Sum of each category across all periods, in grid order.
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        self.categories
            .iter()
            .enumerate()
            .map(|(idx, category)| CategoryTotal {
                category: category.clone(),
                total: self.cells.values().map(|row| row[idx]).sum(),
            })
            .collect()
    }

    /// Grand total over every cell.
    pub fn grand_total(&self) -> f64 {
        self.cells.values().flatten().sum()
    }

    /// All rows in chronological order.
    pub fn rows(&self) -> Vec<PeriodRow> {
        self.cells
            .iter()
            .map(|(period, row)| PeriodRow {
                period: *period,
                totals: self
                    .categories
                    .iter()
                    .zip(row)
                    .map(|(category, total)| CategoryTotal {
                        category: category.clone(),
                        total: *total,
                    })
                    .collect(),
                sum: row.iter().sum(),
            })
            .collect()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Where the records came from (file path or "built-in sample").
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of input records.
    pub record_count: usize,
    /// First period in the grid.
    pub first_period: Option<Period>,
    /// Last period in the grid.
    pub last_period: Option<Period>,
}

/// The aggregated grid plus metadata, as handed to the renderers.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub categories: Vec<String>,
    pub periods: Vec<PeriodRow>,
    pub category_totals: Vec<CategoryTotal>,
    pub grand_total: f64,
}

impl Report {
    pub fn new(source: String, record_count: usize, grid: &Grid) -> Self {
        let metadata = ReportMetadata {
            source,
            generated_at: Utc::now(),
            record_count,
            first_period: grid.periods().first().copied(),
            last_period: grid.periods().last().copied(),
        };

        Self {
            metadata,
            categories: grid.categories().to_vec(),
            periods: grid.rows(),
            category_totals: grid.category_totals(),
            grand_total: grid.grand_total(),
        }
    }
}

/// Format a total for display: whole numbers without decimals, others to two places.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        format!("{:.2}", value)
    }
}
