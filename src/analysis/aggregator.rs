//! Quarterly aggregation and grid statistics.
//!
//! Aggregation is a two-step pure function: build the full key space of
//! periods × categories, then fold every record's total into it.

use crate::models::{format_value, AggregateError, Grid, Period, Record, RecordRow};
use std::collections::HashSet;
use tracing::debug;

/// Aggregate raw rows into a complete quarter × category grid.
///
/// Every row is parsed before anything is summed, so the first invalid
/// date aborts the whole aggregation with no partial result.
pub fn aggregate(rows: &[RecordRow]) -> Result<Grid, AggregateError> {
    let records = rows
        .iter()
        .map(RecordRow::parse)
        .collect::<Result<Vec<_>, _>>()?;

    aggregate_records(&records)
}

/// Aggregate already-parsed records into a complete grid.
pub fn aggregate_records(records: &[Record]) -> Result<Grid, AggregateError> {
    let first = records.iter().map(|r| r.date).min();
    let last = records.iter().map(|r| r.date).max();
    let (Some(first), Some(last)) = (first, last) else {
        return Err(AggregateError::EmptyInput);
    };

    let periods = period_range(Period::from_date(first), Period::from_date(last));
    let categories = distinct_categories(records);

    debug!(
        "Building grid: {} periods x {} categories",
        periods.len(),
        categories.len()
    );

    let mut grid = Grid::zeroed(periods, categories);
    for record in records {
        grid.accumulate(record.period(), &record.category, record.total());
    }

    Ok(grid)
}

/// Every quarter from `start` to `end`, inclusive, in chronological order.
///
/// Returns an empty list when `start` is after `end`.
pub fn period_range(start: Period, end: Period) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut current = start;

    while current <= end {
        periods.push(current);
        current = current.next();
    }

    periods
}

/// Distinct categories in the order they first appear.
///
/// Labels are compared exactly; no case folding or trimming.
pub fn distinct_categories(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();

    records
        .iter()
        .filter(|r| seen.insert(r.category.as_str()))
        .map(|r| r.category.clone())
        .collect()
}

/// Periods where every category is zero.
pub fn empty_periods(grid: &Grid) -> Vec<Period> {
    grid.periods()
        .iter()
        .copied()
        .filter(|p| grid.period_total(*p) == 0.0)
        .collect()
}

/// Period with the largest total. Earliest wins on ties.
pub fn busiest_period(grid: &Grid) -> Option<(Period, f64)> {
    grid.periods()
        .iter()
        .map(|p| (*p, grid.period_total(*p)))
        .fold(None, |best, (period, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((period, total)),
        })
}

/// Generate a text summary of the grid.
pub fn generate_summary_text(grid: &Grid) -> String {
    let mut lines = Vec::new();

    let span = match (grid.periods().first(), grid.periods().last()) {
        (Some(first), Some(last)) => format!("{} to {}", first, last),
        _ => "-".to_string(),
    };

    lines.push(format!("Periods: {} ({})", grid.periods().len(), span));
    lines.push(format!("Categories: {}", grid.categories().len()));
    lines.push(format!("Grand total: {}", format_value(grid.grand_total())));

    if let Some((period, total)) = busiest_period(grid) {
        lines.push(format!("Busiest quarter: {} ({})", period, format_value(total)));
    }

    let empty = empty_periods(grid);
    if !empty.is_empty() {
        lines.push(format!("Quarters with no records: {}", empty.len()));
    }

    lines.push(String::new());
    lines.push("By Category:".to_string());

    let mut categories = grid.category_totals();
    categories.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for entry in categories {
        lines.push(format!("- {}: {}", entry.category, format_value(entry.total)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(label: &str) -> Period {
        label.parse().unwrap()
    }

    fn example_rows() -> Vec<RecordRow> {
        vec![
            RecordRow::new("2022-12-01", "A", 22.0, 44.0),
            RecordRow::new("2024-03-03", "B", 22.0, 1.0),
            RecordRow::new("2024-06-02", "A", 14.0, 44.0),
        ]
    }

    #[test]
    fn test_period_range_spans_years() {
        let range = period_range(period("2022-Q4"), period("2024-Q2"));
        let labels: Vec<String> = range.iter().map(Period::to_string).collect();
        assert_eq!(
            labels,
            vec!["2022-Q4", "2023-Q1", "2023-Q2", "2023-Q3", "2023-Q4", "2024-Q1", "2024-Q2"]
        );
    }

    #[test]
    fn test_period_range_single_and_reversed() {
        assert_eq!(period_range(period("2024-Q1"), period("2024-Q1")).len(), 1);
        assert!(period_range(period("2024-Q2"), period("2024-Q1")).is_empty());
    }

    #[test]
    fn test_end_to_end_example() {
        let grid = aggregate(&example_rows()).unwrap();

        assert_eq!(grid.periods().len(), 7);
        assert_eq!(grid.categories(), &["A".to_string(), "B".to_string()]);

        assert_eq!(grid.get(period("2022-Q4"), "A"), Some(66.0));
        assert_eq!(grid.get(period("2022-Q4"), "B"), Some(0.0));
        assert_eq!(grid.get(period("2024-Q1"), "B"), Some(23.0));
        assert_eq!(grid.get(period("2024-Q1"), "A"), Some(0.0));
        assert_eq!(grid.get(period("2024-Q2"), "A"), Some(58.0));
        assert_eq!(grid.get(period("2024-Q2"), "B"), Some(0.0));

        for label in ["2023-Q1", "2023-Q2", "2023-Q3", "2023-Q4"] {
            assert_eq!(grid.get(period(label), "A"), Some(0.0));
            assert_eq!(grid.get(period(label), "B"), Some(0.0));
        }

        for row in grid.rows() {
            let names: Vec<&str> = row.totals.iter().map(|t| t.category.as_str()).collect();
            assert_eq!(names, vec!["A", "B"]);
        }
    }

    #[test]
    fn test_completeness_no_missing_or_duplicate_keys() {
        let rows = vec![
            RecordRow::new("2023-02-10", "X", 1.0, 1.0),
            RecordRow::new("2023-02-11", "Y", 1.0, 1.0),
            RecordRow::new("2023-11-30", "Z", 1.0, 1.0),
            RecordRow::new("2023-05-01", "X", 1.0, 1.0),
        ];
        let grid = aggregate(&rows).unwrap();

        assert_eq!(grid.periods().len(), 4);
        assert_eq!(grid.categories().len(), 3);
        assert_eq!(grid.cell_count(), 12);

        let mut sorted = grid.periods().to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, grid.periods());
    }

    #[test]
    fn test_sums_multiple_records_per_cell() {
        let rows = vec![
            RecordRow::new("2024-01-01", "A", 1.0, 2.0),
            RecordRow::new("2024-03-31", "A", 10.0, 20.0),
            RecordRow::new("2024-02-15", "A", 100.0, 200.0),
        ];
        let grid = aggregate(&rows).unwrap();

        assert_eq!(grid.periods(), &[period("2024-Q1")]);
        assert_eq!(grid.get(period("2024-Q1"), "A"), Some(333.0));
    }

    #[test]
    fn test_categories_compared_exactly() {
        let rows = vec![
            RecordRow::new("2024-01-01", "Alpha", 1.0, 0.0),
            RecordRow::new("2024-01-02", "alpha", 2.0, 0.0),
            RecordRow::new("2024-01-03", "Alpha ", 4.0, 0.0),
        ];
        let grid = aggregate(&rows).unwrap();

        assert_eq!(grid.categories().len(), 3);
        assert_eq!(grid.get(period("2024-Q1"), "Alpha"), Some(1.0));
        assert_eq!(grid.get(period("2024-Q1"), "alpha"), Some(2.0));
        assert_eq!(grid.get(period("2024-Q1"), "Alpha "), Some(4.0));
    }

    #[test]
    fn test_categories_first_seen_order() {
        let rows = vec![
            RecordRow::new("2024-05-01", "Zeta", 1.0, 0.0),
            RecordRow::new("2024-01-01", "Alpha", 1.0, 0.0),
            RecordRow::new("2024-02-01", "Zeta", 1.0, 0.0),
        ];
        let grid = aggregate(&rows).unwrap();
        assert_eq!(grid.categories(), &["Zeta".to_string(), "Alpha".to_string()]);
        assert_eq!(grid.periods().first(), Some(&period("2024-Q1")));
    }

    #[test]
    fn test_invalid_date_aborts() {
        let mut rows = example_rows();
        rows.push(RecordRow::new("not-a-date", "C", 1.0, 1.0));

        let err = aggregate(&rows).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidDate { .. }));
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(aggregate(&[]), Err(AggregateError::EmptyInput)));
        assert!(matches!(
            aggregate_records(&[]),
            Err(AggregateError::EmptyInput)
        ));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let rows = example_rows();
        let first = aggregate(&rows).unwrap();
        let second = aggregate(&rows).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_busiest_and_empty_periods() {
        let grid = aggregate(&example_rows()).unwrap();

        assert_eq!(busiest_period(&grid), Some((period("2022-Q4"), 66.0)));
        assert_eq!(empty_periods(&grid).len(), 4);
    }

    #[test]
    fn test_generate_summary_text() {
        let grid = aggregate(&example_rows()).unwrap();
        let text = generate_summary_text(&grid);

        assert!(text.contains("Periods: 7 (2022-Q4 to 2024-Q2)"));
        assert!(text.contains("Categories: 2"));
        assert!(text.contains("Grand total: 147"));
        assert!(text.contains("- A: 124"));
        assert!(text.contains("- B: 23"));
    }
}
