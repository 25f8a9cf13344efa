//! Markdown and JSON report generation.
//!
//! This module renders the aggregated grid as a Markdown table or as
//! pretty-printed JSON.

use crate::models::{format_value, PeriodRow, Report, ReportMetadata};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, title: &str) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", title));

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Quarter x category table
    output.push_str(&generate_grid_section(report));

    // Per-category totals
    output.push_str(&generate_category_section(report));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.record_count));
    if let (Some(first), Some(last)) = (metadata.first_period, metadata.last_period) {
        section.push_str(&format!("- **Quarters:** {} to {}\n", first, last));
    }
    section.push('\n');

    section
}

/// Generate the quarter table: one row per period, one column per category.
fn generate_grid_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Totals by Quarter\n\n");

    section.push_str("| Quarter |");
    for category in &report.categories {
        section.push_str(&format!(" {} |", escape_cell(category)));
    }
    section.push_str(" **Total** |\n");

    section.push_str("|:---|");
    for _ in &report.categories {
        section.push_str("---:|");
    }
    section.push_str("---:|\n");

    for row in &report.periods {
        section.push_str(&generate_period_row(row));
    }

    section.push_str(&format!(
        "| **Total** |{} **{}** |\n\n",
        report
            .category_totals
            .iter()
            .map(|c| format!(" {} |", format_value(c.total)))
            .collect::<String>(),
        format_value(report.grand_total)
    ));

    section
}

fn generate_period_row(row: &PeriodRow) -> String {
    let cells: String = row
        .totals
        .iter()
        .map(|t| format!(" {} |", format_value(t.total)))
        .collect();

    format!("| {} |{} {} |\n", row.period, cells, format_value(row.sum))
}

/// Generate the per-category section, largest first.
fn generate_category_section(report: &Report) -> String {
    if report.category_totals.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Totals by Category\n\n");
    section.push_str("| Category | Total |\n");
    section.push_str("|:---|---:|\n");

    let mut categories: Vec<_> = report.category_totals.iter().collect();
    categories.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for entry in categories {
        section.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&entry.category),
            format_value(entry.total)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by QuarterChart*\n".to_string()
}

/// Escape pipes so category names can't break the table.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
