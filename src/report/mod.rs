//! Report rendering.
//!
//! Turns an aggregated grid into an SVG chart, a Markdown table, or JSON.

pub mod chart;
pub mod generator;

pub use chart::generate_svg_chart;
pub use generator::{generate_json_report, generate_markdown_report};
