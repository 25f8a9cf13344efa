//! SVG stacked bar chart rendering.
//!
//! One bar per period, one stacked segment per category, with the period
//! total printed above every bar whose total is positive. Positive values
//! stack upward from the baseline and negative values stack downward, so a
//! negative cell never overlaps the segments below it.

use crate::config::{parse_hex_color, ChartConfig};
use crate::models::{format_value, Report};
use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

const FONT: &str = "sans-serif";

/// Used when a palette entry cannot be parsed.
const FALLBACK_COLOR: RGBColor = RGBColor(0x1f, 0x78, 0xb4);

/// Share of the axis span added as headroom above and below the bars.
const HEADROOM: f64 = 0.1;

/// One category's slice of one bar, in data units.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    period: usize,
    category: usize,
    bottom: f64,
    top: f64,
}

/// Lowest and highest points a bar reaches.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BarExtent {
    low: f64,
    high: f64,
}

#[derive(Debug)]
struct StackLayout {
    segments: Vec<Segment>,
    extents: Vec<BarExtent>,
}

/// Render the report's grid as a standalone SVG document.
pub fn generate_svg_chart(report: &Report, style: &ChartConfig) -> Result<String> {
    let layout = stack_segments(report);
    let labels: Vec<String> = report.periods.iter().map(|r| r.period.to_string()).collect();
    let bars = labels.len().max(1) as i32;

    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&style.title, (FONT, 24))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..bars).into_segmented(), value_range(&layout.extents))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|y| format_value(*y))
            .x_desc(style.x_label.as_str())
            .y_desc(style.y_label.as_str())
            .axis_desc_style((FONT, 16))
            .label_style((FONT, 14))
            .draw()?;

        // Bars take the middle half of each period slot
        let (plot_width, _) = chart.plotting_area().dim_in_pixel();
        let gap = (plot_width as f64 / bars as f64 / 4.0) as u32;

        // Legend heading, drawn as a swatch-less entry above the categories
        chart
            .draw_series(std::iter::empty::<Rectangle<(SegmentValue<i32>, f64)>>())?
            .label(style.legend_title.as_str())
            .legend(|(x, y)| EmptyElement::at((x, y)));

        for (idx, category) in report.categories.iter().enumerate() {
            let color = category_color(style, idx);
            chart
                .draw_series(
                    layout
                        .segments
                        .iter()
                        .filter(|s| s.category == idx)
                        .map(move |s| {
                            let x = s.period as i32;
                            let mut bar = Rectangle::new(
                                [
                                    (SegmentValue::Exact(x), s.bottom),
                                    (SegmentValue::Exact(x + 1), s.top),
                                ],
                                color.filled(),
                            );
                            bar.set_margin(0, 0, gap, gap);
                            bar
                        }),
                )?
                .label(category.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled()));
        }

        let annotation = TextStyle::from((FONT, 14).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(bar_annotations(report, &layout).into_iter().map(
            |(period, top, text)| {
                Text::new(
                    text,
                    (SegmentValue::CenterOf(period as i32), top),
                    annotation.clone(),
                )
            },
        ))?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, 14))
            .draw()?;

        root.present()?;
    }

    Ok(buffer)
}

/// Lay out every non-zero cell as a bar segment.
///
/// Within a bar, positive cells stack upward from zero and negative cells
/// stack downward from zero, each in category order.
fn stack_segments(report: &Report) -> StackLayout {
    let mut segments = Vec::new();
    let mut extents = Vec::with_capacity(report.periods.len());

    for (period, row) in report.periods.iter().enumerate() {
        let (mut high, mut low) = (0.0, 0.0);
        for (category, cell) in row.totals.iter().enumerate() {
            let value = cell.total;
            if value > 0.0 {
                segments.push(Segment {
                    period,
                    category,
                    bottom: high,
                    top: high + value,
                });
                high += value;
            } else if value < 0.0 {
                segments.push(Segment {
                    period,
                    category,
                    bottom: low + value,
                    top: low,
                });
                low += value;
            }
        }
        extents.push(BarExtent { low, high });
    }

    StackLayout { segments, extents }
}

/// The y-axis span: always includes zero, padded so annotations fit.
fn value_range(extents: &[BarExtent]) -> Range<f64> {
    let high = extents.iter().map(|e| e.high).fold(0.0, f64::max);
    let low = extents.iter().map(|e| e.low).fold(0.0, f64::min);

    if high - low <= 0.0 {
        return 0.0..1.0;
    }

    let pad = (high - low) * HEADROOM;
    let bottom = if low < 0.0 { low - pad } else { 0.0 };
    bottom..high + pad
}

/// `(period index, y position, label)` for every bar with a positive total.
fn bar_annotations(report: &Report, layout: &StackLayout) -> Vec<(usize, f64, String)> {
    report
        .periods
        .iter()
        .zip(&layout.extents)
        .enumerate()
        .filter(|(_, (row, _))| row.sum > 0.0)
        .map(|(i, (row, extent))| (i, extent.high, format_value(row.sum)))
        .collect()
}

fn category_color(style: &ChartConfig, idx: usize) -> RGBColor {
    if style.palette.is_empty() {
        return FALLBACK_COLOR;
    }
    parse_hex_color(&style.palette[idx % style.palette.len()])
        .map(|(r, g, b)| RGBColor(r, g, b))
        .unwrap_or(FALLBACK_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::RecordRow;

    fn report_from(rows: &[RecordRow]) -> Report {
        let grid = aggregate(rows).unwrap();
        Report::new("test".to_string(), rows.len(), &grid)
    }

    fn example_report() -> Report {
        report_from(&[
            RecordRow::new("2022-12-01", "A", 22.0, 44.0),
            RecordRow::new("2024-03-03", "B", 22.0, 1.0),
            RecordRow::new("2024-06-02", "A", 14.0, 44.0),
        ])
    }

    #[test]
    fn test_svg_document() {
        let style = ChartConfig {
            legend_title: "Teams".to_string(),
            ..ChartConfig::default()
        };
        let svg = generate_svg_chart(&example_report(), &style).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("1280"));
        assert!(svg.contains("800"));
        for text in ["Project Totals by Quarter", "Quarters", "Total", "Teams"] {
            assert!(svg.contains(text), "missing {}", text);
        }
    }

    #[test]
    fn test_every_period_labeled() {
        let svg = generate_svg_chart(&example_report(), &ChartConfig::default()).unwrap();

        for label in [
            "2022-Q4", "2023-Q1", "2023-Q2", "2023-Q3", "2023-Q4", "2024-Q1", "2024-Q2",
        ] {
            assert!(svg.contains(label), "missing {}", label);
        }
    }

    #[test]
    fn test_segments_use_palette_colors() {
        let svg = generate_svg_chart(&example_report(), &ChartConfig::default())
            .unwrap()
            .to_lowercase();

        assert!(svg.contains("#a6cee3"));
        assert!(svg.contains("#1f78b4"));
        assert!(!svg.contains("#b2df8a"));
    }

    #[test]
    fn test_stack_segments_follow_category_order() {
        let report = report_from(&[
            RecordRow::new("2024-01-10", "A", 3.0, 0.0),
            RecordRow::new("2024-02-10", "B", 5.0, 0.0),
            RecordRow::new("2024-04-10", "B", 2.0, 0.0),
        ]);
        let layout = stack_segments(&report);

        assert_eq!(
            layout.segments,
            vec![
                Segment { period: 0, category: 0, bottom: 0.0, top: 3.0 },
                Segment { period: 0, category: 1, bottom: 3.0, top: 8.0 },
                Segment { period: 1, category: 1, bottom: 0.0, top: 2.0 },
            ]
        );
        assert_eq!(layout.extents[0], BarExtent { low: 0.0, high: 8.0 });
    }

    #[test]
    fn test_negative_cell_stacks_below_baseline() {
        let report = report_from(&[
            RecordRow::new("2024-01-10", "A", 10.0, 0.0),
            RecordRow::new("2024-01-11", "B", -4.0, 0.0),
            RecordRow::new("2024-01-12", "C", 5.0, 0.0),
            RecordRow::new("2024-02-01", "B", -1.0, 0.0),
        ]);
        let layout = stack_segments(&report);

        assert_eq!(
            layout.segments,
            vec![
                Segment { period: 0, category: 0, bottom: 0.0, top: 10.0 },
                Segment { period: 0, category: 1, bottom: -5.0, top: 0.0 },
                Segment { period: 0, category: 2, bottom: 10.0, top: 15.0 },
            ]
        );
        assert_eq!(layout.extents[0], BarExtent { low: -5.0, high: 15.0 });

        let range = value_range(&layout.extents);
        assert!(range.start < -5.0);
        assert!(range.end > 15.0);

        // Net total 10 is annotated at the top of the positive stack
        assert_eq!(bar_annotations(&report, &layout), vec![(0, 15.0, "10".to_string())]);

        let svg = generate_svg_chart(&report, &ChartConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn test_value_range() {
        let flat = [BarExtent { low: 0.0, high: 0.0 }];
        assert_eq!(value_range(&flat), 0.0..1.0);
        assert_eq!(value_range(&[]), 0.0..1.0);

        let positive = [BarExtent { low: 0.0, high: 50.0 }, BarExtent { low: 0.0, high: 100.0 }];
        let range = value_range(&positive);
        assert_eq!(range.start, 0.0);
        assert!((range.end - 110.0).abs() < 1e-9);

        let negative = [BarExtent { low: -20.0, high: 0.0 }];
        let range = value_range(&negative);
        assert!((range.start + 22.0).abs() < 1e-9);
        assert!(range.end > 0.0);
    }

    #[test]
    fn test_annotations_only_for_positive_bars() {
        let report = example_report();
        let layout = stack_segments(&report);
        let annotations = bar_annotations(&report, &layout);

        assert_eq!(
            annotations,
            vec![
                (0, 66.0, "66".to_string()),
                (5, 23.0, "23".to_string()),
                (6, 58.0, "58".to_string()),
            ]
        );
    }

    #[test]
    fn test_palette_cycles() {
        let style = ChartConfig {
            palette: vec!["#111111".to_string(), "#222222".to_string()],
            ..ChartConfig::default()
        };
        assert_eq!(category_color(&style, 0), RGBColor(0x11, 0x11, 0x11));
        assert_eq!(category_color(&style, 3), RGBColor(0x22, 0x22, 0x22));

        let empty = ChartConfig {
            palette: Vec::new(),
            ..ChartConfig::default()
        };
        assert_eq!(category_color(&empty, 0), FALLBACK_COLOR);
    }
}
