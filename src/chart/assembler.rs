//! Chart assembly.
//!
//! Maps each summary table onto a chart specification and places the
//! charts in a 2x2 grid:
//!
//! | owners (counts + amounts)   | ads (counts + amounts)        |
//! |-----------------------------|-------------------------------|
//! | products, stacked by amount | products, stacked by count    |

use super::{Axis, AxisBinding, ChartKind, ChartSpec, Dashboard, GridLayout, Panel, Series, SeriesKind};
use crate::analysis::sort_by_conversion;
use crate::config::DashboardConfig;
use crate::models::{DashboardData, GroupSummary, Matrix};
use chrono::Utc;
use tracing::debug;

const GRID_ROWS: usize = 2;
const GRID_COLS: usize = 2;
const HORIZONTAL_SPACING: f64 = 0.1;
const VERTICAL_SPACING: f64 = 0.15;

/// Build the full dashboard from the summary tables.
pub fn assemble_dashboard(
    data: &DashboardData,
    deal_count: usize,
    config: &DashboardConfig,
) -> Dashboard {
    let mut owners = data.owners.clone();
    let mut ads = data.ads.clone();
    if config.sort_by_conversion {
        sort_by_conversion(&mut owners);
        sort_by_conversion(&mut ads);
    }

    let panels = vec![
        Panel {
            row: 0,
            col: 0,
            chart: summary_chart(&owners, &config.owner_title, config, true),
        },
        Panel {
            row: 0,
            col: 1,
            chart: summary_chart(&ads, &config.ad_title, config, false),
        },
        Panel {
            row: 1,
            col: 0,
            chart: breakdown_chart(
                &data.products.sum,
                &config.product_sum_title,
                &config.sum_axis_title,
                true,
            ),
        },
        Panel {
            row: 1,
            col: 1,
            chart: breakdown_chart(
                &data.products.count.map(|n| n as f64),
                &config.product_count_title,
                &config.count_axis_title,
                false,
            ),
        },
    ];

    for panel in panels.iter().filter(|p| p.chart.is_empty()) {
        debug!("Panel '{}' has no data", panel.chart.title);
    }

    Dashboard {
        generated_at: Utc::now(),
        deal_count,
        data: data.clone(),
        layout: GridLayout {
            title: config.title.clone(),
            rows: GRID_ROWS,
            cols: GRID_COLS,
            height: config.height,
            horizontal_spacing: HORIZONTAL_SPACING,
            vertical_spacing: VERTICAL_SPACING,
            legend_title: config.legend_title.clone(),
            panels,
        },
    }
}

/// Deal counts as bars annotated with conversion rates, amounts as a line.
pub fn summary_chart(
    summaries: &[GroupSummary],
    title: &str,
    config: &DashboardConfig,
    show_in_legend: bool,
) -> ChartSpec {
    ChartSpec {
        title: title.to_string(),
        kind: ChartKind::DualAxis,
        categories: summaries.iter().map(|s| s.key.clone()).collect(),
        series: vec![
            Series {
                name: config.clients_label.clone(),
                kind: SeriesKind::Bar,
                values: summaries.iter().map(|s| Some(s.total as f64)).collect(),
                axis: AxisBinding::Primary,
                color: Some(config.bar_color.clone()),
                labels: summaries
                    .iter()
                    .map(|s| format_rate(s.conversion_rate))
                    .collect(),
                show_in_legend,
            },
            Series {
                name: config.amount_label.clone(),
                kind: SeriesKind::Line,
                values: summaries.iter().map(|s| Some(s.deal_amount_sum)).collect(),
                axis: AxisBinding::Secondary,
                color: Some(config.line_color.clone()),
                labels: Vec::new(),
                show_in_legend,
            },
        ],
        primary_axis: Axis {
            title: config.clients_axis_title.clone(),
        },
        secondary_axis: Some(Axis {
            title: config.amount_axis_title.clone(),
        }),
    }
}

/// One stacked segment per matrix column, one bar per matrix row.
pub fn breakdown_chart(
    matrix: &Matrix<f64>,
    title: &str,
    axis_title: &str,
    show_in_legend: bool,
) -> ChartSpec {
    let series = matrix
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| Series {
            name: column.clone(),
            kind: SeriesKind::Bar,
            values: matrix.column(i),
            axis: AxisBinding::Primary,
            color: None,
            labels: Vec::new(),
            show_in_legend,
        })
        .collect();

    ChartSpec {
        title: title.to_string(),
        kind: ChartKind::StackedBar,
        categories: matrix.rows.clone(),
        series,
        primary_axis: Axis {
            title: axis_title.to_string(),
        },
        secondary_axis: None,
    }
}

/// Format a conversion rate as a bar label, e.g. `50.0%` or `66.67%`.
pub fn format_rate(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{:.1}%", rate)
    } else {
        format!("{}%", rate)
    }
}
