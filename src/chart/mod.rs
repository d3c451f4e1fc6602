//! Chart specifications.
//!
//! A chart specification describes what to draw (series, data, axis
//! bindings, labels) without depending on any rendering library. The
//! [`assembler`] builds them from the summary tables and
//! [`crate::report`] turns them into a page.

pub mod assembler;

pub use assembler::assemble_dashboard;

use crate::models::DashboardData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the series of a chart are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Bars on the primary axis with a line on a secondary axis.
    DualAxis,
    /// Bars stacked on top of each other, one segment per series.
    StackedBar,
}

/// Visual mark of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    /// Line with markers.
    Line,
}

/// Which value axis a series is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisBinding {
    Primary,
    Secondary,
}

/// One data series over the chart's categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub kind: SeriesKind,
    /// One value per category; `None` is drawn as a gap.
    pub values: Vec<Option<f64>>,
    pub axis: AxisBinding,
    /// Fixed color, or `None` to let the renderer pick one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Text shown next to each value; empty for no annotations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub show_in_legend: bool,
}

/// A value axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
}

/// A single chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    /// Category labels along the x axis.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub primary_axis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_axis: Option<Axis>,
}

impl ChartSpec {
    /// True when there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// A chart placed in a grid cell (0-indexed, row 0 at the top).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub row: usize,
    pub col: usize,
    pub chart: ChartSpec,
}

/// Fixed grid of panels making up the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub title: String,
    pub rows: usize,
    pub cols: usize,
    /// Total height in pixels.
    pub height: u32,
    /// Gap between columns as a fraction of the width.
    pub horizontal_spacing: f64,
    /// Gap between rows as a fraction of the height.
    pub vertical_spacing: f64,
    pub legend_title: String,
    pub panels: Vec<Panel>,
}

impl GridLayout {
    #[cfg(test)]
    pub fn panel(&self, row: usize, col: usize) -> Option<&Panel> {
        self.panels.iter().find(|p| p.row == row && p.col == col)
    }
}

/// Everything needed to render the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    /// Number of deals the dashboard was built from.
    pub deal_count: usize,
    pub data: DashboardData,
    pub layout: GridLayout,
}
