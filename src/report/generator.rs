//! Dashboard page generation.
//!
//! This module renders an assembled [`Dashboard`] as a standalone HTML
//! page, translating the chart specifications into a Plotly.js figure
//! that the browser draws, or as a JSON document.

use crate::chart::{AxisBinding, ChartKind, Dashboard, GridLayout, Panel, Series, SeriesKind};
use anyhow::Result;
use serde_json::{json, Map, Value};

/// Plotly.js bundle loaded by the page.
pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Generate the complete dashboard page.
pub fn render_html(dashboard: &Dashboard) -> Result<String> {
    let figure = script_safe_json(&plotly_figure(&dashboard.layout))?;
    let title = escape_html(&dashboard.layout.title);

    let mut page = String::new();

    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    page.push_str(&format!("<title>{}</title>\n", title));
    page.push_str(&format!(
        "<script src=\"{}\" charset=\"utf-8\"></script>\n",
        PLOTLY_CDN_URL
    ));
    page.push_str(
        "<style>\n\
         body { margin: 0; font-family: sans-serif; background: #fff; }\n\
         #dashboard { width: 100%; min-height: 100vh; }\n\
         footer { padding: 8px 16px; color: #888; font-size: 12px; }\n\
         </style>\n",
    );
    page.push_str("</head>\n<body>\n");

    page.push_str("<div id=\"dashboard\"></div>\n");
    page.push_str(&generate_footer(dashboard));

    page.push_str("<script>\n");
    page.push_str(&format!("const figure = {};\n", figure));
    page.push_str(
        "Plotly.newPlot(\"dashboard\", figure.data, figure.layout, { responsive: true });\n",
    );
    page.push_str("</script>\n</body>\n</html>\n");

    Ok(page)
}

/// Generate a JSON document with the summary tables and chart specifications.
pub fn render_json(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

fn generate_footer(dashboard: &Dashboard) -> String {
    format!(
        "<footer>Built from {} deals on {}</footer>\n",
        dashboard.deal_count,
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Translate the grid into a Plotly figure (`{ data, layout }`).
pub fn plotly_figure(grid: &GridLayout) -> Value {
    let secondary_offset = grid.panels.len();
    let mut traces = Vec::new();
    let mut annotations = Vec::new();

    let mut layout = Map::new();
    layout.insert("title".into(), json!({ "text": grid.title, "x": 0.5 }));
    layout.insert("height".into(), json!(grid.height));
    layout.insert("barmode".into(), json!("stack"));
    layout.insert("legend".into(), json!({ "title": { "text": grid.legend_title } }));
    layout.insert("margin".into(), json!({ "t": 100, "b": 150 }));
    layout.insert("paper_bgcolor".into(), json!("white"));
    layout.insert("plot_bgcolor".into(), json!("white"));

    for (i, panel) in grid.panels.iter().enumerate() {
        let primary = i + 1;
        let secondary = secondary_offset + primary;
        let (x_domain, y_domain) = panel_domain(grid, panel);

        layout.insert(
            axis_key("x", primary),
            json!({
                "domain": x_domain,
                "anchor": axis_ref("y", primary),
                "automargin": true,
            }),
        );
        layout.insert(
            axis_key("y", primary),
            json!({
                "domain": y_domain,
                "anchor": axis_ref("x", primary),
                "title": { "text": panel.chart.primary_axis.title },
                "gridcolor": "#eee",
            }),
        );
        if let Some(ref axis) = panel.chart.secondary_axis {
            layout.insert(
                axis_key("y", secondary),
                json!({
                    "overlaying": axis_ref("y", primary),
                    "anchor": axis_ref("x", primary),
                    "side": "right",
                    "title": { "text": axis.title },
                    "showgrid": false,
                }),
            );
        }

        annotations.push(json!({
            "text": panel.chart.title,
            "x": (x_domain[0] + x_domain[1]) / 2.0,
            "y": y_domain[1],
            "xref": "paper",
            "yref": "paper",
            "xanchor": "center",
            "yanchor": "bottom",
            "showarrow": false,
            "font": { "size": 16 },
        }));

        if panel.chart.is_empty() {
            annotations.push(json!({
                "text": "No data",
                "x": (x_domain[0] + x_domain[1]) / 2.0,
                "y": (y_domain[0] + y_domain[1]) / 2.0,
                "xref": "paper",
                "yref": "paper",
                "showarrow": false,
                "font": { "color": "#888" },
            }));
        }

        for series in &panel.chart.series {
            let y_axis = match series.axis {
                AxisBinding::Primary => primary,
                AxisBinding::Secondary => secondary,
            };
            traces.push(series_trace(
                series,
                &panel.chart.categories,
                panel.chart.kind,
                axis_ref("x", primary),
                axis_ref("y", y_axis),
            ));
        }
    }

    layout.insert("annotations".into(), Value::Array(annotations));

    json!({ "data": traces, "layout": Value::Object(layout) })
}

fn series_trace(
    series: &Series,
    categories: &[String],
    kind: ChartKind,
    x_axis: String,
    y_axis: String,
) -> Value {
    let mut trace = Map::new();
    trace.insert("name".into(), json!(series.name));
    trace.insert("x".into(), json!(categories));
    trace.insert("y".into(), json!(series.values));
    trace.insert("xaxis".into(), json!(x_axis));
    trace.insert("yaxis".into(), json!(y_axis));
    trace.insert("showlegend".into(), json!(series.show_in_legend));

    match series.kind {
        SeriesKind::Bar => {
            trace.insert("type".into(), json!("bar"));
            if let Some(ref color) = series.color {
                trace.insert("marker".into(), json!({ "color": color }));
            }
        }
        SeriesKind::Line => {
            trace.insert("type".into(), json!("scatter"));
            trace.insert("mode".into(), json!("lines+markers"));
            let mut line = json!({ "width": 2 });
            if let Some(ref color) = series.color {
                line["color"] = json!(color);
            }
            trace.insert("line".into(), line);
        }
    }

    if !series.labels.is_empty() {
        trace.insert("text".into(), json!(series.labels));
        trace.insert("textposition".into(), json!("outside"));
    }

    // Same-named segments across the stacked panels toggle together.
    if kind == ChartKind::StackedBar {
        trace.insert("legendgroup".into(), json!(series.name));
    }

    Value::Object(trace)
}

/// Paper-coordinate domains `(x, y)` of a grid cell. Row 0 is the top row.
pub fn panel_domain(grid: &GridLayout, panel: &Panel) -> ([f64; 2], [f64; 2]) {
    let cols = grid.cols.max(1) as f64;
    let rows = grid.rows.max(1) as f64;

    let width = (1.0 - (cols - 1.0) * grid.horizontal_spacing) / cols;
    let height = (1.0 - (rows - 1.0) * grid.vertical_spacing) / rows;

    let x0 = panel.col as f64 * (width + grid.horizontal_spacing);
    let y1 = 1.0 - panel.row as f64 * (height + grid.vertical_spacing);

    ([x0, x0 + width], [y1 - height, y1])
}

/// Trace-side axis reference: `x`, `x2`, `y5`, ...
fn axis_ref(letter: &str, index: usize) -> String {
    format!("{}{}", letter, axis_suffix(index))
}

/// Layout-side axis key: `xaxis`, `xaxis2`, `yaxis5`, ...
fn axis_key(letter: &str, index: usize) -> String {
    format!("{}axis{}", letter, axis_suffix(index))
}

fn axis_suffix(index: usize) -> String {
    if index == 1 {
        String::new()
    } else {
        index.to_string()
    }
}

/// Serialize for embedding inside a `<script>` element.
fn script_safe_json(value: &Value) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/").replace("<!--", "<\\!--"))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prepare_data;
    use crate::chart::assemble_dashboard;
    use crate::config::DashboardConfig;
    use crate::loader::load_deals;
    use crate::models::DashboardData;
    use std::path::Path;

    fn create_test_dashboard() -> Dashboard {
        let deals =
            load_deals(&Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/deals.csv")).unwrap();
        assemble_dashboard(&prepare_data(&deals), deals.len(), &DashboardConfig::default())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "{} != {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_render_html() {
        let html = render_html(&create_test_dashboard()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Sales Analytics Dashboard</title>"));
        assert!(html.contains(PLOTLY_CDN_URL));
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("Manager performance"));
        assert!(html.contains("Built from 20 deals"));
    }

    #[test]
    fn test_render_html_escapes_title() {
        let mut dashboard = create_test_dashboard();
        dashboard.layout.title = "</script><b>Sales & Co</b>".to_string();

        let html = render_html(&dashboard).unwrap();
        assert!(html.contains("<title>&lt;/script&gt;&lt;b&gt;Sales &amp; Co&lt;/b&gt;</title>"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_plotly_figure_traces() {
        let dashboard = create_test_dashboard();
        let figure = plotly_figure(&dashboard.layout);

        let traces = figure["data"].as_array().unwrap();
        assert_eq!(traces.len(), 8);

        let owner_bar = &traces[0];
        assert_eq!(owner_bar["type"], "bar");
        assert_eq!(owner_bar["xaxis"], "x");
        assert_eq!(owner_bar["yaxis"], "y");
        assert_eq!(owner_bar["textposition"], "outside");
        assert_eq!(owner_bar["marker"]["color"], "#1f77b4");

        let owner_line = &traces[1];
        assert_eq!(owner_line["type"], "scatter");
        assert_eq!(owner_line["mode"], "lines+markers");
        assert_eq!(owner_line["yaxis"], "y5");

        let ad_line = &traces[3];
        assert_eq!(ad_line["xaxis"], "x2");
        assert_eq!(ad_line["yaxis"], "y6");
        assert_eq!(ad_line["showlegend"], false);

        let layout = &figure["layout"];
        assert_eq!(layout["barmode"], "stack");
        assert_eq!(layout["yaxis5"]["overlaying"], "y");
        assert_eq!(layout["yaxis6"]["overlaying"], "y2");
        assert_eq!(layout["yaxis6"]["side"], "right");
        assert!(layout.get("yaxis7").is_none());
    }

    #[test]
    fn test_missing_cells_are_null() {
        let figure = plotly_figure(&create_test_dashboard().layout);
        let sum_evening = &figure["data"][4];

        assert_eq!(sum_evening["name"], "Evening");
        assert_eq!(sum_evening["legendgroup"], "Evening");
        assert_eq!(sum_evening["y"], json!([1800.0, null, 4400.0]));
    }

    #[test]
    fn test_panel_domains() {
        let dashboard = create_test_dashboard();
        let grid = &dashboard.layout;

        let (x, y) = panel_domain(grid, grid.panel(0, 0).unwrap());
        assert_close(x[0], 0.0);
        assert_close(x[1], 0.45);
        assert_close(y[0], 0.575);
        assert_close(y[1], 1.0);

        let (x, y) = panel_domain(grid, grid.panel(1, 1).unwrap());
        assert_close(x[0], 0.55);
        assert_close(x[1], 1.0);
        assert_close(y[0], 0.0);
        assert_close(y[1], 0.425);
    }

    #[test]
    fn test_render_empty_dashboard() {
        let dashboard =
            assemble_dashboard(&DashboardData::default(), 0, &DashboardConfig::default());

        let html = render_html(&dashboard).unwrap();
        assert!(html.contains("No data"));

        let figure = plotly_figure(&dashboard.layout);
        // Two empty dual-axis panels keep their (empty) series.
        assert_eq!(figure["data"].as_array().unwrap().len(), 4);
        // Four panel titles plus four "No data" notes.
        assert_eq!(figure["layout"]["annotations"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&create_test_dashboard()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["deal_count"], 20);
        assert_eq!(value["data"]["owners"].as_array().unwrap().len(), 5);
        assert_eq!(value["layout"]["panels"].as_array().unwrap().len(), 4);
        assert_eq!(value["layout"]["panels"][0]["chart"]["kind"], "dual_axis");
    }
}
