//! One-shot report rendering for the non-interactive view.
//!
//! Produces either a plain-text summary or a JSON document of the pipeline
//! inputs and output, for printing to stdout.

use std::fmt::Write as _;

use serde_json::json;

use econ_core::error::Result;
use econ_core::formatting::{ellipsize, format_currency, format_number};
use econ_core::models::Dimension;
use econ_core::selection::{DimensionFilter, PipelineInputs};
use econ_data::aggregator::{GroupAggregate, KpiValue};
use econ_data::histogram::Histogram;
use econ_data::pipeline::DashboardOutput;

const RULE_WIDTH: usize = 60;
const LABEL_WIDTH: usize = 24;

/// Output format of the report view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    /// `json` selects JSON; anything else is text.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        }
    }
}

/// Render the report in `format`.
pub fn render(
    format: ReportFormat,
    source: &str,
    inputs: &PipelineInputs,
    output: &DashboardOutput,
    row_limit: Option<usize>,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(source, inputs, output, row_limit)),
        ReportFormat::Json => render_json(inputs, output),
    }
}

/// `{"inputs": ..., "output": ...}`, pretty-printed.
///
/// Unavailable KPIs serialize as the string `"unavailable"`.
pub fn render_json(inputs: &PipelineInputs, output: &DashboardOutput) -> Result<String> {
    let doc = json!({
        "inputs": inputs,
        "output": output,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn filter_text(filter: &DimensionFilter) -> String {
    match filter {
        DimensionFilter::All => "all".to_string(),
        DimensionFilter::Only(set) if set.is_empty() => "(none)".to_string(),
        DimensionFilter::Only(set) => set.iter().cloned().collect::<Vec<_>>().join(","),
    }
}

fn kpi_line(out: &mut String, label: &str, value: KpiValue, fmt: fn(f64) -> String) {
    let text = value.value().map_or_else(|| "N/A".to_string(), fmt);
    let _ = writeln!(out, "  {label:<LABEL_WIDTH$}{text}");
}

fn histogram_line(out: &mut String, label: &str, h: &Histogram) {
    let peak = h
        .counts
        .iter()
        .enumerate()
        .max_by_key(|(i, c)| (**c, std::cmp::Reverse(*i)))
        .map(|(i, _)| h.bin_range(i));
    let peak = peak.map_or_else(String::new, |(lo, hi)| {
        format!(", peak [{}, {})", format_number(lo, 2), format_number(hi, 2))
    });
    let _ = writeln!(
        out,
        "  {label:<LABEL_WIDTH$}{} to {} in {} bins, {} values{peak}",
        format_number(h.lower, 2),
        format_number(h.upper, 2),
        h.bins(),
        h.total(),
    );
}

fn rollup_block(out: &mut String, title: &str, groups: &[GroupAggregate], decimals: usize) {
    let _ = writeln!(out, "  {title}");
    for g in groups {
        let _ = writeln!(
            out,
            "    {:<LABEL_WIDTH$}{:.prec$}",
            ellipsize(&g.key, LABEL_WIDTH - 2),
            g.value,
            prec = decimals
        );
    }
}

/// Plain-text report.
///
/// `row_limit` caps the number of customer rows printed; `None` prints all.
pub fn render_text(
    source: &str,
    inputs: &PipelineInputs,
    output: &DashboardOutput,
    row_limit: Option<usize>,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "UNIT ECONOMICS REPORT");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "[ {} | {} of {} customers | {} of {} segments ]",
        source,
        output.filtered_customers,
        output.total_customers,
        output.filtered_segments,
        output.total_segments
    );
    for dimension in Dimension::ALL {
        let _ = writeln!(
            out,
            "  {:<LABEL_WIDTH$}{}",
            dimension.label(),
            filter_text(inputs.filters.get(dimension))
        );
    }
    let display = &inputs.display;
    let sort = display.sort_column.map_or_else(
        || "none".to_string(),
        |c| format!("{} {}", c, display.sort_order.as_str()),
    );
    let _ = writeln!(out, "  {:<LABEL_WIDTH$}{sort}", "Sort");
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$}{}",
        "Churned only",
        if display.show_churned_only { "yes" } else { "no" }
    );

    // KPIs
    let k = &output.kpis;
    let _ = writeln!(out, "\nKEY METRICS");
    kpi_line(&mut out, "Avg LTV/CAC ratio", k.avg_ltv_cac, |v| format!("{v:.2}"));
    kpi_line(&mut out, "Avg CAC payback (mo)", k.avg_cac_payback_months, |v| {
        format!("{v:.2}")
    });
    kpi_line(&mut out, "Churn rate", k.churn_rate_pct, |v| format!("{v:.2}%"));
    kpi_line(&mut out, "Avg health score", k.avg_health_score, |v| format!("{v:.2}"));
    kpi_line(&mut out, "Avg LTV", k.avg_ltv, format_currency);
    kpi_line(&mut out, "Avg CAC", k.avg_cac, format_currency);
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$}{} ({} active / {} churned)",
        "Customers", k.customer_count, output.churn.active, output.churn.churned
    );

    // Distributions
    let _ = writeln!(out, "\nDISTRIBUTIONS");
    match &output.distributions {
        Some(d) => {
            histogram_line(&mut out, "LTV/CAC ratio", &d.ltv_cac_ratio);
            histogram_line(&mut out, "CAC payback (mo)", &d.cac_payback_months);
            histogram_line(&mut out, "Health score", &d.customer_health_score);
        }
        None => {
            let _ = writeln!(out, "  No customers match the current filters");
        }
    }

    // Scatter
    let _ = writeln!(out, "\nLTV VS CAC BY PLAN");
    if output.ltv_vs_cac.is_empty() {
        let _ = writeln!(out, "  No data");
    }
    for series in &output.ltv_vs_cac {
        let n = series.points.len();
        let mean = |f: fn(&(f64, f64)) -> f64| series.points.iter().map(f).sum::<f64>() / n as f64;
        let _ = writeln!(
            out,
            "  {:<LABEL_WIDTH$}{} customers, avg CAC {}, avg LTV {}",
            series.plan_name,
            n,
            format_currency(mean(|p| p.0)),
            format_currency(mean(|p| p.1)),
        );
    }

    // Rollups
    let _ = writeln!(out, "\nSEGMENT ROLLUPS");
    match &output.segment_rollups {
        Some(r) => {
            rollup_block(&mut out, "LTV/CAC by industry", &r.ltv_cac_by_industry, 2);
            rollup_block(&mut out, "Payback months by industry", &r.payback_by_industry, 1);
            rollup_block(&mut out, "Customers by company size", &r.customers_by_company_size, 0);
            rollup_block(&mut out, "LTV/CAC by plan", &r.ltv_cac_by_plan, 2);
        }
        None => {
            let _ = writeln!(out, "  No segments match the current filters");
        }
    }

    // Customer list
    let shown = row_limit.map_or(output.rows.len(), |n| n.min(output.rows.len()));
    let _ = writeln!(
        out,
        "\nCUSTOMERS (showing {} of {})",
        shown,
        output.rows.len()
    );
    if output.rows.is_empty() {
        let _ = writeln!(out, "  No customers to list");
        return out;
    }
    let _ = writeln!(
        out,
        "  {:<10} {:<14} {:<10} {:<10} {:>8} {:>8} {:>12} {:>7} {:<7} {:<10}",
        "ID", "Industry", "Size", "Plan", "LTV/CAC", "Payback", "MRR", "Health", "Churned", "Latest End"
    );
    for row in output.rows.iter().take(shown) {
        let _ = writeln!(
            out,
            "  {:<10} {:<14} {:<10} {:<10} {:>8.2} {:>8.1} {:>12} {:>7.1} {:<7} {:<10}",
            ellipsize(&row.customer_id, 10),
            ellipsize(&row.industry, 14),
            ellipsize(&row.company_size, 10),
            ellipsize(&row.plan_name, 10),
            row.ltv_cac_ratio,
            row.cac_payback_months,
            format_currency(row.monthly_revenue),
            row.customer_health_score,
            if row.churned { "yes" } else { "no" },
            row.latest_end.as_deref().unwrap_or("-"),
        );
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
