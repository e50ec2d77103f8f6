//! The filter → aggregate → project pipeline behind every dashboard view.
//!
//! [`run_pipeline`] is a pure function of the [`DataContext`] and the
//! [`PipelineInputs`]: identical inputs always produce an identical
//! [`DashboardOutput`], and empty selections produce empty results rather
//! than errors.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use econ_core::models::{CustomerRow, SegmentRow};
use econ_core::selection::{DisplayOptions, FilterSelection, PipelineInputs, SortColumn, SortOrder};

use crate::aggregator::{
    numeric_cmp, ChurnBreakdown, KpiAggregator, Kpis, PlanScatter, SegmentAggregator,
    SegmentRollups,
};
use crate::histogram::Histogram;
use crate::reader::{CustomerTable, DataContext, SegmentTable};

pub const LTV_CAC_BINS: usize = 50;
pub const PAYBACK_BINS: usize = 50;
pub const HEALTH_SCORE_BINS: usize = 20;

// ── Views ─────────────────────────────────────────────────────────────────────

/// Row indices of a [`CustomerTable`] that passed the filters, in table order.
#[derive(Debug, Clone)]
pub struct CustomerView<'a> {
    table: &'a CustomerTable,
    indices: Vec<usize>,
}

impl<'a> CustomerView<'a> {
    pub fn table(&self) -> &'a CustomerTable {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CustomerRow> + '_ {
        let rows = self.table.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn rows(&self) -> Vec<&'a CustomerRow> {
        self.iter().collect()
    }
}

/// Row indices of a [`SegmentTable`] that passed the filters, in table order.
#[derive(Debug, Clone)]
pub struct SegmentView<'a> {
    table: &'a SegmentTable,
    indices: Vec<usize>,
}

impl<'a> SegmentView<'a> {
    pub fn table(&self) -> &'a SegmentTable {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn rows(&self) -> Vec<&'a SegmentRow> {
        let rows = self.table.rows();
        self.indices.iter().map(|&i| &rows[i]).collect()
    }
}

pub fn filter_customers<'a>(table: &'a CustomerTable, filters: &FilterSelection) -> CustomerView<'a> {
    let indices = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.matches(&r.segment))
        .map(|(i, _)| i)
        .collect();
    CustomerView { table, indices }
}

pub fn filter_segments<'a>(table: &'a SegmentTable, filters: &FilterSelection) -> SegmentView<'a> {
    let indices = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.matches(&r.segment))
        .map(|(i, _)| i)
        .collect();
    SegmentView { table, indices }
}

// ── Row list ──────────────────────────────────────────────────────────────────

/// One line of the customer list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerListRow {
    pub customer_id: String,
    pub industry: String,
    pub company_size: String,
    pub plan_name: String,
    #[serde(rename = "LTV")]
    pub ltv: f64,
    #[serde(rename = "CAC")]
    pub cac: f64,
    #[serde(rename = "LTV_CAC_Ratio")]
    pub ltv_cac_ratio: f64,
    #[serde(rename = "CAC_Payback_Months")]
    pub cac_payback_months: f64,
    #[serde(rename = "Monthly_Revenue")]
    pub monthly_revenue: f64,
    #[serde(rename = "Customer_Health_Score")]
    pub customer_health_score: f64,
    #[serde(rename = "Churned")]
    pub churned: bool,
    /// `YYYY-MM-DD`.
    pub latest_end: Option<String>,
    #[serde(rename = "Avg_Sentiment_Score")]
    pub avg_sentiment_score: f64,
    #[serde(rename = "Active_Days")]
    pub active_days: f64,
    #[serde(rename = "Usage_Events")]
    pub usage_events: f64,
    #[serde(rename = "Usage_Score")]
    pub usage_score: f64,
}

impl From<&CustomerRow> for CustomerListRow {
    fn from(row: &CustomerRow) -> Self {
        Self {
            customer_id: row.customer_id.clone(),
            industry: row.segment.industry.clone(),
            company_size: row.segment.company_size.clone(),
            plan_name: row.segment.plan_name.clone(),
            ltv: row.ltv,
            cac: row.cac,
            ltv_cac_ratio: row.ltv_cac_ratio,
            cac_payback_months: row.cac_payback_months,
            monthly_revenue: row.monthly_revenue,
            customer_health_score: row.customer_health_score,
            churned: row.churned,
            latest_end: row.latest_end.map(|d| d.format("%Y-%m-%d").to_string()),
            avg_sentiment_score: row.avg_sentiment_score,
            active_days: row.active_days,
            usage_events: row.usage_events,
            usage_score: row.usage_score,
        }
    }
}

/// Indices of the row list: the view, optionally restricted to churned
/// customers, stably sorted by the display options.
pub fn row_list_indices(view: &CustomerView<'_>, display: &DisplayOptions) -> Vec<usize> {
    let rows = view.table().rows();
    let mut indices: Vec<usize> = view
        .indices()
        .iter()
        .copied()
        .filter(|&i| !display.show_churned_only || rows[i].churned)
        .collect();

    if let Some(column) = display.sort_column {
        let numeric_ids = view.table().numeric_ids();
        indices.sort_by(|&a, &b| {
            compare_rows(&rows[a], &rows[b], column, display.sort_order, numeric_ids)
        });
    }
    indices
}

/// Order two rows by `column` in `order`.
///
/// Missing dates sort after present ones in both directions. Ids compare as
/// integers when `numeric_ids` is set, otherwise as strings.
pub fn compare_rows(
    a: &CustomerRow,
    b: &CustomerRow,
    column: SortColumn,
    order: SortOrder,
    numeric_ids: bool,
) -> Ordering {
    let directed = |ord: Ordering| match order {
        SortOrder::Ascending => ord,
        SortOrder::Descending => ord.reverse(),
    };
    let num = |x: f64, y: f64| directed(numeric_cmp(x, y));
    match column {
        SortColumn::CustomerId if numeric_ids => {
            let id = |r: &CustomerRow| r.customer_id.parse::<i64>().ok();
            directed(id(a).cmp(&id(b)))
        }
        SortColumn::CustomerId => directed(a.customer_id.cmp(&b.customer_id)),
        SortColumn::LtvCacRatio => num(a.ltv_cac_ratio, b.ltv_cac_ratio),
        SortColumn::CacPaybackMonths => num(a.cac_payback_months, b.cac_payback_months),
        SortColumn::CustomerHealthScore => num(a.customer_health_score, b.customer_health_score),
        SortColumn::MonthlyRevenue => num(a.monthly_revenue, b.monthly_revenue),
        SortColumn::LatestEnd => match (a.latest_end, b.latest_end) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

// ── DashboardOutput ───────────────────────────────────────────────────────────

/// Histograms of the filtered customers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distributions {
    pub ltv_cac_ratio: Histogram,
    pub cac_payback_months: Histogram,
    pub customer_health_score: Histogram,
}

impl Distributions {
    /// `None` when `rows` is empty.
    pub fn compute(rows: &[&CustomerRow]) -> Option<Self> {
        let column = |f: fn(&CustomerRow) -> f64| rows.iter().map(|r| f(*r)).collect::<Vec<_>>();
        Some(Self {
            ltv_cac_ratio: Histogram::from_values(&column(|r| r.ltv_cac_ratio), LTV_CAC_BINS)?,
            cac_payback_months: Histogram::from_values(
                &column(|r| r.cac_payback_months),
                PAYBACK_BINS,
            )?,
            customer_health_score: Histogram::from_values(
                &column(|r| r.customer_health_score),
                HEALTH_SCORE_BINS,
            )?,
        })
    }
}

/// Everything a view needs to render one state of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOutput {
    pub total_customers: usize,
    pub total_segments: usize,
    pub filtered_customers: usize,
    pub filtered_segments: usize,
    pub kpis: Kpis,
    pub churn: ChurnBreakdown,
    /// `None` when no customers passed the filters.
    pub distributions: Option<Distributions>,
    /// `None` when no segments passed the filters.
    pub segment_rollups: Option<SegmentRollups>,
    pub ltv_vs_cac: Vec<PlanScatter>,
    pub rows: Vec<CustomerListRow>,
}

/// Compute the full dashboard state for `inputs`.
pub fn run_pipeline(context: &DataContext, inputs: &PipelineInputs) -> DashboardOutput {
    let customers = filter_customers(context.customers(), &inputs.filters);
    let segments = filter_segments(context.segments(), &inputs.filters);
    let customer_rows = customers.rows();
    let segment_rows = segments.rows();

    let table = context.customers().rows();
    let rows = row_list_indices(&customers, &inputs.display)
        .into_iter()
        .map(|i| CustomerListRow::from(&table[i]))
        .collect::<Vec<_>>();

    debug!(
        "Pipeline: {} of {} customers, {} of {} segments, {} listed",
        customers.len(),
        context.customers().len(),
        segments.len(),
        context.segments().len(),
        rows.len()
    );

    DashboardOutput {
        total_customers: context.customers().len(),
        total_segments: context.segments().len(),
        filtered_customers: customers.len(),
        filtered_segments: segments.len(),
        kpis: KpiAggregator::compute(&customer_rows),
        churn: KpiAggregator::churn_breakdown(&customer_rows),
        distributions: Distributions::compute(&customer_rows),
        segment_rollups: SegmentAggregator::rollups(&segment_rows, |d| {
            context.segment_key_order(d)
        }),
        ltv_vs_cac: KpiAggregator::scatter_by_plan(&customer_rows),
        rows,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use econ_core::models::Dimension;
    use econ_core::selection::DimensionFilter;

    use crate::aggregator::KpiValue;
    use crate::reader::tests::{sample_context, SEGMENTS_CSV};

    const HEADER: &str = "customer_id,industry,company_size,plan_name,billing_frequency,LTV,CAC,LTV_CAC_Ratio,CAC_Payback_Months,Monthly_Revenue,Customer_Health_Score,Churned,latest_end";

    /// Context from `(id, industry, ratio, churned, latest_end)` tuples.
    fn context_from(rows: &[(&str, &str, f64, bool, &str)]) -> DataContext {
        let mut csv = format!("{HEADER}\n");
        for (id, industry, ratio, churned, end) in rows {
            csv.push_str(&format!(
                "{id},{industry},SMB,Pro,monthly,1000,500,{ratio},12,100,50,{},{end}\n",
                u8::from(*churned)
            ));
        }
        let customers = CustomerTable::from_reader(csv.as_bytes(), Path::new("c.csv")).unwrap();
        let segments =
            SegmentTable::from_reader(SEGMENTS_CSV.as_bytes(), Path::new("s.csv")).unwrap();
        DataContext::new(customers, segments)
    }

    fn ids(output: &DashboardOutput) -> Vec<&str> {
        output.rows.iter().map(|r| r.customer_id.as_str()).collect()
    }

    fn sorted_by(column: SortColumn, order: SortOrder) -> PipelineInputs {
        PipelineInputs {
            display: DisplayOptions {
                sort_column: Some(column),
                sort_order: order,
                ..DisplayOptions::default()
            },
            ..PipelineInputs::default()
        }
    }

    // ── Filtering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_filtered_rows_satisfy_every_constraint() {
        let ctx = sample_context();
        let selections = [
            FilterSelection::default().with(Dimension::Industry, DimensionFilter::only(["Fintech"])),
            FilterSelection::default()
                .with(Dimension::Industry, DimensionFilter::only(["Fintech", "Retail"]))
                .with(Dimension::CompanySize, DimensionFilter::only(["SMB"])),
            FilterSelection::default()
                .with(Dimension::PlanName, DimensionFilter::only(["Basic"]))
                .with(Dimension::BillingFrequency, DimensionFilter::only(["monthly"])),
        ];

        for filters in &selections {
            let view = filter_customers(ctx.customers(), filters);
            let expected = ctx
                .customers()
                .rows()
                .iter()
                .filter(|r| filters.matches(&r.segment))
                .count();
            assert_eq!(view.len(), expected);
            assert!(view.len() <= ctx.customers().len());
            for row in view.iter() {
                for d in Dimension::ALL {
                    assert!(filters.get(d).allows(row.segment.get(d)));
                }
            }
            let segs = filter_segments(ctx.segments(), filters);
            for row in segs.rows() {
                assert!(filters.matches(&row.segment));
            }
        }
    }

    #[test]
    fn test_conjunction_of_two_dimensions() {
        let ctx = sample_context();
        let filters = FilterSelection::default()
            .with(Dimension::Industry, DimensionFilter::only(["Fintech", "Retail"]))
            .with(Dimension::CompanySize, DimensionFilter::only(["SMB"]));
        let view = filter_customers(ctx.customers(), &filters);
        let ids: Vec<&str> = view.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn test_full_distinct_set_equals_no_filter() {
        let ctx = sample_context();
        let mut filters = FilterSelection::default();
        for d in Dimension::ALL {
            filters = filters.with(d, DimensionFilter::only(ctx.distinct_values(d).to_vec()));
        }
        let full = filter_customers(ctx.customers(), &filters);
        assert_eq!(full.indices(), &[0, 1, 2, 3, 4]);

        let explicit = run_pipeline(
            &ctx,
            &PipelineInputs {
                filters,
                ..PipelineInputs::default()
            },
        );
        let implicit = run_pipeline(&ctx, &PipelineInputs::default());
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_empty_selection_on_any_dimension_yields_nothing() {
        let ctx = sample_context();
        for d in Dimension::ALL {
            let filters = FilterSelection::default().with(d, DimensionFilter::none());
            let output = run_pipeline(
                &ctx,
                &PipelineInputs {
                    filters,
                    ..PipelineInputs::default()
                },
            );
            assert_eq!(output.filtered_customers, 0, "dimension {d:?}");
            assert_eq!(output.filtered_segments, 0);
            assert!(output.rows.is_empty());
            assert!(output.segment_rollups.is_none());
        }
    }

    #[test]
    fn test_omitted_filter_is_not_empty_filter() {
        let ctx = sample_context();
        let omitted = run_pipeline(&ctx, &PipelineInputs::default());
        assert_eq!(omitted.filtered_customers, 5);
    }

    // ── Determinism ───────────────────────────────────────────────────────────

    #[test]
    fn test_pipeline_is_deterministic() {
        let ctx = sample_context();
        let inputs = PipelineInputs {
            filters: FilterSelection::default()
                .with(Dimension::CompanySize, DimensionFilter::only(["SMB"])),
            display: DisplayOptions {
                show_churned_only: false,
                sort_column: Some(SortColumn::MonthlyRevenue),
                sort_order: SortOrder::Descending,
            },
        };
        assert_eq!(run_pipeline(&ctx, &inputs), run_pipeline(&ctx, &inputs));
    }

    // ── Aggregates ────────────────────────────────────────────────────────────

    #[test]
    fn test_histogram_counts_sum_to_filtered_size() {
        let ctx = sample_context();
        let filters = FilterSelection::default()
            .with(Dimension::Industry, DimensionFilter::only(["Fintech", "Health"]));
        let output = run_pipeline(
            &ctx,
            &PipelineInputs {
                filters,
                ..PipelineInputs::default()
            },
        );
        let dist = output.distributions.expect("histograms");
        assert_eq!(output.filtered_customers, 3);
        assert_eq!(dist.ltv_cac_ratio.total(), 3);
        assert_eq!(dist.cac_payback_months.total(), 3);
        assert_eq!(dist.customer_health_score.total(), 3);
        assert_eq!(dist.ltv_cac_ratio.bins(), LTV_CAC_BINS);
        assert_eq!(dist.customer_health_score.bins(), HEALTH_SCORE_BINS);
    }

    #[test]
    fn test_absent_industry_yields_unavailable_kpis() {
        let ctx = sample_context();
        let filters = FilterSelection::default()
            .with(Dimension::Industry, DimensionFilter::only(["Aerospace"]));
        let output = run_pipeline(
            &ctx,
            &PipelineInputs {
                filters,
                ..PipelineInputs::default()
            },
        );
        assert_eq!(output.kpis.avg_ltv_cac, KpiValue::Unavailable);
        assert_eq!(output.kpis.churn_rate_pct, KpiValue::Unavailable);
        assert!(output.distributions.is_none());
        assert!(output.rows.is_empty());
        assert!(output.ltv_vs_cac.is_empty());

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["kpis"]["avg_ltv_cac"], "unavailable");
        assert!(json["distributions"].is_null());
    }

    // ── Row list ──────────────────────────────────────────────────────────────

    #[test]
    fn test_sort_three_ratios_both_orders() {
        let ctx = context_from(&[
            ("1", "Fintech", 1.0, false, "2024-01-31"),
            ("2", "Fintech", 3.0, false, "2024-01-31"),
            ("3", "Fintech", 2.0, false, "2024-01-31"),
        ]);
        let ratios = |o: &DashboardOutput| o.rows.iter().map(|r| r.ltv_cac_ratio).collect::<Vec<_>>();

        let asc = run_pipeline(&ctx, &sorted_by(SortColumn::LtvCacRatio, SortOrder::Ascending));
        assert_eq!(ratios(&asc), vec![1.0, 2.0, 3.0]);
        let desc = run_pipeline(&ctx, &sorted_by(SortColumn::LtvCacRatio, SortOrder::Descending));
        assert_eq!(ratios(&desc), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_sort_is_stable_in_both_orders() {
        let ctx = sample_context();
        // Ratios by id: 1→3.0, 2→1.0, 3→2.0, 4→3.0, 5→2.0
        let asc = run_pipeline(&ctx, &sorted_by(SortColumn::LtvCacRatio, SortOrder::Ascending));
        assert_eq!(ids(&asc), vec!["2", "3", "5", "1", "4"]);
        let desc = run_pipeline(&ctx, &sorted_by(SortColumn::LtvCacRatio, SortOrder::Descending));
        assert_eq!(ids(&desc), vec!["1", "4", "3", "5", "2"]);
    }

    #[test]
    fn test_signed_zero_ratios_tie_in_both_orders() {
        let ctx = context_from(&[
            ("1", "Fintech", 0.0, false, ""),
            ("2", "Fintech", -0.0, false, ""),
            ("3", "Fintech", 0.0, false, ""),
        ]);
        let asc = run_pipeline(&ctx, &sorted_by(SortColumn::LtvCacRatio, SortOrder::Ascending));
        assert_eq!(ids(&asc), vec!["1", "2", "3"]);
        let desc = run_pipeline(&ctx, &sorted_by(SortColumn::LtvCacRatio, SortOrder::Descending));
        assert_eq!(ids(&desc), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_churned_only_keeps_two_of_five() {
        let ctx = sample_context();
        let inputs = PipelineInputs {
            display: DisplayOptions {
                show_churned_only: true,
                ..DisplayOptions::default()
            },
            ..PipelineInputs::default()
        };
        let output = run_pipeline(&ctx, &inputs);
        assert_eq!(output.rows.len(), 2);
        assert!(output.rows.iter().all(|r| r.churned));
        // KPIs still cover the whole filtered set.
        assert_eq!(output.kpis.customer_count, 5);
    }

    #[test]
    fn test_numeric_ids_sort_numerically() {
        let ctx = context_from(&[
            ("10", "Fintech", 1.0, false, ""),
            ("9", "Fintech", 1.0, false, ""),
            ("2", "Fintech", 1.0, false, ""),
        ]);
        let output = run_pipeline(&ctx, &PipelineInputs::default());
        assert_eq!(ids(&output), vec!["2", "9", "10"]);
    }

    #[test]
    fn test_mixed_ids_sort_lexicographically() {
        let ctx = context_from(&[
            ("10", "Fintech", 1.0, false, ""),
            ("C-9", "Fintech", 1.0, false, ""),
            ("2", "Fintech", 1.0, false, ""),
        ]);
        let output = run_pipeline(&ctx, &PipelineInputs::default());
        assert_eq!(ids(&output), vec!["10", "2", "C-9"]);
    }

    #[test]
    fn test_missing_dates_sort_last_in_both_orders() {
        let ctx = context_from(&[
            ("1", "Fintech", 1.0, false, ""),
            ("2", "Fintech", 1.0, false, "2024-02-29"),
            ("3", "Fintech", 1.0, false, "2023-12-31"),
        ]);
        let asc = run_pipeline(&ctx, &sorted_by(SortColumn::LatestEnd, SortOrder::Ascending));
        assert_eq!(ids(&asc), vec!["3", "2", "1"]);
        let desc = run_pipeline(&ctx, &sorted_by(SortColumn::LatestEnd, SortOrder::Descending));
        assert_eq!(ids(&desc), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_no_sort_column_keeps_table_order() {
        let ctx = sample_context();
        let inputs = PipelineInputs {
            display: DisplayOptions {
                sort_column: None,
                sort_order: SortOrder::Descending,
                ..DisplayOptions::default()
            },
            ..PipelineInputs::default()
        };
        let output = run_pipeline(&ctx, &inputs);
        assert_eq!(ids(&output), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_list_row_projection() {
        let ctx = sample_context();
        let output = run_pipeline(&ctx, &PipelineInputs::default());
        let row = &output.rows[1];
        assert_eq!(row.latest_end.as_deref(), Some("2024-01-31"));
        assert_eq!(row.customer_health_score, 62.5);

        let json = serde_json::to_value(row).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 16);
        for key in ["LTV", "CAC_Payback_Months", "Churned", "latest_end", "Usage_Score"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(!obj.contains_key("billing_frequency"));
    }
}
