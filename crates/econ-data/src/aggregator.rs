//! KPI and segment aggregation over filtered views.
//!
//! Everything here is a pure function of its input rows; empty inputs yield
//! [`KpiValue::Unavailable`] or empty collections rather than errors.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use econ_core::formatting::{percentage, round_to};
use econ_core::models::{CustomerRow, Dimension, SegmentRow};
use econ_core::selection::SortOrder;

/// Numeric ordering where `-0.0 == 0.0`. Loaded metrics are always finite.
pub fn numeric_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

// ── KpiValue ──────────────────────────────────────────────────────────────────

/// A KPI that may be undefined because its population is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KpiValue {
    Available(f64),
    Unavailable,
}

impl KpiValue {
    /// Mean of `values`, or `Unavailable` when there are none.
    pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (sum, n) = values
            .into_iter()
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 {
            KpiValue::Unavailable
        } else {
            KpiValue::Available(sum / n as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            KpiValue::Available(v) => Some(v),
            KpiValue::Unavailable => None,
        }
    }

    /// Value rounded to two decimals.
    pub fn rounded(self) -> Option<f64> {
        self.value().map(|v| round_to(v, 2))
    }

    pub fn is_available(self) -> bool {
        matches!(self, KpiValue::Available(_))
    }

    /// Two-decimal text followed by `suffix`, or `N/A`.
    pub fn display_with(self, suffix: &str) -> String {
        match self {
            KpiValue::Available(v) => format!("{v:.2}{suffix}"),
            KpiValue::Unavailable => "N/A".to_string(),
        }
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with(""))
    }
}

impl Serialize for KpiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.rounded() {
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_str("unavailable"),
        }
    }
}

// ── Kpis ──────────────────────────────────────────────────────────────────────

/// Headline metrics of the filtered customer set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub avg_ltv_cac: KpiValue,
    pub avg_cac_payback_months: KpiValue,
    pub churn_rate_pct: KpiValue,
    pub avg_health_score: KpiValue,
    pub avg_ltv: KpiValue,
    pub avg_cac: KpiValue,
    pub customer_count: usize,
}

/// Active vs churned split of the filtered customer set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnBreakdown {
    pub active: usize,
    pub churned: usize,
    pub churned_pct: KpiValue,
}

/// `(CAC, LTV)` points of one plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanScatter {
    pub plan_name: String,
    pub points: Vec<(f64, f64)>,
}

/// Stateless aggregation over customer rows.
pub struct KpiAggregator;

impl KpiAggregator {
    pub fn compute(rows: &[&CustomerRow]) -> Kpis {
        let flag = |r: &&CustomerRow| if r.churned { 100.0 } else { 0.0 };
        Kpis {
            avg_ltv_cac: KpiValue::mean(rows.iter().map(|r| r.ltv_cac_ratio)),
            avg_cac_payback_months: KpiValue::mean(rows.iter().map(|r| r.cac_payback_months)),
            churn_rate_pct: KpiValue::mean(rows.iter().map(flag)),
            avg_health_score: KpiValue::mean(rows.iter().map(|r| r.customer_health_score)),
            avg_ltv: KpiValue::mean(rows.iter().map(|r| r.ltv)),
            avg_cac: KpiValue::mean(rows.iter().map(|r| r.cac)),
            customer_count: rows.len(),
        }
    }

    pub fn churn_breakdown(rows: &[&CustomerRow]) -> ChurnBreakdown {
        let churned = rows.iter().filter(|r| r.churned).count();
        let churned_pct = match percentage(churned as f64, rows.len() as f64, 2) {
            Some(p) => KpiValue::Available(p),
            None => KpiValue::Unavailable,
        };
        ChurnBreakdown {
            active: rows.len() - churned,
            churned,
            churned_pct,
        }
    }

    /// Group `(CAC, LTV)` points by plan, plans in first-encountered order.
    pub fn scatter_by_plan(rows: &[&CustomerRow]) -> Vec<PlanScatter> {
        let mut groups: Vec<PlanScatter> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in rows {
            let plan = row.segment.plan_name.as_str();
            let slot = *index.entry(plan).or_insert_with(|| {
                groups.push(PlanScatter {
                    plan_name: plan.to_string(),
                    points: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].points.push((row.cac, row.ltv));
        }
        groups
    }
}

// ── Segment rollups ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Mean,
    Sum,
}

/// One group of a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAggregate {
    pub key: String,
    pub value: f64,
}

/// The four ranked segment charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRollups {
    pub ltv_cac_by_industry: Vec<GroupAggregate>,
    pub payback_by_industry: Vec<GroupAggregate>,
    pub customers_by_company_size: Vec<GroupAggregate>,
    pub ltv_cac_by_plan: Vec<GroupAggregate>,
}

/// Stateless aggregation over segment rows.
pub struct SegmentAggregator;

impl SegmentAggregator {
    /// Group `rows` by `dimension`, aggregate `value`, and rank by the result.
    ///
    /// Groups start in the order of `key_order` (values absent from it go
    /// last, in row order); the ranking sort is stable so equal aggregates
    /// keep that order.
    pub fn group_by<F>(
        rows: &[&SegmentRow],
        dimension: Dimension,
        key_order: &[String],
        value: F,
        aggregate: AggregateFn,
        order: SortOrder,
    ) -> Vec<GroupAggregate>
    where
        F: Fn(&SegmentRow) -> f64,
    {
        let mut acc: Vec<(&str, f64, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for row in rows {
            let key = row.segment.get(dimension);
            let slot = *index.entry(key).or_insert_with(|| {
                acc.push((key, 0.0, 0));
                acc.len() - 1
            });
            acc[slot].1 += value(*row);
            acc[slot].2 += 1;
        }

        let position = |key: &str| {
            key_order
                .iter()
                .position(|k| k == key)
                .unwrap_or(usize::MAX)
        };
        acc.sort_by_key(|(key, _, _)| position(*key));

        let mut groups: Vec<GroupAggregate> = acc
            .into_iter()
            .map(|(key, sum, n)| GroupAggregate {
                key: key.to_string(),
                value: match aggregate {
                    AggregateFn::Sum => sum,
                    AggregateFn::Mean => sum / n as f64,
                },
            })
            .collect();

        match order {
            SortOrder::Ascending => groups.sort_by(|a, b| numeric_cmp(a.value, b.value)),
            SortOrder::Descending => groups.sort_by(|a, b| numeric_cmp(b.value, a.value)),
        }
        groups
    }

    /// All four rollups, or `None` when there are no segment rows.
    ///
    /// `key_order` supplies the first-encountered value order of each
    /// dimension in the unfiltered segment table.
    pub fn rollups<'k, K>(rows: &[&SegmentRow], key_order: K) -> Option<SegmentRollups>
    where
        K: Fn(Dimension) -> &'k [String],
    {
        if rows.is_empty() {
            return None;
        }
        let industry = key_order(Dimension::Industry);
        Some(SegmentRollups {
            ltv_cac_by_industry: Self::group_by(
                rows,
                Dimension::Industry,
                industry,
                |r| r.avg_ltv_cac,
                AggregateFn::Mean,
                SortOrder::Descending,
            ),
            payback_by_industry: Self::group_by(
                rows,
                Dimension::Industry,
                industry,
                |r| r.avg_payback_months,
                AggregateFn::Mean,
                SortOrder::Ascending,
            ),
            customers_by_company_size: Self::group_by(
                rows,
                Dimension::CompanySize,
                key_order(Dimension::CompanySize),
                |r| r.customer_count as f64,
                AggregateFn::Sum,
                SortOrder::Descending,
            ),
            ltv_cac_by_plan: Self::group_by(
                rows,
                Dimension::PlanName,
                key_order(Dimension::PlanName),
                |r| r.avg_ltv_cac,
                AggregateFn::Mean,
                SortOrder::Descending,
            ),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::sample_context;

    fn keys(groups: &[GroupAggregate]) -> Vec<&str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    #[test]
    fn test_kpi_value_display_and_json() {
        assert_eq!(KpiValue::Available(2.0 / 3.0).to_string(), "0.67");
        assert_eq!(KpiValue::Unavailable.to_string(), "N/A");
        assert_eq!(KpiValue::Available(40.0).display_with("%"), "40.00%");
        assert_eq!(KpiValue::Unavailable.display_with("%"), "N/A");

        let json = serde_json::to_string(&KpiValue::Available(2.345)).unwrap();
        assert_eq!(json, "2.35");
        let json = serde_json::to_string(&KpiValue::Unavailable).unwrap();
        assert_eq!(json, "\"unavailable\"");
    }

    #[test]
    fn test_kpis_over_sample() {
        let ctx = sample_context();
        let rows: Vec<&CustomerRow> = ctx.customers().rows().iter().collect();
        let kpis = KpiAggregator::compute(&rows);

        assert_eq!(kpis.customer_count, 5);
        assert_eq!(kpis.avg_ltv_cac.rounded(), Some(2.2));
        assert_eq!(kpis.avg_cac_payback_months.rounded(), Some(13.8));
        assert_eq!(kpis.churn_rate_pct.rounded(), Some(40.0));
        assert_eq!(kpis.avg_ltv.rounded(), Some(2400.0));
        assert_eq!(kpis.avg_cac.rounded(), Some(1150.0));
    }

    #[test]
    fn test_kpis_empty_are_unavailable() {
        let kpis = KpiAggregator::compute(&[]);
        assert_eq!(kpis.avg_ltv_cac, KpiValue::Unavailable);
        assert_eq!(kpis.avg_cac_payback_months, KpiValue::Unavailable);
        assert_eq!(kpis.churn_rate_pct, KpiValue::Unavailable);
        assert_eq!(kpis.avg_health_score, KpiValue::Unavailable);
        assert_eq!(kpis.customer_count, 0);
    }

    #[test]
    fn test_churn_breakdown() {
        let ctx = sample_context();
        let rows: Vec<&CustomerRow> = ctx.customers().rows().iter().collect();
        let b = KpiAggregator::churn_breakdown(&rows);
        assert_eq!(b.active, 3);
        assert_eq!(b.churned, 2);
        assert_eq!(b.churned_pct, KpiValue::Available(40.0));

        let empty = KpiAggregator::churn_breakdown(&[]);
        assert_eq!(empty.churned_pct, KpiValue::Unavailable);
    }

    #[test]
    fn test_scatter_groups_by_plan_first_seen() {
        let ctx = sample_context();
        let rows: Vec<&CustomerRow> = ctx.customers().rows().iter().collect();
        let scatter = KpiAggregator::scatter_by_plan(&rows);
        let plans: Vec<&str> = scatter.iter().map(|s| s.plan_name.as_str()).collect();
        assert_eq!(plans, vec!["Pro", "Basic"]);
        assert_eq!(scatter[0].points.len(), 3);
        assert_eq!(scatter[1].points[0], (1000.0, 1000.0));
    }

    #[test]
    fn test_rollups_over_sample() {
        let ctx = sample_context();
        let rows: Vec<&SegmentRow> = ctx.segments().rows().iter().collect();
        let r = SegmentAggregator::rollups(&rows, |d| ctx.segment_key_order(d)).unwrap();

        // Fintech (3+2)/2 = 2.5, Retail (1+2)/2 = 1.5, Health 3.0
        assert_eq!(keys(&r.ltv_cac_by_industry), vec!["Health", "Fintech", "Retail"]);
        assert_eq!(r.ltv_cac_by_industry[1].value, 2.5);
        // Fintech 11, Retail 19.5, Health 8
        assert_eq!(keys(&r.payback_by_industry), vec!["Health", "Fintech", "Retail"]);
        // SMB 4+1+5 = 10, Enterprise 2+3 = 5
        assert_eq!(keys(&r.customers_by_company_size), vec!["SMB", "Enterprise"]);
        assert_eq!(r.customers_by_company_size[0].value, 10.0);
        // Pro (3+2+2)/3, Basic (1+3)/2 = 2.0
        assert_eq!(keys(&r.ltv_cac_by_plan), vec!["Pro", "Basic"]);
    }

    #[test]
    fn test_rollup_ties_keep_table_order() {
        let ctx = sample_context();
        // Retail SMB (2.0) and Fintech Enterprise (2.0) tie on Avg_LTV_CAC.
        let rows: Vec<&SegmentRow> = ctx
            .segments()
            .rows()
            .iter()
            .filter(|r| r.avg_ltv_cac == 2.0)
            .collect();
        let order = ctx.segment_key_order(Dimension::Industry);
        let desc = SegmentAggregator::group_by(
            &rows,
            Dimension::Industry,
            order,
            |r| r.avg_ltv_cac,
            AggregateFn::Mean,
            SortOrder::Descending,
        );
        let asc = SegmentAggregator::group_by(
            &rows,
            Dimension::Industry,
            order,
            |r| r.avg_ltv_cac,
            AggregateFn::Mean,
            SortOrder::Ascending,
        );
        // Fintech precedes Retail in the unfiltered table.
        assert_eq!(keys(&desc), vec!["Fintech", "Retail"]);
        assert_eq!(keys(&asc), vec!["Fintech", "Retail"]);
    }

    #[test]
    fn test_numeric_cmp_treats_signed_zero_as_equal() {
        assert_eq!(numeric_cmp(-0.0, 0.0), Ordering::Equal);
        assert_eq!(numeric_cmp(0.0, -0.0), Ordering::Equal);
        assert_eq!(numeric_cmp(1.0, 2.0), Ordering::Less);
    }

    #[test]
    fn test_rollups_empty_is_none() {
        let none: Vec<String> = Vec::new();
        assert!(SegmentAggregator::rollups(&[], |_| none.as_slice()).is_none());
    }
}
