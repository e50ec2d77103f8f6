//! Filter and display inputs of the dashboard pipeline.
//!
//! A [`DimensionFilter`] distinguishes an omitted filter ([`DimensionFilter::All`])
//! from an explicit selection ([`DimensionFilter::Only`]). An explicit empty
//! selection matches no rows at all.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{columns, Dimension, SegmentKey};

// ── DimensionFilter ───────────────────────────────────────────────────────────

/// Allowed values for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionFilter {
    /// No restriction on this dimension.
    #[default]
    All,
    /// Restrict to exactly these values; an empty set matches nothing.
    Only(BTreeSet<String>),
}

impl DimensionFilter {
    /// Build an explicit selection from any iterable of values.
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DimensionFilter::Only(values.into_iter().map(Into::into).collect())
    }

    /// The explicit empty selection.
    pub fn none() -> Self {
        DimensionFilter::Only(BTreeSet::new())
    }

    /// `true` when a row carrying `value` passes this filter.
    pub fn allows(&self, value: &str) -> bool {
        match self {
            DimensionFilter::All => true,
            DimensionFilter::Only(set) => set.contains(value),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, DimensionFilter::All)
    }

    /// Flip membership of `value`.
    ///
    /// Toggling from [`DimensionFilter::All`] first materialises `universe`
    /// as an explicit selection, then removes `value` from it.
    pub fn toggle(&mut self, value: &str, universe: &[String]) {
        if self.is_all() {
            *self = DimensionFilter::only(universe.iter().cloned());
        }
        if let DimensionFilter::Only(set) = self {
            if !set.remove(value) {
                set.insert(value.to_string());
            }
        }
    }

    /// Number of values in `universe` that pass this filter.
    pub fn selected_count(&self, universe: &[String]) -> usize {
        universe.iter().filter(|v| self.allows(v)).count()
    }
}

// ── FilterSelection ───────────────────────────────────────────────────────────

/// One [`DimensionFilter`] per dimension, combined by conjunction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub industry: DimensionFilter,
    pub company_size: DimensionFilter,
    pub plan_name: DimensionFilter,
    pub billing_frequency: DimensionFilter,
}

impl FilterSelection {
    pub fn get(&self, dimension: Dimension) -> &DimensionFilter {
        match dimension {
            Dimension::Industry => &self.industry,
            Dimension::CompanySize => &self.company_size,
            Dimension::PlanName => &self.plan_name,
            Dimension::BillingFrequency => &self.billing_frequency,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut DimensionFilter {
        match dimension {
            Dimension::Industry => &mut self.industry,
            Dimension::CompanySize => &mut self.company_size,
            Dimension::PlanName => &mut self.plan_name,
            Dimension::BillingFrequency => &mut self.billing_frequency,
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, dimension: Dimension, filter: DimensionFilter) -> Self {
        *self.get_mut(dimension) = filter;
        self
    }

    /// `true` when every dimension of `key` passes its filter.
    pub fn matches(&self, key: &SegmentKey) -> bool {
        Dimension::ALL
            .iter()
            .all(|&d| self.get(d).allows(key.get(d)))
    }
}

// ── Sorting ───────────────────────────────────────────────────────────────────

/// Columns the customer list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    #[serde(rename = "customer_id")]
    CustomerId,
    #[serde(rename = "LTV_CAC_Ratio")]
    LtvCacRatio,
    #[serde(rename = "CAC_Payback_Months")]
    CacPaybackMonths,
    #[serde(rename = "Customer_Health_Score")]
    CustomerHealthScore,
    #[serde(rename = "Monthly_Revenue")]
    MonthlyRevenue,
    #[serde(rename = "latest_end")]
    LatestEnd,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::CustomerId,
        SortColumn::LtvCacRatio,
        SortColumn::CacPaybackMonths,
        SortColumn::CustomerHealthScore,
        SortColumn::MonthlyRevenue,
        SortColumn::LatestEnd,
    ];

    /// Column name as it appears in the customer file.
    pub fn column_name(self) -> &'static str {
        match self {
            SortColumn::CustomerId => columns::CUSTOMER_ID,
            SortColumn::LtvCacRatio => columns::LTV_CAC_RATIO,
            SortColumn::CacPaybackMonths => columns::CAC_PAYBACK_MONTHS,
            SortColumn::CustomerHealthScore => columns::CUSTOMER_HEALTH_SCORE,
            SortColumn::MonthlyRevenue => columns::MONTHLY_REVENUE,
            SortColumn::LatestEnd => columns::LATEST_END,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortColumn::CustomerId => "Customer ID",
            SortColumn::LtvCacRatio => "LTV/CAC Ratio",
            SortColumn::CacPaybackMonths => "CAC Payback Months",
            SortColumn::CustomerHealthScore => "Customer Health Score",
            SortColumn::MonthlyRevenue => "Monthly Revenue",
            SortColumn::LatestEnd => "Latest End Date",
        }
    }

    /// Resolve a column name. Unknown names yield `None`, which the pipeline
    /// treats as "leave rows in table order".
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.column_name() == name.trim())
    }

    /// Next column in [`SortColumn::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Direction of the customer list sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Accepts `asc`/`ascending` and `desc`/`descending` in any case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

// ── Pipeline inputs ───────────────────────────────────────────────────────────

/// Row-list presentation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Restrict the row list to churned customers.
    pub show_churned_only: bool,
    /// `None` keeps the filtered rows in table order.
    pub sort_column: Option<SortColumn>,
    pub sort_order: SortOrder,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_churned_only: false,
            sort_column: Some(SortColumn::CustomerId),
            sort_order: SortOrder::Ascending,
        }
    }
}

/// Everything a single pipeline invocation depends on besides the data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineInputs {
    pub filters: FilterSelection,
    pub display: DisplayOptions,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
