use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names shared by the customer and segment files.
pub mod columns {
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const INDUSTRY: &str = "industry";
    pub const COMPANY_SIZE: &str = "company_size";
    pub const PLAN_NAME: &str = "plan_name";
    pub const BILLING_FREQUENCY: &str = "billing_frequency";

    pub const LTV: &str = "LTV";
    pub const CAC: &str = "CAC";
    pub const LTV_CAC_RATIO: &str = "LTV_CAC_Ratio";
    pub const CAC_PAYBACK_MONTHS: &str = "CAC_Payback_Months";
    pub const MONTHLY_REVENUE: &str = "Monthly_Revenue";

    pub const CUSTOMER_HEALTH_SCORE: &str = "Customer_Health_Score";
    pub const AVG_SENTIMENT_SCORE: &str = "Avg_Sentiment_Score";
    pub const ACTIVE_DAYS: &str = "Active_Days";
    pub const USAGE_EVENTS: &str = "Usage_Events";
    pub const USAGE_SCORE: &str = "Usage_Score";

    pub const CHURNED: &str = "Churned";
    pub const LATEST_END: &str = "latest_end";

    pub const AVG_LTV_CAC: &str = "Avg_LTV_CAC";
    pub const AVG_PAYBACK_MONTHS: &str = "Avg_Payback_Months";
    pub const CUSTOMER_COUNT: &str = "Customer_Count";
}

/// One of the four categorical dimensions every row is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Industry,
    CompanySize,
    PlanName,
    BillingFrequency,
}

impl Dimension {
    /// All dimensions in display order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Industry,
        Dimension::CompanySize,
        Dimension::PlanName,
        Dimension::BillingFrequency,
    ];

    /// Header name of the dimension in both input files.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Industry => columns::INDUSTRY,
            Dimension::CompanySize => columns::COMPANY_SIZE,
            Dimension::PlanName => columns::PLAN_NAME,
            Dimension::BillingFrequency => columns::BILLING_FREQUENCY,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Industry => "Industry",
            Dimension::CompanySize => "Company Size",
            Dimension::PlanName => "Plan",
            Dimension::BillingFrequency => "Billing Frequency",
        }
    }
}

/// The dimension values of a single row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SegmentKey {
    pub industry: String,
    pub company_size: String,
    pub plan_name: String,
    pub billing_frequency: String,
}

impl SegmentKey {
    /// Value of `dimension` for this row.
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Industry => &self.industry,
            Dimension::CompanySize => &self.company_size,
            Dimension::PlanName => &self.plan_name,
            Dimension::BillingFrequency => &self.billing_frequency,
        }
    }
}

/// A single customer from `unit_economics.csv`, after the load-time fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRow {
    pub customer_id: String,
    pub segment: SegmentKey,

    pub ltv: f64,
    pub cac: f64,
    pub ltv_cac_ratio: f64,
    pub cac_payback_months: f64,
    pub monthly_revenue: f64,

    /// Column mean substituted when missing in the file.
    pub customer_health_score: f64,
    /// Column mean substituted when missing in the file.
    pub avg_sentiment_score: f64,
    /// Zero substituted when missing in the file.
    pub active_days: f64,
    /// Zero substituted when missing in the file.
    pub usage_events: f64,
    /// Zero substituted when missing in the file.
    pub usage_score: f64,

    pub churned: bool,
    /// Most recent billing-period end, if the file carries one.
    pub latest_end: Option<NaiveDate>,
}

/// A pre-aggregated segment from `unit_economics_by_segment.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRow {
    pub segment: SegmentKey,
    pub avg_ltv_cac: f64,
    pub avg_payback_months: f64,
    pub customer_count: u64,
}
