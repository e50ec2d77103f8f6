use crate::themes::Theme;
use econ_core::formatting::{format_currency, format_number};
use econ_data::aggregator::{ChurnBreakdown, KpiValue, Kpis};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

// ── KpiIndicator ─────────────────────────────────────────────────────────────

/// A single labelled metric, coloured by a threshold style when available.
///
/// Unavailable values render as `N/A` in the dim style.
pub struct KpiIndicator<'a> {
    pub label: &'static str,
    pub value: KpiValue,
    /// Renders an available value.
    pub format: fn(f64) -> String,
    /// Style for an available value.
    pub style: Style,
    pub theme: &'a Theme,
}

impl<'a> KpiIndicator<'a> {
    pub fn new(
        label: &'static str,
        value: KpiValue,
        format: fn(f64) -> String,
        style: Style,
        theme: &'a Theme,
    ) -> Self {
        Self {
            label,
            value,
            format,
            style,
            theme,
        }
    }

    /// `"Label: value"`
    pub fn to_spans(&self) -> Vec<Span<'a>> {
        let value = match self.value {
            KpiValue::Available(v) => Span::styled((self.format)(v), self.style),
            KpiValue::Unavailable => Span::styled("N/A", self.theme.dim),
        };
        vec![Span::styled(format!("{}: ", self.label), self.theme.label), value]
    }
}

fn ratio(v: f64) -> String {
    format!("{v:.2}x")
}

fn months(v: f64) -> String {
    format!("{v:.1} mo")
}

fn pct(v: f64) -> String {
    format!("{v:.1}%")
}

fn score(v: f64) -> String {
    format_number(v, 1)
}

// ── KpiStrip ─────────────────────────────────────────────────────────────────

/// The headline KPI bar: every indicator on one line, separated by `" | "`.
pub struct KpiStrip<'a> {
    pub kpis: &'a Kpis,
    pub churn: &'a ChurnBreakdown,
    pub theme: &'a Theme,
}

impl<'a> KpiStrip<'a> {
    pub fn new(kpis: &'a Kpis, churn: &'a ChurnBreakdown, theme: &'a Theme) -> Self {
        Self { kpis, churn, theme }
    }

    pub fn indicators(&self) -> Vec<KpiIndicator<'a>> {
        let t = self.theme;
        let k = self.kpis;
        let styled = |value: KpiValue, f: fn(&Theme, f64) -> Style| {
            value.value().map_or(t.dim, |v| f(t, v))
        };
        vec![
            KpiIndicator::new(
                "Avg LTV/CAC",
                k.avg_ltv_cac,
                ratio,
                styled(k.avg_ltv_cac, Theme::ratio_style),
                t,
            ),
            KpiIndicator::new(
                "Avg Payback",
                k.avg_cac_payback_months,
                months,
                styled(k.avg_cac_payback_months, Theme::payback_style),
                t,
            ),
            KpiIndicator::new(
                "Churn",
                k.churn_rate_pct,
                pct,
                styled(k.churn_rate_pct, Theme::churn_style),
                t,
            ),
            KpiIndicator::new("Avg Health", k.avg_health_score, score, t.value, t),
            KpiIndicator::new("Avg LTV", k.avg_ltv, format_currency, t.value, t),
            KpiIndicator::new("Avg CAC", k.avg_cac, format_currency, t.value, t),
        ]
    }

    /// Single line of all indicators plus the customer and churn counts.
    pub fn to_line(&self) -> Line<'a> {
        let separator = || Span::styled(" | ", self.theme.separator);
        let mut spans = Vec::new();
        for (i, indicator) in self.indicators().into_iter().enumerate() {
            if i > 0 {
                spans.push(separator());
            }
            spans.extend(indicator.to_spans());
        }
        spans.push(separator());
        spans.push(Span::styled("Customers: ", self.theme.label));
        spans.push(Span::styled(
            format_number(self.kpis.customer_count as f64, 0),
            self.theme.value,
        ));
        spans.push(Span::styled(
            format!(
                " ({} active / {} churned)",
                self.churn.active, self.churn.churned
            ),
            self.theme.dim,
        ));
        Line::from(spans)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
