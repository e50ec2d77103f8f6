//! Full-screen dashboard view for the unit-economics TUI.
//!
//! Lays out the header, KPI bar, filter panels, distribution charts, segment
//! rollups, customer table and footer, and renders one [`DashboardOutput`]
//! into them.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use econ_core::models::Dimension;
use econ_core::selection::PipelineInputs;
use econ_data::aggregator::GroupAggregate;
use econ_data::pipeline::DashboardOutput;

use crate::components::bar_chart::RankedBarChart;
use crate::components::charts::{HistogramPanel, ScatterPanel};
use crate::components::filter_panel::FilterPanel;
use crate::components::header::Header;
use crate::components::indicators::KpiStrip;
use crate::table_view;
use crate::themes::Theme;

/// Width of the filter column.
pub const FILTER_COLUMN_WIDTH: u16 = 28;
const CHART_ROW_HEIGHT: u16 = 9;
const ROLLUP_ROW_HEIGHT: u16 = 8;

/// Panel holding keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Filter(Dimension),
    Customers,
}

impl Focus {
    /// Focus cycle: the four filter panels, then the customer table.
    pub const ORDER: [Focus; 5] = [
        Focus::Filter(Dimension::Industry),
        Focus::Filter(Dimension::CompanySize),
        Focus::Filter(Dimension::PlanName),
        Focus::Filter(Dimension::BillingFrequency),
        Focus::Customers,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

/// Everything the dashboard view needs for one frame.
pub struct DashboardViewData<'a> {
    /// Data directory shown in the header.
    pub source: &'a str,
    pub output: &'a DashboardOutput,
    pub inputs: &'a PipelineInputs,
    /// Known values per dimension, indexed like [`Dimension::ALL`].
    pub values: [&'a [String]; 4],
    pub focus: Focus,
    /// Cursor per filter panel, indexed like [`Dimension::ALL`].
    pub cursors: [usize; 4],
    /// First visible customer row.
    pub scroll: usize,
    pub status: Option<&'a str>,
}

/// Key help shown in the footer.
pub const KEY_HELP: &str = "Tab focus | ↑↓ move | Space toggle | a all | n none | c churned | s sort | o order | PgUp/PgDn scroll | r reset | e export | q quit";

/// Screen regions of the dashboard.
pub struct DashboardLayout {
    pub header: Rect,
    pub kpis: Rect,
    pub filters: [Rect; 4],
    pub charts: [Rect; 4],
    pub rollups: [Rect; 4],
    pub table: Rect,
    pub footer: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(FILTER_COLUMN_WIDTH), Constraint::Min(40)])
            .split(rows[2]);

        let filters = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(main[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(CHART_ROW_HEIGHT),
                Constraint::Length(ROLLUP_ROW_HEIGHT),
                Constraint::Min(4),
            ])
            .split(main[1]);

        let quarters = |r: Rect| {
            let parts = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 4); 4])
                .split(r);
            [parts[0], parts[1], parts[2], parts[3]]
        };

        Self {
            header: rows[0],
            kpis: rows[1],
            filters: [filters[0], filters[1], filters[2], filters[3]],
            charts: quarters(right[0]),
            rollups: quarters(right[1]),
            table: right[2],
            footer: rows[3],
        }
    }
}

/// Bar width that leaves room for the labels and values inside `area`.
pub fn bar_width(area: Rect, groups: &[GroupAggregate], value_width: u16) -> u16 {
    let label = groups
        .iter()
        .map(|g| UnicodeWidthStr::width(g.key.as_str()))
        .max()
        .unwrap_or(0) as u16;
    // Borders, the space after the label and the space before the value.
    area.width
        .saturating_sub(2 + label + 2 + value_width)
        .max(1)
}

fn render_rollup(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    chart: Option<RankedBarChart<'_>>,
    theme: &Theme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Span::styled(format!(" {title} "), theme.header));
    let lines = match chart {
        Some(chart) => chart.to_lines(),
        None => vec![Line::from(Span::styled("No data", theme.dim))],
    };
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

/// Render the whole dashboard into `frame`.
pub fn render_dashboard(frame: &mut Frame, data: &DashboardViewData<'_>, theme: &Theme) {
    let layout = DashboardLayout::new(frame.area());
    let out = data.output;

    // Header
    let header = Header::new(
        data.source,
        (out.filtered_customers, out.total_customers),
        (out.filtered_segments, out.total_segments),
        theme,
    );
    frame.render_widget(Paragraph::new(Text::from(header.to_lines())), layout.header);

    // KPI bar
    let kpis = KpiStrip::new(&out.kpis, &out.churn, theme);
    frame.render_widget(
        Paragraph::new(kpis.to_line()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" KPIs ", theme.header)),
        ),
        layout.kpis,
    );

    // Filters
    for (i, dimension) in Dimension::ALL.into_iter().enumerate() {
        FilterPanel::new(
            dimension,
            data.values[i],
            data.inputs.filters.get(dimension),
            theme,
        )
        .cursor(data.cursors[i])
        .focused(data.focus == Focus::Filter(dimension))
        .render(frame, layout.filters[i]);
    }

    // Distributions
    let dist = out.distributions.as_ref();
    HistogramPanel::new("LTV/CAC", dist.map(|d| &d.ltv_cac_ratio), theme)
        .render(frame, layout.charts[0]);
    HistogramPanel::new("Payback (mo)", dist.map(|d| &d.cac_payback_months), theme)
        .style(theme.bar_alt)
        .render(frame, layout.charts[1]);
    HistogramPanel::new("Health Score", dist.map(|d| &d.customer_health_score), theme)
        .style(theme.success)
        .render(frame, layout.charts[2]);
    ScatterPanel::new(&out.ltv_vs_cac, theme).render(frame, layout.charts[3]);

    // Segment rollups
    let rollups = out.segment_rollups.as_ref();
    let specs: [(&str, Option<&[GroupAggregate]>, usize); 4] = [
        (
            "LTV/CAC by Industry",
            rollups.map(|r| r.ltv_cac_by_industry.as_slice()),
            2,
        ),
        (
            "Payback by Industry",
            rollups.map(|r| r.payback_by_industry.as_slice()),
            1,
        ),
        (
            "Customers by Size",
            rollups.map(|r| r.customers_by_company_size.as_slice()),
            0,
        ),
        (
            "LTV/CAC by Plan",
            rollups.map(|r| r.ltv_cac_by_plan.as_slice()),
            2,
        ),
    ];
    for (i, (title, groups, decimals)) in specs.into_iter().enumerate() {
        let area = layout.rollups[i];
        let chart = groups.map(|g| {
            let chart = RankedBarChart::new(g, theme)
                .width(bar_width(area, g, 8))
                .decimals(decimals);
            match i {
                0 | 3 => chart.styled_by(Theme::ratio_style),
                1 => chart.styled_by(Theme::payback_style),
                _ => chart,
            }
        });
        render_rollup(frame, area, title, chart, theme);
    }

    // Customer table
    if out.rows.is_empty() {
        table_view::render_no_data(frame, layout.table, theme);
    } else {
        table_view::render_customer_table(
            frame,
            layout.table,
            &out.rows,
            &data.inputs.display,
            data.scroll,
            data.focus == Focus::Customers,
            theme,
        );
    }

    // Footer
    let mut footer = vec![Line::from(Span::styled(KEY_HELP, theme.dim))];
    if let Some(status) = data.status {
        footer.push(Line::from(Span::styled(status.to_string(), theme.info)));
    }
    frame.render_widget(
        Paragraph::new(Text::from(footer))
            .block(Block::default().borders(Borders::TOP).border_style(theme.border)),
        layout.footer,
    );
}

/// Blocking error screen shown when the data cannot be loaded.
pub fn render_error(frame: &mut Frame, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Unable to load unit economics data", theme.error)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.text)),
        Line::from(""),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.error)
                    .title(" Unit Economics Dashboard "),
            ),
        frame.area(),
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use econ_core::selection::DimensionFilter;
    use econ_data::pipeline::run_pipeline;
    use econ_data::reader::{CustomerTable, DataContext, SegmentTable};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::Path;

    const CUSTOMERS: &str = "\
customer_id,industry,company_size,plan_name,billing_frequency,LTV,CAC,LTV_CAC_Ratio,CAC_Payback_Months,Monthly_Revenue,Customer_Health_Score,Churned,latest_end
1,Fintech,SMB,Pro,monthly,3000,1000,3.0,10,100,80,0,2024-03-31
2,Retail,Enterprise,Basic,annual,1000,1000,1.0,24,50,,1,2024-01-31
3,Fintech,Enterprise,Pro,annual,4000,2000,2.0,12,200,60,0,2024-02-29
";
    const SEGMENTS: &str = "\
industry,company_size,plan_name,billing_frequency,Avg_LTV_CAC,Avg_Payback_Months,Customer_Count
Fintech,SMB,Pro,monthly,3.0,10,4
Retail,Enterprise,Basic,annual,1.0,24,2
Fintech,Enterprise,Pro,annual,2.0,12,3
";

    fn context() -> DataContext {
        DataContext::new(
            CustomerTable::from_reader(CUSTOMERS.as_bytes(), Path::new("c.csv")).unwrap(),
            SegmentTable::from_reader(SEGMENTS.as_bytes(), Path::new("s.csv")).unwrap(),
        )
    }

    fn draw(ctx: &DataContext, inputs: &PipelineInputs, width: u16, height: u16) -> String {
        let output = run_pipeline(ctx, inputs);
        let values = Dimension::ALL.map(|d| ctx.distinct_values(d));
        let data = DashboardViewData {
            source: "./data",
            output: &output,
            inputs,
            values,
            focus: Focus::Filter(Dimension::Industry),
            cursors: [0; 4],
            scroll: 0,
            status: Some("ready"),
        };
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| render_dashboard(frame, &data, &theme))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_focus_cycle() {
        let mut focus = Focus::Filter(Dimension::Industry);
        for _ in 0..Focus::ORDER.len() {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Filter(Dimension::Industry));
        assert_eq!(Focus::Filter(Dimension::Industry).prev(), Focus::Customers);
        assert_eq!(
            Focus::Customers.next(),
            Focus::Filter(Dimension::Industry)
        );
    }

    #[test]
    fn test_layout_regions_fit_area() {
        let area = Rect::new(0, 0, 200, 60);
        let layout = DashboardLayout::new(area);
        assert_eq!(layout.header.height, 4);
        assert_eq!(layout.kpis.height, 3);
        assert_eq!(layout.footer.height, 3);
        assert_eq!(layout.filters[0].width, FILTER_COLUMN_WIDTH);
        assert_eq!(layout.charts[0].height, CHART_ROW_HEIGHT);
        assert!(layout.table.height >= 4);
    }

    #[test]
    fn test_bar_width_leaves_room_for_labels() {
        let groups = vec![GroupAggregate {
            key: "Fintech".into(),
            value: 1.0,
        }];
        assert_eq!(bar_width(Rect::new(0, 0, 40, 8), &groups, 8), 21);
        assert_eq!(bar_width(Rect::new(0, 0, 10, 8), &groups, 8), 1);
    }

    #[test]
    fn test_render_full_dashboard() {
        let ctx = context();
        let content = draw(&ctx, &PipelineInputs::default(), 200, 60);
        assert!(content.contains("UNIT ECONOMICS DASHBOARD"));
        assert!(content.contains("3 of 3 customers"));
        assert!(content.contains("Avg LTV/CAC: 2.00x"));
        assert!(content.contains("Industry (all)"));
        assert!(content.contains("LTV/CAC by Industry"));
        assert!(content.contains("Customers (3)"));
        assert!(content.contains("ready"));
    }

    #[test]
    fn test_render_empty_selection_shows_placeholders() {
        let ctx = context();
        let mut inputs = PipelineInputs::default();
        inputs.filters.industry = DimensionFilter::none();
        let content = draw(&ctx, &inputs, 200, 60);
        assert!(content.contains("0 of 3 customers"));
        assert!(content.contains("Avg LTV/CAC: N/A"));
        assert!(content.contains("No customers match the current filters"));
        assert!(content.contains("No data"));
    }

    #[test]
    fn test_render_small_terminal_does_not_panic() {
        let ctx = context();
        draw(&ctx, &PipelineInputs::default(), 40, 12);
    }

    #[test]
    fn test_render_error_screen() {
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal
            .draw(|frame| render_error(frame, "failed to read ./unit_economics.csv", &theme))
            .unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Unable to load unit economics data"));
        assert!(content.contains("failed to read ./unit_economics.csv"));
    }
}
