//! Customer list table for the unit-economics dashboard.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per listed
//! customer, scrolled by a row offset, with churned customers highlighted.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use econ_core::formatting::{self, ellipsize};
use econ_core::selection::{DisplayOptions, SortColumn, SortOrder};
use econ_data::pipeline::CustomerListRow;

use crate::themes::Theme;

/// Column headers in display order, paired with the sort column they map to.
pub const COLUMNS: [(&str, Option<SortColumn>); 16] = [
    ("ID", Some(SortColumn::CustomerId)),
    ("Industry", None),
    ("Size", None),
    ("Plan", None),
    ("LTV", None),
    ("CAC", None),
    ("LTV/CAC", Some(SortColumn::LtvCacRatio)),
    ("Payback", Some(SortColumn::CacPaybackMonths)),
    ("MRR", Some(SortColumn::MonthlyRevenue)),
    ("Health", Some(SortColumn::CustomerHealthScore)),
    ("Churned", None),
    ("Latest End", Some(SortColumn::LatestEnd)),
    ("Sentiment", None),
    ("Active Days", None),
    ("Events", None),
    ("Usage", None),
];

const WIDTHS: [u16; 16] = [8, 14, 10, 10, 11, 11, 8, 8, 10, 7, 7, 10, 9, 11, 8, 7];

/// Header labels, the active sort column marked with an arrow.
pub fn header_labels(display: &DisplayOptions) -> Vec<String> {
    COLUMNS
        .iter()
        .map(|(label, column)| match (column, display.sort_column) {
            (Some(c), Some(active)) if *c == active => {
                let arrow = match display.sort_order {
                    SortOrder::Ascending => '▲',
                    SortOrder::Descending => '▼',
                };
                format!("{label} {arrow}")
            }
            _ => (*label).to_string(),
        })
        .collect()
}

/// Formatted cell text of one row, in [`COLUMNS`] order.
pub fn row_cells(row: &CustomerListRow) -> Vec<String> {
    let text = |s: &str, i: usize| ellipsize(s, WIDTHS[i] as usize);
    vec![
        text(&row.customer_id, 0),
        text(&row.industry, 1),
        text(&row.company_size, 2),
        text(&row.plan_name, 3),
        formatting::format_currency(row.ltv),
        formatting::format_currency(row.cac),
        format!("{:.2}", row.ltv_cac_ratio),
        format!("{:.1}", row.cac_payback_months),
        formatting::format_currency(row.monthly_revenue),
        format!("{:.1}", row.customer_health_score),
        if row.churned { "yes" } else { "no" }.to_string(),
        row.latest_end.clone().unwrap_or_else(|| "-".to_string()),
        format!("{:.2}", row.avg_sentiment_score),
        formatting::format_number(row.active_days, 0),
        formatting::format_number(row.usage_events, 0),
        format!("{:.1}", row.usage_score),
    ]
}

/// `" Customers (12) | sort: LTV_CAC_Ratio desc | churned only "`
pub fn table_title(count: usize, display: &DisplayOptions) -> String {
    let mut title = format!(" Customers ({count})");
    match display.sort_column {
        Some(column) => title.push_str(&format!(
            " | sort: {} {}",
            column,
            display.sort_order.as_str()
        )),
        None => title.push_str(" | unsorted"),
    }
    if display.show_churned_only {
        title.push_str(" | churned only");
    }
    title.push(' ');
    title
}

/// Render the customer list into `area`, starting at row `offset`.
pub fn render_customer_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[CustomerListRow],
    display: &DisplayOptions,
    offset: usize,
    focused: bool,
    theme: &Theme,
) {
    let header = Row::new(
        header_labels(display)
            .into_iter()
            .map(|h| Cell::from(h).style(theme.table_header)),
    )
    .height(1);

    // Two border rows and one header row.
    let visible = area.height.saturating_sub(3) as usize;
    let start = offset.min(rows.len().saturating_sub(1));

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, row)| {
            let style = if row.churned {
                theme.churned_row
            } else if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let mut cells: Vec<Cell> = row_cells(row).into_iter().map(Cell::from).collect();
            cells[6] = Cell::from(format!("{:.2}", row.ltv_cac_ratio))
                .style(theme.ratio_style(row.ltv_cac_ratio));
            Row::new(cells).style(style)
        })
        .collect();

    let widths = WIDTHS.map(Constraint::Length);

    let table = Table::new(data_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(focused))
                .title(Span::styled(table_title(rows.len(), display), theme.header)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a "no data" placeholder when no customers pass the filters.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No customers match the current filters",
            theme.warning,
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press 'a' to select all values of the focused filter, 'r' to reset",
            theme.dim,
        )),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Customers "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
