use crate::themes::Theme;
use econ_data::aggregator::GroupAggregate;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Configuration controlling visual appearance of a bar chart.
pub struct BarConfig {
    /// Width in terminal columns of the bar portion (excluding label and value).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    /// Decimal places of the value printed after each bar.
    pub decimals: usize,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            width: 30,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            decimals: 2,
        }
    }
}

// ── RankedBarChart ───────────────────────────────────────────────────────────

/// Horizontal bars for a ranked rollup, one line per group.
///
/// Bars are scaled against the largest absolute value so the leader always
/// fills the full width. Labels are right-padded to a common display width.
pub struct RankedBarChart<'a> {
    pub groups: &'a [GroupAggregate],
    /// Per-value bar colour; `None` uses the theme's bar style.
    pub style_fn: Option<fn(&Theme, f64) -> Style>,
    pub theme: &'a Theme,
    pub config: BarConfig,
}

impl<'a> RankedBarChart<'a> {
    pub fn new(groups: &'a [GroupAggregate], theme: &'a Theme) -> Self {
        Self {
            groups,
            style_fn: None,
            theme,
            config: BarConfig::default(),
        }
    }

    pub fn styled_by(mut self, style_fn: fn(&Theme, f64) -> Style) -> Self {
        self.style_fn = Some(style_fn);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    pub fn decimals(mut self, decimals: usize) -> Self {
        self.config.decimals = decimals;
        self
    }

    /// Number of filled cells for `value`.
    pub fn filled_cells(&self, value: f64) -> u16 {
        let max = self
            .groups
            .iter()
            .map(|g| g.value.abs())
            .fold(0.0_f64, f64::max);
        if max <= 0.0 || !value.is_finite() {
            return 0;
        }
        let cells = (value.abs() / max * self.config.width as f64).round() as u16;
        cells.min(self.config.width)
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        if self.groups.is_empty() {
            return vec![Line::from(Span::styled("No data", self.theme.dim))];
        }

        let label_width = self
            .groups
            .iter()
            .map(|g| UnicodeWidthStr::width(g.key.as_str()))
            .max()
            .unwrap_or(0);

        self.groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let filled = self.filled_cells(group.value);
                let empty = self.config.width.saturating_sub(filled);
                let bar_style = match self.style_fn {
                    Some(f) => f(self.theme, group.value),
                    None if i % 2 == 0 => self.theme.bar,
                    None => self.theme.bar_alt,
                };

                let pad = label_width.saturating_sub(UnicodeWidthStr::width(group.key.as_str()));
                let label = format!("{}{} ", group.key, " ".repeat(pad));
                let filled_str: String =
                    std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
                let empty_str: String =
                    std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

                Line::from(vec![
                    Span::styled(label, self.theme.label),
                    Span::styled(filled_str, bar_style),
                    Span::styled(empty_str, self.theme.dim),
                    Span::styled(
                        format!(" {:.prec$}", group.value, prec = self.config.decimals),
                        self.theme.value,
                    ),
                ])
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
