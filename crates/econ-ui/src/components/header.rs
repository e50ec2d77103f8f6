use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the application title.
pub const ACCENTS: &str = "◆ ◇ ◆";

pub const TITLE: &str = " UNIT ECONOMICS DASHBOARD ";

/// Dashboard header rendering four lines:
///
/// 1. Application title with accent decorations.
/// 2. A 60-column `=` separator.
/// 3. Data source and filter coverage in `[ dir | x of y customers | ... ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Directory the CSV files were read from.
    pub source: &'a str,
    /// `(filtered, total)` customers.
    pub customers: (usize, usize),
    /// `(filtered, total)` segments.
    pub segments: (usize, usize),
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(
        source: &'a str,
        customers: (usize, usize),
        segments: (usize, usize),
        theme: &'a Theme,
    ) -> Self {
        Self {
            source,
            customers,
            segments,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);
        let coverage = |(filtered, total): (usize, usize), noun: &str| {
            format!("{filtered} of {total} {noun}")
        };

        vec![
            Line::from(vec![
                Span::styled(ACCENTS, self.theme.header_accent),
                Span::styled(TITLE, self.theme.header),
                Span::styled(ACCENTS, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.source.to_string(), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(coverage(self.customers, "customers"), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(coverage(self.segments, "segments"), self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
