use crate::themes::Theme;
use econ_core::formatting::format_number;
use econ_data::aggregator::PlanScatter;
use econ_data::histogram::Histogram;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Sparkline};
use ratatui::Frame;

/// Merge adjacent bins so at most `width` remain. Counts are preserved.
pub fn rebin(counts: &[u64], width: usize) -> Vec<u64> {
    if width == 0 || counts.len() <= width {
        return counts.to_vec();
    }
    let per = counts.len().div_ceil(width);
    counts.chunks(per).map(|c| c.iter().sum()).collect()
}

fn empty_panel(frame: &mut Frame, area: Rect, block: Block, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(Span::styled("No data", theme.dim)).block(block),
        area,
    );
}

// ── HistogramPanel ───────────────────────────────────────────────────────────

/// Sparkline rendition of a [`Histogram`], squeezed to the panel width.
pub struct HistogramPanel<'a> {
    pub title: &'a str,
    pub histogram: Option<&'a Histogram>,
    pub style: Style,
    pub theme: &'a Theme,
}

impl<'a> HistogramPanel<'a> {
    pub fn new(title: &'a str, histogram: Option<&'a Histogram>, theme: &'a Theme) -> Self {
        Self {
            title,
            histogram,
            style: theme.bar,
            theme,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// `" Title [lo – hi] "`
    pub fn block_title(&self) -> String {
        match self.histogram {
            Some(h) => format!(
                " {} [{} – {}] ",
                self.title,
                format_number(h.lower, 1),
                format_number(h.upper, 1)
            ),
            None => format!(" {} ", self.title),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border)
            .title(Span::styled(self.block_title(), self.theme.header));

        let Some(histogram) = self.histogram else {
            empty_panel(frame, area, block, self.theme);
            return;
        };

        let inner_width = area.width.saturating_sub(2) as usize;
        let data = rebin(&histogram.counts, inner_width);
        let sparkline = Sparkline::default()
            .block(block)
            .data(data)
            .style(self.style);
        frame.render_widget(sparkline, area);
    }
}

// ── ScatterPanel ─────────────────────────────────────────────────────────────

/// LTV against CAC, one scatter dataset per plan.
pub struct ScatterPanel<'a> {
    pub series: &'a [PlanScatter],
    pub theme: &'a Theme,
}

impl<'a> ScatterPanel<'a> {
    pub fn new(series: &'a [PlanScatter], theme: &'a Theme) -> Self {
        Self { series, theme }
    }

    fn palette(&self) -> [Style; 5] {
        let t = self.theme;
        [t.bar, t.bar_alt, t.success, t.warning, t.info]
    }

    /// `([0, max_cac], [0, max_ltv])`, never degenerate.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let (max_x, max_y) = self
            .series
            .iter()
            .flat_map(|s| s.points.iter())
            .fold((0.0_f64, 0.0_f64), |(mx, my), &(x, y)| (mx.max(x), my.max(y)));
        let pad = |m: f64| if m > 0.0 { m * 1.05 } else { 1.0 };
        ([0.0, pad(max_x)], [0.0, pad(max_y)])
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border)
            .title(Span::styled(" LTV vs CAC by Plan ", self.theme.header));

        if self.series.iter().all(|s| s.points.is_empty()) {
            empty_panel(frame, area, block, self.theme);
            return;
        }

        let palette = self.palette();
        let datasets: Vec<Dataset> = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Dataset::default()
                    .name(s.plan_name.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Scatter)
                    .style(palette[i % palette.len()])
                    .data(&s.points)
            })
            .collect();

        let (x, y) = self.bounds();
        let labels = |[lo, hi]: [f64; 2]| {
            vec![
                Span::styled(format_number(lo, 0), self.theme.dim),
                Span::styled(format_number(hi, 0), self.theme.dim),
            ]
        };

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title(Span::styled("CAC", self.theme.label))
                    .style(self.theme.dim)
                    .bounds(x)
                    .labels(labels(x)),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled("LTV", self.theme.label))
                    .style(self.theme.dim)
                    .bounds(y)
                    .labels(labels(y)),
            );
        frame.render_widget(chart, area);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_rebin_keeps_short_input() {
        assert_eq!(rebin(&[1, 2, 3], 10), vec![1, 2, 3]);
        assert_eq!(rebin(&[1, 2, 3], 0), vec![1, 2, 3]);
    }

    #[test]
    fn test_rebin_merges_and_preserves_total() {
        let counts: Vec<u64> = (1..=50).collect();
        let merged = rebin(&counts, 20);
        assert!(merged.len() <= 20);
        assert_eq!(merged.iter().sum::<u64>(), counts.iter().sum::<u64>());
        assert_eq!(merged[0], 1 + 2 + 3);
    }

    #[test]
    fn test_histogram_title_shows_range() {
        let theme = Theme::dark();
        let h = Histogram::from_values(&[1.0, 2.0, 3.0], 4).unwrap();
        let panel = HistogramPanel::new("LTV/CAC", Some(&h), &theme);
        assert_eq!(panel.block_title(), " LTV/CAC [1.0 – 3.0] ");
    }

    #[test]
    fn test_histogram_render_no_data() {
        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(30, 5)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                HistogramPanel::new("Health", None, &theme).render(f, area)
            })
            .unwrap();
        let content = buffer_text(&terminal);
        assert!(content.contains("Health"));
        assert!(content.contains("No data"));
    }

    #[test]
    fn test_histogram_render_with_data() {
        let theme = Theme::dark();
        let h = Histogram::from_values(&[1.0, 1.0, 2.0, 5.0], 50).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                HistogramPanel::new("Payback", Some(&h), &theme).render(f, area)
            })
            .unwrap();
        let content = buffer_text(&terminal);
        assert!(content.contains("Payback [1.0"));
        assert!(!content.contains("No data"));
    }

    #[test]
    fn test_scatter_bounds() {
        let theme = Theme::dark();
        let series = vec![
            PlanScatter {
                plan_name: "Pro".into(),
                points: vec![(1000.0, 3000.0), (2000.0, 4000.0)],
            },
            PlanScatter {
                plan_name: "Basic".into(),
                points: vec![(500.0, 1500.0)],
            },
        ];
        let (x, y) = ScatterPanel::new(&series, &theme).bounds();
        assert_eq!(x[0], 0.0);
        assert!((x[1] - 2100.0).abs() < 1e-6);
        assert!((y[1] - 4200.0).abs() < 1e-6);
    }

    #[test]
    fn test_scatter_render() {
        let theme = Theme::dark();
        let series = vec![PlanScatter {
            plan_name: "Pro".into(),
            points: vec![(1000.0, 3000.0)],
        }];
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                ScatterPanel::new(&series, &theme).render(f, area)
            })
            .unwrap();
        assert!(buffer_text(&terminal).contains("LTV vs CAC by Plan"));

        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                ScatterPanel::new(&[], &theme).render(f, area)
            })
            .unwrap();
        assert!(buffer_text(&terminal).contains("No data"));
    }
}
