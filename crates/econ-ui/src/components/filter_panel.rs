use crate::themes::Theme;
use econ_core::models::Dimension;
use econ_core::selection::DimensionFilter;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

pub const CHECKED: &str = "[x] ";
pub const UNCHECKED: &str = "[ ] ";

/// Checkbox list of the values of one dimension.
pub struct FilterPanel<'a> {
    pub dimension: Dimension,
    /// Every known value of the dimension, in display order.
    pub values: &'a [String],
    pub filter: &'a DimensionFilter,
    pub cursor: usize,
    pub focused: bool,
    pub theme: &'a Theme,
}

impl<'a> FilterPanel<'a> {
    pub fn new(
        dimension: Dimension,
        values: &'a [String],
        filter: &'a DimensionFilter,
        theme: &'a Theme,
    ) -> Self {
        Self {
            dimension,
            values,
            filter,
            cursor: 0,
            focused: false,
            theme,
        }
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// `" Industry (2/3) "`, or `(all)` when unrestricted.
    pub fn title(&self) -> String {
        if self.filter.is_all() {
            format!(" {} (all) ", self.dimension.label())
        } else {
            format!(
                " {} ({}/{}) ",
                self.dimension.label(),
                self.filter.selected_count(self.values),
                self.values.len()
            )
        }
    }

    pub fn lines(&self) -> Vec<Line<'a>> {
        self.values
            .iter()
            .map(|value| {
                let (mark, style) = if self.filter.allows(value) {
                    (CHECKED, self.theme.checked)
                } else {
                    (UNCHECKED, self.theme.unchecked)
                };
                Line::from(vec![
                    Span::styled(mark, style),
                    Span::styled(value.clone(), self.theme.text),
                ])
            })
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused))
            .title(Span::styled(self.title(), self.theme.header));

        if self.values.is_empty() {
            let list = List::new(vec![ListItem::new(Span::styled("(no values)", self.theme.dim))])
                .block(block);
            frame.render_widget(list, area);
            return;
        }

        let items: Vec<ListItem> = self.lines().into_iter().map(ListItem::new).collect();
        let mut list = List::new(items).block(block);
        let mut state = ListState::default();
        if self.focused {
            list = list.highlight_style(self.theme.cursor);
            state.select(Some(self.cursor.min(self.values.len() - 1)));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
