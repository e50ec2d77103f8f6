//! Main application state and TUI event loop for the unit-economics dashboard.
//!
//! [`App`] owns the theme, the dashboard controller, the most recent pipeline
//! output, and the navigation state (focus, cursors, scroll offset). Every key
//! press that changes the pipeline inputs is turned into a
//! [`DashboardEvent`] and the output is recomputed immediately.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use econ_core::error::{EconError, Result};
use econ_core::models::Dimension;
use econ_data::export::FILTERED_CUSTOMERS_FILE;
use econ_data::pipeline::DashboardOutput;
use econ_runtime::controller::{DashboardController, DashboardEvent};

use crate::dashboard_view::{self, DashboardViewData, Focus};
use crate::themes::Theme;

/// Rows moved by PgUp / PgDn.
pub const PAGE_SIZE: usize = 10;

const TICK_RATE: Duration = Duration::from_millis(250);

type CrosstermTerminal = Terminal<CrosstermBackend<io::Stdout>>;

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App<'a> {
    pub theme: Theme,
    controller: DashboardController<'a>,
    output: DashboardOutput,
    /// Data directory shown in the header.
    source: String,
    /// Where `e` writes the filtered customer export.
    export_dir: PathBuf,
    pub focus: Focus,
    /// Cursor per filter panel, indexed like [`Dimension::ALL`].
    pub cursors: [usize; 4],
    pub scroll: usize,
    /// Message from the last action, shown in the footer.
    pub status: Option<String>,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(theme: Theme, controller: DashboardController<'a>, export_dir: PathBuf) -> Self {
        let output = controller.output();
        Self {
            theme,
            controller,
            output,
            source: export_dir.display().to_string(),
            export_dir,
            focus: Focus::Filter(Dimension::Industry),
            cursors: [0; 4],
            scroll: 0,
            status: None,
            should_quit: false,
        }
    }

    pub fn output(&self) -> &DashboardOutput {
        &self.output
    }

    pub fn controller(&self) -> &DashboardController<'a> {
        &self.controller
    }

    fn values(&self, dimension: Dimension) -> &'a [String] {
        self.controller.context().distinct_values(dimension)
    }

    fn dimension_index(dimension: Dimension) -> usize {
        Dimension::ALL
            .iter()
            .position(|d| *d == dimension)
            .unwrap_or(0)
    }

    fn dispatch(&mut self, event: DashboardEvent) {
        self.output = self.controller.dispatch(event);
        self.scroll = self.scroll.min(self.output.rows.len().saturating_sub(1));
    }

    fn move_cursor(&mut self, dimension: Dimension, down: bool) {
        let len = self.values(dimension).len();
        let cursor = &mut self.cursors[Self::dimension_index(dimension)];
        if len == 0 {
            *cursor = 0;
        } else if down {
            *cursor = (*cursor + 1).min(len - 1);
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.output.rows.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }

    fn export(&mut self) {
        let path = self.export_dir.join(FILTERED_CUSTOMERS_FILE);
        self.status = Some(match self.controller.export_filtered(&path) {
            Ok(n) => {
                tracing::info!(rows = n, path = %path.display(), "exported filtered customers");
                format!("Exported {} rows to {}", n, path.display())
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                format!("Export failed: {e}")
            }
        });
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match (key.code, self.focus) {
            (KeyCode::Char('q') | KeyCode::Char('Q'), _) => self.should_quit = true,
            (KeyCode::Tab, _) => self.focus = self.focus.next(),
            (KeyCode::BackTab, _) => self.focus = self.focus.prev(),

            (KeyCode::Up, Focus::Filter(d)) => self.move_cursor(d, false),
            (KeyCode::Down, Focus::Filter(d)) => self.move_cursor(d, true),
            (KeyCode::Up, Focus::Customers) => self.scroll_by(-1),
            (KeyCode::Down, Focus::Customers) => self.scroll_by(1),
            (KeyCode::PageUp, _) => self.scroll_by(-(PAGE_SIZE as isize)),
            (KeyCode::PageDown, _) => self.scroll_by(PAGE_SIZE as isize),

            (KeyCode::Char(' ') | KeyCode::Enter, Focus::Filter(d)) => {
                let cursor = self.cursors[Self::dimension_index(d)];
                if let Some(value) = self.values(d).get(cursor) {
                    self.dispatch(DashboardEvent::ToggleValue {
                        dimension: d,
                        value: value.clone(),
                    });
                }
            }
            (KeyCode::Char('a'), Focus::Filter(d)) => self.dispatch(DashboardEvent::SelectAll(d)),
            (KeyCode::Char('n'), Focus::Filter(d)) => self.dispatch(DashboardEvent::SelectNone(d)),

            (KeyCode::Char('c'), _) => self.dispatch(DashboardEvent::ToggleChurnedOnly),
            (KeyCode::Char('s'), _) => {
                self.dispatch(DashboardEvent::CycleSortColumn);
                self.status = self
                    .controller
                    .inputs()
                    .display
                    .sort_column
                    .map(|c| format!("Sorted by {}", c.label()));
            }
            (KeyCode::Char('o'), _) => self.dispatch(DashboardEvent::ToggleSortOrder),
            (KeyCode::Char('r'), _) => {
                self.dispatch(DashboardEvent::Reset);
                self.scroll = 0;
                self.status = Some("Filters reset".to_string());
            }
            (KeyCode::Char('e'), _) => self.export(),
            _ => {}
        }
    }

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let data = DashboardViewData {
            source: &self.source,
            output: &self.output,
            inputs: self.controller.inputs(),
            values: Dimension::ALL.map(|d| self.values(d)),
            focus: self.focus,
            cursors: self.cursors,
            scroll: self.scroll,
            status: self.status.as_deref(),
        };
        dashboard_view::render_dashboard(frame, &data, &self.theme);
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until `q` / `Ctrl+C`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the loop never
    /// blocks indefinitely on input.
    pub fn run(mut self) -> Result<()> {
        let mut terminal = enter_terminal().map_err(terminal_error)?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal).map_err(terminal_error)?;
        result.map_err(terminal_error)
    }

    fn event_loop(&mut self, terminal: &mut CrosstermTerminal) -> io::Result<()> {
        tracing::debug!("dashboard event loop started");
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }
}

// ── Error screen ──────────────────────────────────────────────────────────────

/// Show a blocking error screen until `q`, `Esc` or `Ctrl+C`.
pub fn run_error(theme: &Theme, message: &str) -> Result<()> {
    let mut terminal = enter_terminal().map_err(terminal_error)?;
    let result = (|| -> io::Result<()> {
        loop {
            terminal.draw(|frame| dashboard_view::render_error(frame, message, theme))?;
            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                        _ => {}
                    }
                }
            }
        }
    })();
    restore_terminal(&mut terminal).map_err(terminal_error)?;
    result.map_err(terminal_error)
}

// ── Terminal setup ────────────────────────────────────────────────────────────

fn terminal_error(err: io::Error) -> EconError {
    EconError::Terminal(err.to_string())
}

fn enter_terminal() -> io::Result<CrosstermTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut CrosstermTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Leave raw mode and the alternate screen without a terminal handle.
///
/// Used when the event loop is abandoned from outside, e.g. on a signal.
pub fn reset_terminal() -> Result<()> {
    disable_raw_mode().map_err(terminal_error)?;
    execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show).map_err(terminal_error)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
