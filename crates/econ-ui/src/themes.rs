use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Absent or unparseable values yield `Dark`.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// LTV/CAC at or above this is healthy.
pub const RATIO_GOOD: f64 = 3.0;
/// LTV/CAC below this loses money on acquisition.
pub const RATIO_BREAK_EVEN: f64 = 1.0;
/// Payback at or below this many months is healthy.
pub const PAYBACK_GOOD_MONTHS: f64 = 12.0;
pub const PAYBACK_SLOW_MONTHS: f64 = 24.0;

/// All styles used by the dashboard widgets.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Panels ───────────────────────────────────────────────────────────────
    pub border: Style,
    /// Border of the panel holding keyboard focus.
    pub border_focused: Style,
    /// Cursor line inside the focused panel.
    pub cursor: Style,
    pub checked: Style,
    pub unchecked: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub bar: Style,
    pub bar_alt: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub churned_row: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            border: Style::default().fg(Color::DarkGray),
            border_focused: Style::default().fg(Color::Cyan),
            cursor: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
            checked: Style::default().fg(Color::Green),
            unchecked: Style::default().fg(Color::DarkGray),

            bar: Style::default().fg(Color::Cyan),
            bar_alt: Style::default().fg(Color::Magenta),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            churned_row: Style::default().fg(Color::LightRed),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            border: Style::default().fg(Color::Gray),
            border_focused: Style::default().fg(Color::Blue),
            cursor: Style::default()
                .fg(Color::White)
                .bg(Color::Blue),
            checked: Style::default().fg(Color::Green),
            unchecked: Style::default().fg(Color::Gray),

            bar: Style::default().fg(Color::Blue),
            bar_alt: Style::default().fg(Color::Magenta),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            churned_row: Style::default().fg(Color::Red),
        }
    }

    /// Basic 8-colour ANSI palette without bold modifiers.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            border: Style::default().fg(Color::White),
            border_focused: Style::default().fg(Color::Yellow),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            checked: Style::default().fg(Color::Green),
            unchecked: Style::default().fg(Color::White),

            bar: Style::default().fg(Color::Green),
            bar_alt: Style::default().fg(Color::Yellow),

            table_header: Style::default().fg(Color::Yellow),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::White),
            churned_row: Style::default().fg(Color::Red),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names (including `auto`) detect.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Colour for an LTV/CAC ratio.
    ///
    /// * `≥ 3`   → `success`
    /// * `1–3`   → `warning`
    /// * `< 1`   → `error`
    pub fn ratio_style(&self, ratio: f64) -> Style {
        if ratio >= RATIO_GOOD {
            self.success
        } else if ratio >= RATIO_BREAK_EVEN {
            self.warning
        } else {
            self.error
        }
    }

    /// Colour for a CAC payback period in months.
    pub fn payback_style(&self, months: f64) -> Style {
        if months <= PAYBACK_GOOD_MONTHS {
            self.success
        } else if months <= PAYBACK_SLOW_MONTHS {
            self.warning
        } else {
            self.error
        }
    }

    /// Colour for a churn rate in percent.
    pub fn churn_style(&self, pct: f64) -> Style {
        if pct >= 20.0 {
            self.error
        } else if pct >= 10.0 {
            self.warning
        } else {
            self.success
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            self.border_focused
        } else {
            self.border
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
