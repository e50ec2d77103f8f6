use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Dimension;
use crate::selection::{
    DimensionFilter, DisplayOptions, FilterSelection, PipelineInputs, SortColumn, SortOrder,
};

/// Default customer-level file name.
pub const DEFAULT_CUSTOMERS_FILE: &str = "unit_economics.csv";
/// Default segment-level file name.
pub const DEFAULT_SEGMENTS_FILE: &str = "unit_economics_by_segment.csv";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// SaaS unit economics dashboard over customer and segment CSV exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "unit-economics",
    about = "SaaS unit economics dashboard over customer and segment CSV exports",
    version
)]
pub struct Settings {
    /// Directory holding the CSV files
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Customer-level CSV file name
    #[arg(long, default_value = DEFAULT_CUSTOMERS_FILE)]
    pub customers_file: String,

    /// Segment-level CSV file name
    #[arg(long, default_value = DEFAULT_SEGMENTS_FILE)]
    pub segments_file: String,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "report"])]
    pub view: String,

    /// Report output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Allowed industries (comma separated; bare flag selects none)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub industry: Option<Vec<String>>,

    /// Allowed company sizes (comma separated; bare flag selects none)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub company_size: Option<Vec<String>>,

    /// Allowed plan names (comma separated; bare flag selects none)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub plan: Option<Vec<String>>,

    /// Allowed billing frequencies (comma separated; bare flag selects none)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub billing_frequency: Option<Vec<String>>,

    /// Show only churned customers in the customer list
    #[arg(long)]
    pub churned_only: bool,

    /// Customer list sort column
    #[arg(long, default_value = "customer_id")]
    pub sort_by: String,

    /// Customer list sort order
    #[arg(long, default_value = "asc", value_parser = ["asc", "desc"])]
    pub sort_order: String,

    /// Maximum customer rows printed by the text report
    #[arg(long)]
    pub rows: Option<usize>,

    /// Write the filtered customer view to this CSV file
    #[arg(long)]
    pub export_customers: Option<PathBuf>,

    /// Write the segment table to this CSV file
    #[arg(long)]
    pub export_segments: Option<PathBuf>,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level (DEBUG, INFO, WARNING, ERROR, CRITICAL) or a tracing
    /// directive such as `econ_data=debug`
    #[arg(long, default_value = "INFO")]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Problems met while loading or persisting last-used params. Logged
    /// once the subscriber is installed.
    #[arg(skip)]
    pub warnings: Vec<String>,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.unit-economics/last_used.json`.
///
/// Filters are deliberately absent: every run starts unfiltered.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".unit-economics").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                settings
                    .warnings
                    .push(format!("failed to clear {}: {}", config_path.display(), e));
            }
            return Self::apply_overrides(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "data_dir") {
            if let Some(v) = last.data_dir {
                settings.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "sort_by") {
            if let Some(v) = last.sort_by {
                settings.sort_by = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "sort_order") {
            if let Some(v) = last.sort_order {
                settings.sort_order = v;
            }
        }

        settings = Self::apply_overrides(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            settings.warnings.push(format!("failed to persist settings: {e}"));
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_overrides(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Translate the filter and sort flags into pipeline inputs.
    ///
    /// An omitted dimension flag means "no restriction"; a flag given with no
    /// values is an explicit empty selection.
    pub fn pipeline_inputs(&self) -> PipelineInputs {
        let mut filters = FilterSelection::default();
        let flags = [
            (Dimension::Industry, &self.industry),
            (Dimension::CompanySize, &self.company_size),
            (Dimension::PlanName, &self.plan),
            (Dimension::BillingFrequency, &self.billing_frequency),
        ];
        for (dimension, values) in flags {
            if let Some(values) = values {
                *filters.get_mut(dimension) = DimensionFilter::only(
                    values
                        .iter()
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                );
            }
        }

        PipelineInputs {
            filters,
            display: DisplayOptions {
                show_churned_only: self.churned_only,
                sort_column: SortColumn::from_column_name(&self.sort_by),
                sort_order: SortOrder::parse(&self.sort_order).unwrap_or_default(),
            },
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            view: Some(s.view.clone()),
            data_dir: Some(s.data_dir.clone()),
            sort_by: Some(s.sort_by.clone()),
            sort_order: Some(s.sort_order.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
