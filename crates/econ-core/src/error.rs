use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the unit economics dashboard.
#[derive(Error, Debug)]
pub enum EconError {
    /// A data file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file structure (bad header, bad quoting).
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A single field could not be interpreted.
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },

    /// Writing an export file failed.
    #[error("Failed to export {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be produced or parsed.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, EconError>;
